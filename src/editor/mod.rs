//! Identity rewrite pipeline.
//!
//! The editor walks a decoded stream in order, classifies each record, and
//! applies the substitution rules:
//! 1. Stale definition bindings are cleared up front (corruption guard)
//! 2. file_id is rewritten to the configured identity when its manufacturer
//!    qualifies, and a file_creator is synthesized when a firmware version
//!    is configured
//! 3. Existing file_creator and software records are dropped
//! 4. Placeholder device_info records (device_type 0) are dropped and the
//!    remaining device indices renumbered to stay contiguous
//! 5. Activity records are deferred to the end of the stream
//!
//! Everything else passes through untouched, then the auto-definition
//! builder and stream codec produce the output bytes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::builder::StreamBuilder;
use crate::codec::data::DataRecord;
use crate::codec::stream::{encode_stream, FinalRecord, FitStream, Record};
use crate::output::{default_output_path, write_stream};
use crate::profile::identity::{DeviceIdentity, SpoofPolicy};
use crate::profile::messages::{
    device_info, file_creator, file_id, new_file_creator, new_file_id,
};
use crate::profile::types::{manufacturer_name, mesg_num};
use crate::utils::config::FIT_EPOCH_UNIX;
use crate::utils::error::{EditError, IdentityError};

/// Rewrites streams against one immutable identity and spoof policy
#[derive(Debug, Clone)]
pub struct FitEditor {
    identity: DeviceIdentity,
    policy: SpoofPolicy,
}

impl FitEditor {
    /// Build an editor, rejecting unusable identities before any file I/O
    pub fn new(identity: DeviceIdentity, policy: SpoofPolicy) -> Result<Self, IdentityError> {
        identity.validate()?;
        Ok(Self { identity, policy })
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Rewrite one file.
    ///
    /// **Public** - primary entry point for file conversion
    ///
    /// # Arguments
    /// * `input` - Path to the source FIT file
    /// * `output` - Destination path; defaults to `<stem>_modified.fit`
    /// * `dry_run` - Decode and transform for validation, but persist nothing
    ///
    /// # Returns
    /// The output path (the one that would have been written in dry-run mode)
    ///
    /// # Errors
    /// Format errors abort the file with no partial output; write errors
    /// surface after a complete in-memory encode, so a failed write never
    /// leaves a truncated file behind.
    pub fn edit_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        dry_run: bool,
    ) -> Result<PathBuf, EditError> {
        info!("Processing \"{}\"", input.display());
        let stream = FitStream::from_file(input)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input));

        let bytes = self.edit_stream(stream);

        if dry_run {
            info!(
                "Dry run requested, not saving data (would have written to \"{}\")",
                output.display()
            );
        } else {
            info!("Saving modified data to \"{}\"", output.display());
            write_stream(&bytes, &output)?;
        }
        Ok(output)
    }

    /// Rewrite a pre-decoded stream into output bytes
    pub fn edit_stream(&self, stream: FitStream) -> Vec<u8> {
        let FitStream {
            protocol_version,
            profile_version,
            records,
        } = stream;
        let finalized = self.transform(records);
        encode_stream(protocol_version, profile_version, &finalized)
    }

    /// Apply the rewrite rules and finalize through the builder
    pub fn transform(&self, mut records: Vec<Record>) -> Vec<FinalRecord> {
        strip_stale_definitions(&mut records);

        let mut builder = StreamBuilder::new();
        let mut deferred_activities: Vec<DataRecord> = Vec::new();
        let mut dropped_devices: u64 = 0;

        for (index, record) in records.into_iter().enumerate() {
            let rec = match record {
                Record::Data(rec) => rec,
                Record::Opaque(rec) => {
                    builder.add(Record::Opaque(rec));
                    continue;
                }
            };

            match rec.global_id {
                mesg_num::ACTIVITY => {
                    // Some consumers expect activity summaries at stream end
                    // regardless of where the producer put them
                    deferred_activities.push(rec);
                }
                mesg_num::FILE_ID => {
                    self.handle_file_id(rec, index, &mut builder);
                }
                mesg_num::FILE_CREATOR => {
                    debug!("Dropping existing file_creator at record {}", index);
                }
                mesg_num::SOFTWARE => {
                    debug!("Dropping software record {} (source software identity)", index);
                }
                mesg_num::DEVICE_INFO => {
                    if let Some(rec) = self.rewrite_device_info(rec, index, &mut dropped_devices) {
                        builder.add(Record::Data(rec));
                    }
                }
                _ => builder.add(Record::Data(rec)),
            }
        }

        if !deferred_activities.is_empty() {
            debug!(
                "Appending {} deferred activity record(s) at the end",
                deferred_activities.len()
            );
            for rec in deferred_activities {
                builder.add(Record::Data(rec));
            }
        }

        builder.finish()
    }

    fn handle_file_id(&self, rec: DataRecord, index: usize, builder: &mut StreamBuilder) {
        log_identity_row("file_id record", index, &rec, file_id::MANUFACTURER, file_id::PRODUCT);

        let spoofable = rec
            .get_u64(file_id::MANUFACTURER)
            .map_or(false, |m| self.policy.is_spoofable(m as u16));

        if spoofable {
            let fresh = self.rewrite_file_id(&rec);
            log_identity_row("    rewritten", index, &fresh, file_id::MANUFACTURER, file_id::PRODUCT);
            builder.add(Record::Data(fresh));
        } else {
            debug!("    Manufacturer not in the spoofable set, passing through");
            builder.add(Record::Data(rec));
        }

        if let Some(version) = self.identity.software_version {
            debug!("    Adding file_creator with software_version {}", version);
            let mut creator = new_file_creator();
            creator.set_unsigned(file_creator::SOFTWARE_VERSION, u64::from(version));
            builder.add(Record::Data(creator));
        }
    }

    /// Build the replacement file_id: identity fields from the configured
    /// target, creation timestamp and activity type preserved verbatim.
    /// product_name and number are not carried over; Garmin head units do
    /// not populate them.
    fn rewrite_file_id(&self, original: &DataRecord) -> DataRecord {
        if let Some(ts) = original.get_u64(file_id::TIME_CREATED) {
            if let Some(when) = fit_time_to_utc(ts) {
                info!("Activity timestamp is \"{}\"", when.to_rfc3339());
            }
        }

        let mut fresh = new_file_id();
        if let Some(file_type) = original.get_u64(file_id::TYPE) {
            fresh.set_unsigned(file_id::TYPE, file_type);
        }
        let time_created = original
            .get_u64(file_id::TIME_CREATED)
            .unwrap_or_else(fit_time_now);
        fresh.set_unsigned(file_id::TIME_CREATED, time_created);
        fresh.set_unsigned(file_id::SERIAL_NUMBER, u64::from(self.identity.serial_number));
        fresh.set_unsigned(file_id::MANUFACTURER, u64::from(self.identity.manufacturer));
        fresh.set_unsigned(file_id::PRODUCT, u64::from(self.identity.product));
        debug!("Using serial number: {}", self.identity.serial_number);
        fresh
    }

    /// Apply the device-info rules; returns `None` when the record is a
    /// dropped placeholder
    fn rewrite_device_info(
        &self,
        mut rec: DataRecord,
        index: usize,
        dropped: &mut u64,
    ) -> Option<DataRecord> {
        log_identity_row(
            "device_info record",
            index,
            &rec,
            device_info::MANUFACTURER,
            device_info::PRODUCT,
        );

        if rec.get_u64(device_info::DEVICE_TYPE) == Some(0) {
            debug!("    Dropping placeholder device (device_type 0)");
            *dropped += 1;
            return None;
        }

        // Keep device indices contiguous: other records reference them and
        // a gap left by a dropped placeholder would break those references
        if *dropped > 0 {
            if let Some(device_index) = rec.get_u64(device_info::DEVICE_INDEX) {
                let renumbered = device_index.saturating_sub(*dropped);
                debug!(
                    "    Renumbering device_index from {} to {}",
                    device_index, renumbered
                );
                rec.set_unsigned(device_info::DEVICE_INDEX, renumbered);
            }
        }

        let qualifies = rec
            .get_u64(device_info::MANUFACTURER)
            .map_or(false, |m| self.policy.admits_device_info(m as u16));

        if qualifies {
            debug!("    Rewriting device identity");
            rec.set_unsigned(device_info::MANUFACTURER, u64::from(self.identity.manufacturer));
            rec.set_unsigned(device_info::PRODUCT, u64::from(self.identity.product));
            // With the manufacturer rewritten, the product field reads as
            // its vendor-extended variant
            if let Some(variant) = rec.field_display_name(device_info::PRODUCT) {
                debug!("    Set {} to {}", variant, self.identity.product);
            }
            // Garmin-origin records leave the free-text name unset
            rec.clear_field(device_info::PRODUCT_NAME);
            log_identity_row(
                "    rewritten",
                index,
                &rec,
                device_info::MANUFACTURER,
                device_info::PRODUCT,
            );
        }

        Some(rec)
    }
}

/// Clear the definition binding of every record whose layout declares field
/// ids the live field set no longer fully contains.
///
/// Producers like Zwift ship vendor-specific field ids the typed subset does
/// not model; decode skips the bytes but the original definition still
/// declares them, and writing against it would corrupt the output.
fn strip_stale_definitions(records: &mut [Record]) {
    for record in records {
        let Record::Data(rec) = record else { continue };
        if rec.definition_has_orphans() {
            debug!(
                "Clearing definition for {} (global {}) to force regeneration",
                rec.name, rec.global_id
            );
            rec.clear_definition();
        }
    }
}

/// Extract the creation timestamp from a decoded stream
pub fn creation_time(stream: &FitStream) -> Option<DateTime<Utc>> {
    stream.records.iter().find_map(|record| match record {
        Record::Data(rec) if rec.global_id == mesg_num::FILE_ID => {
            rec.get_u64(file_id::TIME_CREATED).and_then(fit_time_to_utc)
        }
        _ => None,
    })
}

/// FIT timestamps count seconds since 1989-12-31T00:00:00Z
fn fit_time_to_utc(fit_seconds: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(FIT_EPOCH_UNIX + fit_seconds as i64, 0)
}

fn fit_time_now() -> u64 {
    let now = Utc::now().timestamp();
    if now <= FIT_EPOCH_UNIX {
        warn!("System clock predates the FIT epoch, stamping zero");
        return 0;
    }
    (now - FIT_EPOCH_UNIX) as u64
}

fn log_identity_row(prefix: &str, index: usize, rec: &DataRecord, man_field: u8, product_field: u8) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let man = rec
        .get_u64(man_field)
        .map(|m| manufacturer_name(m as u16).map(str::to_string).unwrap_or_else(|| m.to_string()))
        .unwrap_or_else(|| "BLANK".to_string());
    let product = rec
        .get_u64(product_field)
        .map(|p| p.to_string())
        .unwrap_or_else(|| "BLANK".to_string());
    let variant = rec.field_display_name(product_field).unwrap_or("product");
    debug!(
        "{} {}: manufacturer {}, {} {}",
        prefix, index, man, variant, product
    );
}
