//! Inspect command implementation.
//!
//! Decodes a file and prints a per-kind record summary plus the activity
//! creation timestamp. Doubles as a format validator: a file that inspects
//! cleanly will decode in the rewrite pipeline too.

use crate::codec::stream::{FitStream, Record};
use crate::editor::creation_time;
use crate::profile::messages::file_id;
use crate::profile::types::{kind_name, manufacturer_name, mesg_num};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Execute the inspect command
///
/// **Public** - entry point called from main.rs
pub fn execute_inspect(file: &Path) -> Result<()> {
    println!("Inspecting: {}", file.display());

    let stream = FitStream::from_file(file)
        .with_context(|| format!("Failed to decode {}", file.display()))?;

    println!("✓ Valid FIT stream");
    println!("  Protocol: {:#04x}", stream.protocol_version);
    println!("  Profile:  {}", stream.profile_version);
    println!("  Records:  {}", stream.records.len());

    if let Some(when) = creation_time(&stream) {
        println!("  Created:  {}", when.to_rfc3339());
    }

    if let Some(rec) = stream.records.iter().find_map(|r| match r {
        Record::Data(rec) if rec.global_id == mesg_num::FILE_ID => Some(rec),
        _ => None,
    }) {
        let man = rec.get_u64(file_id::MANUFACTURER);
        let man_display = man
            .map(|m| {
                manufacturer_name(m as u16)
                    .map(str::to_string)
                    .unwrap_or_else(|| m.to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  Identity: manufacturer {}, product {}, serial {}",
            man_display,
            rec.get_u64(file_id::PRODUCT).unwrap_or(0),
            rec.get_u64(file_id::SERIAL_NUMBER).unwrap_or(0),
        );
    }

    println!();
    println!("Record kinds:");
    for ((global_id, name), count) in count_kinds(&stream) {
        println!("  {:>6}  {} ({})", count, name, global_id);
    }

    Ok(())
}

fn count_kinds(stream: &FitStream) -> BTreeMap<(u16, &'static str), usize> {
    let mut counts = BTreeMap::new();
    for record in &stream.records {
        let global_id = record.global_id();
        *counts.entry((global_id, kind_name(global_id))).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::definition::DefinitionRecord;
    use crate::codec::stream::{encode_stream, FinalRecord};
    use crate::profile::messages::new_file_id;

    #[test]
    fn test_count_kinds_groups_by_global_id() {
        let mut rec = new_file_id();
        rec.set_unsigned(file_id::MANUFACTURER, 260);
        let def = DefinitionRecord::derive_from(&rec, 0);
        rec.bind_definition(def.clone());
        let bytes = encode_stream(
            0x20,
            2195,
            &[FinalRecord::Definition(def), FinalRecord::Data(rec)],
        );
        let stream = FitStream::from_bytes(&bytes).unwrap();

        let counts = count_kinds(&stream);
        assert_eq!(counts.get(&(0, "file_id")), Some(&1));
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.fit");
        std::fs::write(&path, b"not a fit file at all").unwrap();
        assert!(execute_inspect(&path).is_err());
    }
}
