//! Data records: one decoded occurrence of a message kind.
//!
//! A data record decodes against the definition active for its local id at
//! the point it appears in the stream, and keeps that definition bound so an
//! unmodified record re-encodes with its original layout. Mutating the field
//! set invalidates the binding; the builder re-derives a matching definition
//! before anything is written.

use bytes::BufMut;
use log::{debug, warn};

use crate::codec::definition::DefinitionRecord;
use crate::codec::field::{Endianness, Field, FieldValue};
use crate::codec::take;
use crate::utils::error::FormatError;

/// Raw value of one developer-defined field, keyed by (dev-index, field-id).
/// Developer fields have no profile-side template, so bytes are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct DeveloperFieldValue {
    pub dev_index: u8,
    pub field_id: u8,
    pub bytes: Vec<u8>,
}

/// A typed record instance
#[derive(Debug, Clone)]
pub struct DataRecord {
    pub global_id: u16,
    pub name: &'static str,
    pub endianness: Endianness,
    fields: Vec<Field>,
    developer_fields: Vec<DeveloperFieldValue>,
    definition: Option<DefinitionRecord>,
}

impl DataRecord {
    /// Construct from a field template; fields start absent
    pub fn new(global_id: u16, name: &'static str, fields: Vec<Field>) -> Self {
        Self {
            global_id,
            name,
            endianness: Endianness::Little,
            fields,
            developer_fields: Vec::new(),
            definition: None,
        }
    }

    pub fn field(&self, field_id: u8) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    fn field_mut(&mut self, field_id: u8) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == field_id)
    }

    /// Current value of a field, if assigned
    pub fn get(&self, field_id: u8) -> Option<&FieldValue> {
        self.field(field_id).and_then(|f| f.value.as_ref())
    }

    /// Scalar view of a field value
    pub fn get_u64(&self, field_id: u8) -> Option<u64> {
        self.get(field_id).and_then(FieldValue::as_u64)
    }

    pub fn get_text(&self, field_id: u8) -> Option<&str> {
        match self.get(field_id) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Assign a field value. Ids outside the record kind's template are
    /// ignored with a note; the typed subset never grows implicitly.
    pub fn set(&mut self, field_id: u8, value: FieldValue) {
        let name = self.name;
        match self.field_mut(field_id) {
            Some(field) => field.value = Some(value),
            None => debug!("Field {} is not defined for {} records, ignoring set", field_id, name),
        }
    }

    pub fn set_unsigned(&mut self, field_id: u8, value: u64) {
        self.set(field_id, FieldValue::Unsigned(value));
    }

    /// Clear a field value and drop it from the bound layout, keeping the
    /// wire layout in lockstep with the live field set
    pub fn clear_field(&mut self, field_id: u8) {
        if let Some(field) = self.field_mut(field_id) {
            field.clear();
        }
        if let Some(def) = self.definition.as_mut() {
            def.remove_field(field_id);
        }
    }

    pub fn definition(&self) -> Option<&DefinitionRecord> {
        self.definition.as_ref()
    }

    pub fn bind_definition(&mut self, definition: DefinitionRecord) {
        self.endianness = definition.endianness;
        self.definition = Some(definition);
    }

    /// Drop the bound definition so the layout is re-derived from the live
    /// field set at encode time. Must be called whenever fields are added or
    /// removed after decode; a stale binding writes offsets for a field set
    /// that no longer exists.
    pub fn clear_definition(&mut self) {
        self.definition = None;
    }

    /// Does the bound definition still describe the live field set exactly?
    ///
    /// Checked by the builder before every encode, so any mutation path that
    /// forgets `clear_definition()` degrades to a regenerated layout instead
    /// of corrupt output.
    pub fn definition_matches(&self) -> bool {
        let Some(def) = self.definition.as_ref() else {
            return false;
        };
        let present: Vec<&Field> = self.present_fields().collect();
        if def.field_definitions().len() != present.len() {
            return false;
        }
        for (fd, field) in def.field_definitions().iter().zip(&present) {
            if fd.field_id != field.id || fd.size as usize != field.natural_size() {
                return false;
            }
        }
        if def.developer_field_definitions().len() != self.developer_fields.len() {
            return false;
        }
        def.developer_field_definitions()
            .iter()
            .zip(&self.developer_fields)
            .all(|(fd, dev)| {
                fd.dev_index == dev.dev_index
                    && fd.field_id == dev.field_id
                    && fd.size as usize == dev.bytes.len()
            })
    }

    /// True when the bound definition declares field ids the live field set
    /// no longer fully contains (the stale-binding hazard)
    pub fn definition_has_orphans(&self) -> bool {
        let Some(def) = self.definition.as_ref() else {
            return false;
        };
        def.field_definitions()
            .iter()
            .any(|fd| self.field(fd.field_id).map_or(true, |f| !f.is_present()))
    }

    pub fn present_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_present())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn developer_fields(&self) -> &[DeveloperFieldValue] {
        &self.developer_fields
    }

    /// Variant-aware display name for a field, resolved against siblings
    /// (e.g. device_info.product reads as garmin_product on Garmin rows)
    pub fn field_display_name(&self, field_id: u8) -> Option<&'static str> {
        let field = self.field(field_id)?;
        Some(field.resolve_variant(|id| self.get_u64(id)))
    }

    /// Decode the payload governed by `definition`, binding it and advancing
    /// `offset` past exactly the declared length.
    ///
    /// Field ids this record kind does not model are skipped byte-wise at
    /// debug level: forward-compatible tolerance, not an error.
    pub fn decode(
        &mut self,
        definition: &DefinitionRecord,
        buf: &[u8],
        offset: &mut usize,
    ) -> Result<(), FormatError> {
        self.bind_definition(definition.clone());
        let def = definition;
        let endianness = def.endianness;

        let (name, global_id) = (self.name, self.global_id);
        for fd in def.field_definitions() {
            let slice = take(buf, offset, fd.size as usize)?;
            match self.field_mut(fd.field_id) {
                Some(field) => field.read(slice, endianness),
                None => {
                    debug!(
                        "Field id {} is not defined for message {}:{}, skipping {} bytes",
                        fd.field_id, name, global_id, fd.size
                    );
                }
            }
        }

        for fd in def.developer_field_definitions() {
            if fd.size == 0 {
                debug!(
                    "Developer field {}:{} declares an empty slice, skipping",
                    fd.dev_index, fd.field_id
                );
                continue;
            }
            let slice = take(buf, offset, fd.size as usize)?;
            self.developer_fields.push(DeveloperFieldValue {
                dev_index: fd.dev_index,
                field_id: fd.field_id,
                bytes: slice.to_vec(),
            });
        }

        Ok(())
    }

    /// Serialize this record (header byte + payload).
    ///
    /// With a bound definition the layout follows it exactly; absent fields
    /// it declares are written as their invalid pattern, and declared ids
    /// outside the template are skipped with a warning (the rewrite
    /// pipeline's pre-pass clears such bindings before this can happen).
    /// Unbound records emit their present fields in canonical order.
    pub fn encode(&self, dst: &mut impl BufMut) {
        match self.definition.as_ref() {
            Some(def) => {
                dst.put_u8(def.local_id & 0x0F);
                for fd in def.field_definitions() {
                    match self.field(fd.field_id) {
                        Some(field) => field.write(fd.size as usize, def.endianness, dst),
                        None => {
                            warn!(
                                "Definition for {} declares field {} the record does not model; output layout will not match",
                                self.name, fd.field_id
                            );
                        }
                    }
                }
                for fd in def.developer_field_definitions() {
                    match self
                        .developer_fields
                        .iter()
                        .find(|d| d.dev_index == fd.dev_index && d.field_id == fd.field_id)
                    {
                        Some(dev) => {
                            let n = dev.bytes.len().min(fd.size as usize);
                            dst.put_slice(&dev.bytes[..n]);
                            dst.put_bytes(0xFF, fd.size as usize - n);
                        }
                        None => {
                            debug!(
                                "Developer field {}:{} not found on {}, padding",
                                fd.dev_index, fd.field_id, self.name
                            );
                            dst.put_bytes(0xFF, fd.size as usize);
                        }
                    }
                }
            }
            None => {
                dst.put_u8(0);
                for field in self.present_fields() {
                    field.write(field.natural_size(), self.endianness, dst);
                }
                for dev in &self.developer_fields {
                    dst.put_slice(&dev.bytes);
                }
            }
        }
    }
}
