//! Definition records: the per-local-id layout declarations.
//!
//! A definition record binds a local id (0..=15) to a global message number
//! and an ordered field layout. Every data record that follows under that
//! local id is decoded and encoded against the most recent definition, until
//! a later definition rebinds the id.

use bytes::BufMut;

use crate::codec::data::DataRecord;
use crate::codec::field::Endianness;
use crate::codec::take;
use crate::utils::error::FormatError;

/// Record header bit: this record is a definition
pub const HEADER_DEFINITION: u8 = 0x40;
/// Record header bit: the definition carries developer field definitions
pub const HEADER_DEVELOPER_DATA: u8 = 0x20;
/// Record header bit: compressed-timestamp data header
pub const HEADER_COMPRESSED: u8 = 0x80;
/// Local id mask for normal headers
pub const HEADER_LOCAL_MASK: u8 = 0x0F;

/// One fixed-field entry: (field id, declared size, base type code)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub field_id: u8,
    pub size: u8,
    pub base_type: u8,
}

/// One developer-field entry, additionally qualified by the developer
/// data index assigned in a preceding developer-data-id record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub field_id: u8,
    pub size: u8,
    pub dev_index: u8,
}

/// A parsed definition record
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionRecord {
    pub local_id: u8,
    pub endianness: Endianness,
    pub global_id: u16,
    fields: Vec<FieldDefinition>,
    developer_fields: Vec<DeveloperFieldDefinition>,
}

impl DefinitionRecord {
    pub fn new(local_id: u8, endianness: Endianness, global_id: u16) -> Self {
        Self {
            local_id,
            endianness,
            global_id,
            fields: Vec::new(),
            developer_fields: Vec::new(),
        }
    }

    pub fn field_definitions(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn developer_field_definitions(&self) -> &[DeveloperFieldDefinition] {
        &self.developer_fields
    }

    pub fn lookup(&self, field_id: u8) -> Option<&FieldDefinition> {
        self.fields.iter().find(|fd| fd.field_id == field_id)
    }

    /// Drop a field from the layout (used when a field is cleared from its
    /// owning record so the wire layout stays in lockstep)
    pub fn remove_field(&mut self, field_id: u8) {
        self.fields.retain(|fd| fd.field_id != field_id);
    }

    pub fn push_field(&mut self, field_id: u8, size: u8, base_type: u8) {
        self.fields.push(FieldDefinition {
            field_id,
            size,
            base_type,
        });
    }

    pub fn push_developer_field(&mut self, field_id: u8, size: u8, dev_index: u8) {
        self.developer_fields.push(DeveloperFieldDefinition {
            field_id,
            size,
            dev_index,
        });
    }

    pub fn has_developer_fields(&self) -> bool {
        !self.developer_fields.is_empty()
    }

    /// Total data-record payload size this definition implies
    pub fn data_len(&self) -> usize {
        let fixed: usize = self.fields.iter().map(|fd| fd.size as usize).sum();
        let dev: usize = self.developer_fields.iter().map(|fd| fd.size as usize).sum();
        fixed + dev
    }

    /// Layout equality: same kind, byte order, fields and developer fields.
    /// Local id is excluded — the builder reassigns slots freely.
    pub fn same_layout(&self, other: &DefinitionRecord) -> bool {
        self.global_id == other.global_id
            && self.endianness == other.endianness
            && self.fields == other.fields
            && self.developer_fields == other.developer_fields
    }

    /// Build a minimal definition covering exactly the fields currently
    /// present in `record`, in the record's canonical field order, each
    /// sized at its value's natural width.
    pub fn derive_from(record: &DataRecord, local_id: u8) -> Self {
        let mut def = DefinitionRecord::new(local_id, record.endianness, record.global_id);
        for field in record.present_fields() {
            def.push_field(
                field.id,
                field.natural_size().min(255) as u8,
                field.base_type.wire_code(),
            );
        }
        for dev in record.developer_fields() {
            def.push_developer_field(
                dev.field_id,
                dev.bytes.len().min(255) as u8,
                dev.dev_index,
            );
        }
        def
    }

    /// Parse a definition payload (everything after the record header byte).
    /// Advances `offset` past the consumed bytes.
    pub fn decode(
        local_id: u8,
        has_developer_data: bool,
        buf: &[u8],
        offset: &mut usize,
    ) -> Result<Self, FormatError> {
        let fixed = take(buf, offset, 5)?;
        // fixed[0] is reserved
        let endianness = if fixed[1] == 0 {
            Endianness::Little
        } else {
            Endianness::Big
        };
        let global_id = match endianness {
            Endianness::Little => u16::from_le_bytes([fixed[2], fixed[3]]),
            Endianness::Big => u16::from_be_bytes([fixed[2], fixed[3]]),
        };
        let field_count = fixed[4] as usize;

        let mut def = DefinitionRecord::new(local_id, endianness, global_id);
        let field_bytes = take(buf, offset, field_count * 3)?;
        for triple in field_bytes.chunks_exact(3) {
            def.push_field(triple[0], triple[1], triple[2]);
        }

        if has_developer_data {
            let dev_count = take(buf, offset, 1)?[0] as usize;
            let dev_bytes = take(buf, offset, dev_count * 3)?;
            for triple in dev_bytes.chunks_exact(3) {
                def.push_developer_field(triple[0], triple[1], triple[2]);
            }
        }

        Ok(def)
    }

    /// Serialize this definition including its record header byte
    pub fn encode(&self, dst: &mut impl BufMut) {
        let mut header = HEADER_DEFINITION | (self.local_id & HEADER_LOCAL_MASK);
        if self.has_developer_fields() {
            header |= HEADER_DEVELOPER_DATA;
        }
        dst.put_u8(header);
        dst.put_u8(0); // reserved
        dst.put_u8(match self.endianness {
            Endianness::Little => 0,
            Endianness::Big => 1,
        });
        match self.endianness {
            Endianness::Little => dst.put_u16_le(self.global_id),
            Endianness::Big => dst.put_u16(self.global_id),
        }
        dst.put_u8(self.fields.len() as u8);
        for fd in &self.fields {
            dst.put_u8(fd.field_id);
            dst.put_u8(fd.size);
            dst.put_u8(fd.base_type);
        }
        if self.has_developer_fields() {
            dst.put_u8(self.developer_fields.len() as u8);
            for fd in &self.developer_fields {
                dst.put_u8(fd.field_id);
                dst.put_u8(fd.size);
                dst.put_u8(fd.dev_index);
            }
        }
    }

    /// Encoded size including the record header byte
    pub fn encoded_len(&self) -> usize {
        let mut len = 1 + 5 + self.fields.len() * 3;
        if self.has_developer_fields() {
            len += 1 + self.developer_fields.len() * 3;
        }
        len
    }
}
