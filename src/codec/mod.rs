//! FIT record-stream codec.
//!
//! This module handles:
//! - Field values, widths, and sub-field variant resolution
//! - Definition records (per-local-id wire layouts)
//! - Data records (decode/encode against a bound definition)
//! - The stream framing: header, interleaved records, trailing CRC

pub mod crc;
pub mod data;
pub mod definition;
pub mod field;
pub mod stream;

// Re-export main types
pub use data::{DataRecord, DeveloperFieldValue};
pub use definition::{DefinitionRecord, DeveloperFieldDefinition, FieldDefinition};
pub use field::{BaseType, Endianness, Field, FieldValue, SubField};
pub use stream::{FinalRecord, FitStream, OpaqueRecord, Record};

use crate::utils::error::FormatError;

/// Bounds-checked slice advance shared by the record decoders
pub(crate) fn take<'a>(buf: &'a [u8], offset: &mut usize, n: usize) -> Result<&'a [u8], FormatError> {
    if buf.len() < *offset + n {
        return Err(FormatError::Truncated {
            offset: *offset,
            needed: *offset + n - buf.len(),
        });
    }
    let slice = &buf[*offset..*offset + n];
    *offset += n;
    Ok(slice)
}
