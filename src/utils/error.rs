//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that make a FIT stream undecodable.
///
/// These are fatal for the file they occur in: the pipeline aborts without
/// producing partial output. Recoverable per-field anomalies (unknown field
/// ids, malformed text, empty developer-field slices) are logged and skipped
/// instead of raised.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("not a FIT stream: {0}")]
    InvalidHeader(String),

    #[error("truncated stream: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("declared payload length {size} exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("data record references local id {local_id} with no prior definition")]
    UnresolvedLocalId { local_id: u8 },

    #[error("checksum mismatch (stored {stored:#06x}, computed {computed:#06x})")]
    ChecksumMismatch { stored: u16, computed: u16 },

    #[error("header checksum mismatch (stored {stored:#06x}, computed {computed:#06x})")]
    HeaderChecksumMismatch { stored: u16, computed: u16 },

    #[error("I/O error reading stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when the configured device identity is unusable.
///
/// Rejected before any file is opened, so an invalid profile never
/// touches the input directory.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("serial number {0} outside the valid unit-id range {1}..={2}")]
    SerialOutOfRange(u32, u32, u32),

    #[error("manufacturer id must be nonzero")]
    ZeroManufacturer,

    #[error("product id must be nonzero")]
    ZeroProduct,
}

/// Errors that can occur while persisting an output stream
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors surfaced by the rewrite pipeline for a single file
#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
