//! Command implementations for the CLI.

pub mod convert;
pub mod inspect;

// Re-export command entry points
pub use convert::{execute_convert, quick_convert, validate_args, ConvertArgs};
pub use inspect::execute_inspect;
