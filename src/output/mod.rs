//! Output persistence for rewritten streams.
//!
//! Writes are all-or-nothing: the encoded stream arrives fully buffered, is
//! written to a temporary sibling path, and renamed into place. A failure at
//! any point leaves no partial output visible to other processes.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::utils::config::OUTPUT_SUFFIX;
use crate::utils::error::OutputError;

/// Write a fully encoded stream to `output_path`
///
/// **Public** - main entry point for file output
///
/// # Arguments
/// * `bytes` - Complete stream bytes (header, records, checksum)
/// * `output_path` - Destination path
///
/// # Errors
/// * `OutputError::InvalidPath` - Empty path or an existing directory
/// * `OutputError::WriteFailed` - I/O error during write or rename
pub fn write_stream(bytes: &[u8], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    // Stage next to the destination so the final rename stays on one
    // filesystem and is atomic
    let staging = staging_path(output_path);
    fs::write(&staging, bytes)?;
    if let Err(e) = fs::rename(&staging, output_path) {
        let _ = fs::remove_file(&staging);
        return Err(OutputError::WriteFailed(e));
    }

    info!(
        "Output written successfully ({} bytes) to {}",
        bytes.len(),
        output_path.display()
    );
    Ok(())
}

/// Default output path: the input stem with a `_modified` suffix
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("activity");
    let mut name = format!("{}{}", stem, OUTPUT_SUFFIX);
    if let Some(ext) = input.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    input.with_file_name(name)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

fn staging_path(output_path: &Path) -> PathBuf {
    let name = output_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output.fit");
    output_path.with_file_name(format!(".{}.tmp", name))
}
