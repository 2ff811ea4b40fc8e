//! Convert command implementation.
//!
//! The convert command:
//! 1. Loads the device profile (or uses the Edge 830 defaults)
//! 2. Validates the identity before touching any file
//! 3. Decodes, rewrites, and re-encodes each input file
//! 4. Reports per-file results; one bad file never aborts the batch

use crate::editor::FitEditor;
use crate::profile::identity::ConversionProfile;
use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the convert command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    /// Input FIT files to rewrite
    pub inputs: Vec<PathBuf>,

    /// Explicit output path; only valid with a single input
    pub output: Option<PathBuf>,

    /// Path to a JSON profile (device identity + spoofable set override)
    pub profile: Option<PathBuf>,

    /// Decode and transform for validation, but write nothing
    pub dry_run: bool,
}

/// Execute the convert command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Convert command arguments
///
/// # Returns
/// Ok if at least one file converted (or validated in dry-run mode)
///
/// # Errors
/// * Unreadable or invalid profile file
/// * Identity validation failures (rejected before any file is opened)
/// * Every input failing to convert
pub fn execute_convert(args: ConvertArgs) -> Result<()> {
    let start_time = Instant::now();

    let profile = load_profile(args.profile.as_deref())?;
    let editor = FitEditor::new(profile.identity.clone(), profile.policy())
        .context("Profile device identity is invalid")?;

    info!(
        "Simulating manufacturer {} product {} (serial {})",
        editor.identity().manufacturer,
        editor.identity().product,
        editor.identity().serial_number
    );
    if args.dry_run {
        warn!("In dry-run mode; no files will be written");
    }

    let mut converted = 0usize;
    let mut failed = 0usize;
    for input in &args.inputs {
        let explicit_output = if args.inputs.len() == 1 {
            args.output.as_deref()
        } else {
            None
        };
        match editor.edit_file(input, explicit_output, args.dry_run) {
            Ok(output) => {
                converted += 1;
                info!("✓ {} -> {}", input.display(), output.display());
            }
            Err(e) => {
                failed += 1;
                error!(
                    "File \"{}\" could not be converted, skipping...\n  Error: {}\n  If you believe this file is valid, re-run with -v for debug logs.",
                    input.display(),
                    e
                );
            }
        }
    }

    if converted == 0 {
        bail!("All {} file(s) failed to convert", failed);
    }

    let elapsed = start_time.elapsed();
    info!(
        "Converted {}/{} file(s) in {:.2}s",
        converted,
        converted + failed,
        elapsed.as_secs_f64()
    );
    Ok(())
}

/// Validate convert arguments
///
/// **Public** - can be called before execute_convert for early validation
pub fn validate_args(args: &ConvertArgs) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("At least one input file is required");
    }

    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output is only valid with a single input file");
    }

    for input in &args.inputs {
        if input.as_os_str().is_empty() {
            bail!("Input path cannot be empty");
        }
    }

    Ok(())
}

/// Load the conversion profile, falling back to built-in defaults
///
/// **Private** - internal helper for execute_convert
fn load_profile(path: Option<&std::path::Path>) -> Result<ConversionProfile> {
    let Some(path) = path else {
        return Ok(ConversionProfile::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file {}", path.display()))?;
    let profile: ConversionProfile = serde_json::from_str(&raw)
        .with_context(|| format!("Profile file {} is not valid JSON", path.display()))?;
    Ok(profile)
}

/// Quick conversion with defaults (convenience function)
///
/// **Public** - simplified API for the common one-file case
pub fn quick_convert(input: impl Into<PathBuf>) -> Result<PathBuf> {
    let input = input.into();
    let args = ConvertArgs {
        inputs: vec![input.clone()],
        ..Default::default()
    };
    validate_args(&args)?;
    execute_convert(args)?;
    Ok(crate::output::default_output_path(&input))
}
