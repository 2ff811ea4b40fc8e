//! Fit Faker CLI
//!
//! Rewrites FIT activity files from virtual trainer apps so they carry
//! the identity of a real head unit.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use fit_faker::commands::{execute_convert, execute_inspect, validate_args, ConvertArgs};

/// Fit Faker - device identity rewriting for FIT activity files
#[derive(Parser, Debug)]
#[command(name = "fit-faker")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite one or more FIT files
    Convert {
        /// Input FIT files
        files: Vec<PathBuf>,

        /// Output path (only valid with a single input; defaults to
        /// <stem>_modified.fit next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON profile with the device identity and an optional
        /// spoofable-manufacturer override
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Decode and transform for validation without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Decode a FIT file and print a record summary
    Inspect {
        /// Path to the FIT file
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Convert {
            files,
            output,
            profile,
            dry_run,
        } => {
            let args = ConvertArgs {
                inputs: files,
                output,
                profile,
                dry_run,
            };

            // Validate args first
            validate_args(&args)?;

            // Execute conversion
            execute_convert(args)?;
        }

        Commands::Inspect { file } => {
            execute_inspect(&file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Fit Faker v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Rewrites FIT activity files from virtual trainer apps so they");
    println!("carry the identity of a real head unit.");
}
