//! docdiff CLI
//!
//! Diagnostic tools for append-only document store files.
//!
//! # Commands
//!
//! - `diff` - Report every key whose presence or version differs between two files
//! - `delta-scan` - Stream the documents changed between adjacent headers as JSON lines
//! - `inspect` - Display header and document statistics

mod commands;

use clap::{Parser, Subcommand};
use docdiff_store::StoreConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// docdiff command-line store tools.
#[derive(Parser)]
#[command(name = "docdiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Skip block checksum verification
    #[arg(global = true, long)]
    no_verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the documents of two store files
    Diff {
        /// First store file
        file_a: PathBuf,

        /// Second store file
        file_b: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Stream per-header document changes of one store file
    DeltaScan {
        /// Store file
        file: PathBuf,

        /// Include document bodies (also enabled by setting INCLUDE_DOC_BODY)
        #[arg(long)]
        include_body: bool,
    },

    /// Display header and document statistics
    Inspect {
        /// Store file
        file: PathBuf,

        /// List every header
        #[arg(long)]
        headers: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries reports.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = StoreConfig::new().verify_checksums(!cli.no_verify);

    match cli.command {
        Commands::Diff {
            file_a,
            file_b,
            format,
        } => {
            commands::diff::run(&file_a, &file_b, &format, &config)?;
        }
        Commands::DeltaScan { file, include_body } => {
            let include_body = commands::delta_scan::body_requested(
                include_body,
                std::env::var_os(commands::delta_scan::INCLUDE_BODY_ENV),
            );
            commands::delta_scan::run(&file, include_body, &config)?;
        }
        Commands::Inspect {
            file,
            headers,
            format,
        } => {
            commands::inspect::run(&file, headers, &format, &config)?;
        }
        Commands::Version => {
            println!("docdiff CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("docdiff core v{}", docdiff_core::VERSION);
        }
    }

    Ok(())
}
