//! CLI argument definitions for the `tiff` demo binary.
//!
//! # Example
//!
//! ```ignore
//! use wsi_tiff_codec::config::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! match cli.command {
//!     wsi_tiff_codec::config::Command::Inspect(cmd) => { /* ... */ }
//!     wsi_tiff_codec::config::Command::Roundtrip(cmd) => { /* ... */ }
//! }
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect or round-trip a TIFF/BigTIFF whole-slide image.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a TIFF/BigTIFF file and print its pyramid summary.
    Inspect(InspectConfig),
    /// Serialize a parsed file to the wire format, deserialize it back, and
    /// report whether the round-trip matches.
    Roundtrip(RoundtripConfig),
}

#[derive(Parser, Debug, Clone)]
pub struct InspectConfig {
    /// Path to the TIFF/BigTIFF file.
    pub path: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct RoundtripConfig {
    /// Path to the TIFF/BigTIFF file.
    pub path: PathBuf,

    /// Skip the LZ4 envelope.
    #[arg(long)]
    pub no_compress: bool,
}

impl RoundtripConfig {
    /// Whether the wire payload should be LZ4-wrapped.
    pub fn compress(&self) -> bool {
        !self.no_compress
    }
}
