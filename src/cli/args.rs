//! CLI argument definitions using clap.
//!
//! Commands:
//! - treewal inspect <log> [--json]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// treewal - structural log inspection for page-organized tree indexes
#[derive(Parser, Debug)]
#[command(name = "treewal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one diagnostics line per record in a structural log
    Inspect {
        /// Path to the log file
        log: PathBuf,

        /// Emit one JSON object per record instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
