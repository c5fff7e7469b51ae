//! Command-line interface for log inspection.

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::inspect;
pub use errors::{CliError, CliResult};

use std::io;

/// Parses arguments and runs the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Command::Inspect { log, json } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            inspect(&log, json, &mut out)
        }
    }
}
