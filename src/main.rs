//! treewal CLI entry point.
//!
//! A minimal entrypoint: parse arguments, dispatch to the CLI module,
//! print errors to stderr, exit non-zero on failure. No subsystem logic
//! lives here.

use treewal::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
