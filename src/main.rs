//! schemadb CLI entry point
//!
//! Parses arguments, dispatches to the CLI module and exits non-zero on
//! failure. Configuration, schema loading and serving all live in `cli`.

use schemadb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
