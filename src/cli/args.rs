//! CLI argument definitions using clap
//!
//! Commands:
//! - schemadb serve [--config <path>] [--schemas <dir>] [--port <port>]
//! - schemadb schemas [--config <path>] [--schemas <dir>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// schemadb - schema-driven document store
#[derive(Parser, Debug)]
#[command(name = "schemadb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the schema registry and start the HTTP API
    Serve {
        /// Path to a JSON configuration file
        #[arg(long, env = "SCHEMADB_CONFIG")]
        config: Option<PathBuf>,

        /// Schema root directory (overrides config and SCHEMAS)
        #[arg(long)]
        schemas: Option<PathBuf>,

        /// HTTP port (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load the schema registry, print the registered types and exit
    Schemas {
        /// Path to a JSON configuration file
        #[arg(long, env = "SCHEMADB_CONFIG")]
        config: Option<PathBuf>,

        /// Schema root directory (overrides config and SCHEMAS)
        #[arg(long)]
        schemas: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
