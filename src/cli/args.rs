//! CLI argument definitions using clap
//!
//! Commands:
//! - smms serve [--config <path>] [--database-url <url>] [--in-memory]
//! - smms check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// smms - HTTP service for vehicle records
#[derive(Parser, Debug)]
#[command(name = "smms")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the records API
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured database URL
        #[arg(long)]
        database_url: Option<String>,

        /// Keep records in process memory instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },

    /// Validate configuration and print the effective settings
    CheckConfig {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
