//! CLI module for smms
//!
//! Provides command-line interface for:
//! - serve: Open the logger and store session, then serve HTTP until ctrl-c
//! - check-config: Validate a configuration file and print the effective settings

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, run, run_command, serve, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
