//! Observability subsystem for smms
//!
//! Leveled, timestamped, labeled log lines:
//!
//! ```text
//! 2024-05-01 12:00:00 [smms-logs] info: Server is now listening at port 3000
//! ```
//!
//! # Transports
//!
//! - console (stdout, colorized level)
//! - rotating daily file (size-capped, gzip on rotation, 14 day retention)
//! - `error.log` (error only)
//! - `combined.log` (every line)
//! - `info.log` (info and above)
//!
//! # Usage
//!
//! ```ignore
//! use smms::observability::{LogConfig, Logger};
//!
//! let logger = Logger::init(&LogConfig::default())?;
//! logger.info("Root endpoint accessed");
//! ```
//!
//! The [`Logger`] is a handle passed to whoever needs it. Nothing here
//! installs a global subscriber.

mod config;
mod format;
mod logger;
mod rotation;

pub use config::LogConfig;
pub use format::LineFormat;
pub use logger::{Logger, MemoryLog};
pub use rotation::{RollingFile, RotationConfig};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to set up a log transport
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// The log directory could not be created
    #[error("failed to create log directory {}: {source}", .path.display())]
    LogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A log file could not be opened
    #[error("failed to open log file {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// `err` followed by each of its sources, separated by `": "`
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
