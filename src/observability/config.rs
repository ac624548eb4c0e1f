//! Logging configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory holding every log file (default: "logs")
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Label printed in brackets on every line (default: "smms-logs")
    #[serde(default = "default_label")]
    pub label: String,

    /// Size cap of one rotating file (default: 1 KiB)
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    /// Days a rotated file is kept (default: 14)
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Gzip rotated files (default: true)
    #[serde(default = "default_true")]
    pub compress_rotated: bool,

    /// Also log to stdout (default: true)
    #[serde(default = "default_true")]
    pub console: bool,
}

fn default_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_label() -> String {
    "smms-logs".to_string()
}

fn default_max_file_size_bytes() -> u64 {
    1024
}

fn default_retention_days() -> u32 {
    14
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            label: default_label(),
            max_file_size_bytes: default_max_file_size_bytes(),
            retention_days: default_retention_days(),
            compress_rotated: true,
            console: true,
        }
    }
}

impl LogConfig {
    /// Config writing into `dir` with every other setting at its default
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }
}
