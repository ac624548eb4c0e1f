//! Leveled logger handle.
//!
//! A [`Logger`] owns a tracing dispatcher built from one fmt layer per
//! transport. Events are emitted into that dispatcher only, so several
//! loggers (the server's, a test's) can coexist in one process.

use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::dispatcher::{self, Dispatch};
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::config::LogConfig;
use super::format::LineFormat;
use super::rotation::{RollingFile, RotationConfig};
use super::{ObservabilityError, ObservabilityResult};

const ROTATING_PREFIX: &str = "smms";
const ERROR_LOG: &str = "error.log";
const COMBINED_LOG: &str = "combined.log";
const INFO_LOG: &str = "info.log";

/// Cloneable logging capability
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

fn file_layer<S, W>(label: &str, writer: W, level: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer::<S>()
        .event_format(LineFormat::new(label))
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(level)
}

fn open_append(path: &Path) -> ObservabilityResult<Arc<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Arc::new)
        .map_err(|source| ObservabilityError::OpenFile {
            path: path.to_path_buf(),
            source,
        })
}

impl Logger {
    /// Build the console and file transports described by `config`
    pub fn init(config: &LogConfig) -> ObservabilityResult<Self> {
        fs::create_dir_all(&config.dir).map_err(|source| ObservabilityError::LogDir {
            path: config.dir.clone(),
            source,
        })?;

        let label = config.label.as_str();
        let rolling = Arc::new(RollingFile::open(RotationConfig::from_log_config(
            config,
            ROTATING_PREFIX,
        ))?);
        let error_log = open_append(&config.dir.join(ERROR_LOG))?;
        let combined_log = open_append(&config.dir.join(COMBINED_LOG))?;
        let info_log = open_append(&config.dir.join(INFO_LOG))?;

        let console = config.console.then(|| {
            fmt::layer()
                .event_format(LineFormat::new(label))
                .with_writer(io::stdout)
                .with_ansi(true)
                .with_filter(LevelFilter::INFO)
        });

        let subscriber = tracing_subscriber::registry()
            .with(console)
            .with(file_layer(label, rolling, LevelFilter::INFO))
            .with(file_layer(label, error_log, LevelFilter::ERROR))
            .with(file_layer(label, combined_log, LevelFilter::INFO))
            .with(file_layer(label, info_log, LevelFilter::INFO));

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// Logger writing plain lines at info and above into `writer`
    pub fn to_writer<W>(label: &str, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber =
            tracing_subscriber::registry().with(file_layer(label, writer, LevelFilter::INFO));
        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Logger capturing its lines in memory
    pub fn capture(label: &str) -> (Self, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::default());
        (Self::to_writer(label, Arc::clone(&log)), log)
    }

    /// Logger that drops everything
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    pub fn info(&self, message: impl Display) {
        dispatcher::with_default(&self.dispatch, || tracing::info!("{}", message));
    }

    pub fn warn(&self, message: impl Display) {
        dispatcher::with_default(&self.dispatch, || tracing::warn!("{}", message));
    }

    pub fn error(&self, message: impl Display) {
        dispatcher::with_default(&self.dispatch, || tracing::error!("{}", message));
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

/// In-memory log sink
#[derive(Debug, Default)]
pub struct MemoryLog {
    buffer: Mutex<Vec<u8>>,
}

impl MemoryLog {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Written lines, without trailing newlines
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for &MemoryLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assert_line(line: &str, label: &str, level: &str, message: &str) {
        // "YYYY-MM-DD HH:MM:SS" is 19 characters
        let (timestamp, rest) = line.split_at(19);
        assert!(
            chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").is_ok(),
            "bad timestamp in {:?}",
            line
        );
        assert_eq!(rest, format!(" [{}] {}: {}", label, level, message));
    }

    #[test]
    fn test_line_format() {
        let (logger, log) = Logger::capture("smms-logs");
        logger.info("Root endpoint accessed");

        let lines = log.lines();
        assert_eq!(lines.len(), 1);
        assert_line(&lines[0], "smms-logs", "info", "Root endpoint accessed");
    }

    #[test]
    fn test_levels() {
        let (logger, log) = Logger::capture("test");
        logger.info("a");
        logger.warn("b");
        logger.error("c");

        let lines = log.lines();
        assert_eq!(lines.len(), 3);
        assert_line(&lines[0], "test", "info", "a");
        assert_line(&lines[1], "test", "warn", "b");
        assert_line(&lines[2], "test", "error", "c");
    }

    #[test]
    fn test_loggers_are_isolated() {
        let (first, first_log) = Logger::capture("first");
        let (second, second_log) = Logger::capture("second");
        first.info("only first");
        second.warn("only second");

        assert_eq!(first_log.lines().len(), 1);
        assert_eq!(second_log.lines().len(), 1);
        assert!(first_log.contents().contains("only first"));
        assert!(second_log.contents().contains("only second"));
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        Logger::disabled().error("nobody hears this");
    }

    #[test]
    fn test_init_routes_levels_to_files() {
        let tmp = TempDir::new().unwrap();
        let config = LogConfig {
            console: false,
            ..LogConfig::in_dir(tmp.path())
        };
        let logger = Logger::init(&config).unwrap();

        logger.info("started");
        logger.warn("missing fields");
        logger.error("database down");

        let read = |name: &str| fs::read_to_string(tmp.path().join(name)).unwrap();
        let error = read(ERROR_LOG);
        assert_eq!(error.lines().count(), 1);
        assert!(error.contains("error: database down"));

        for name in [COMBINED_LOG, INFO_LOG] {
            let contents = read(name);
            assert_eq!(contents.lines().count(), 3, "{}", name);
            assert!(!contents.contains('\x1b'));
        }

        let rotating: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("smms-"))
            .collect();
        assert!(!rotating.is_empty());
    }
}
