//! Rotating daily log file.
//!
//! The active file is `<prefix>-<YYYY-MM-DD>.log`. A new file starts when the
//! date changes or when a write would push the active file past the size cap;
//! same-day overflow files are `<prefix>-<date>.<n>.log`. The file being
//! rotated out is gzipped to `<name>.gz`, then files older than the retention
//! window are removed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use chrono::{Local, NaiveDate};
use flate2::write::GzEncoder;
use flate2::Compression;

use super::config::LogConfig;
use super::{ObservabilityError, ObservabilityResult};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Rotation settings
#[derive(Debug, Clone)]
pub struct RotationConfig {
    pub dir: PathBuf,
    pub prefix: String,
    pub max_file_size_bytes: u64,
    pub retention: Duration,
    pub compress: bool,
}

impl RotationConfig {
    pub fn from_log_config(config: &LogConfig, prefix: impl Into<String>) -> Self {
        Self {
            dir: config.dir.clone(),
            prefix: prefix.into(),
            max_file_size_bytes: config.max_file_size_bytes,
            retention: Duration::from_secs(u64::from(config.retention_days) * SECONDS_PER_DAY),
            compress: config.compress_rotated,
        }
    }
}

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

struct ActiveFile {
    file: File,
    path: PathBuf,
    date: NaiveDate,
    index: u32,
    written: u64,
}

/// Size-capped, date-rotated log file
///
/// `&RollingFile` implements [`io::Write`], so an `Arc<RollingFile>` can be
/// handed to a tracing fmt layer as its writer.
pub struct RollingFile {
    config: RotationConfig,
    clock: Clock,
    active: Mutex<Option<ActiveFile>>,
}

impl RollingFile {
    /// Open today's file, creating the directory if needed
    pub fn open(config: RotationConfig) -> ObservabilityResult<Self> {
        Self::with_clock(config, Box::new(|| Local::now().date_naive()))
    }

    /// Open with a custom source for the current date
    pub fn with_clock(config: RotationConfig, clock: Clock) -> ObservabilityResult<Self> {
        fs::create_dir_all(&config.dir).map_err(|source| ObservabilityError::LogDir {
            path: config.dir.clone(),
            source,
        })?;

        let rolling = Self {
            config,
            clock,
            active: Mutex::new(None),
        };

        let today = (rolling.clock)();
        let active = rolling
            .open_active(today, 0)
            .map_err(|source| ObservabilityError::OpenFile {
                path: rolling.file_path(today, 0),
                source,
            })?;
        *rolling.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(active);

        Ok(rolling)
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> Option<PathBuf> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|active| active.path.clone())
    }

    fn file_path(&self, date: NaiveDate, index: u32) -> PathBuf {
        let name = if index == 0 {
            format!("{}-{}.log", self.config.prefix, date.format("%Y-%m-%d"))
        } else {
            format!("{}-{}.{}.log", self.config.prefix, date.format("%Y-%m-%d"), index)
        };
        self.config.dir.join(name)
    }

    /// First file for `date` at or after `index` that still has room
    fn open_active(&self, date: NaiveDate, mut index: u32) -> io::Result<ActiveFile> {
        loop {
            let path = self.file_path(date, index);
            if compressed_path(&path).exists() {
                index += 1;
                continue;
            }

            let written = match fs::metadata(&path) {
                Ok(meta) if meta.len() >= self.config.max_file_size_bytes => {
                    index += 1;
                    continue;
                }
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
                Err(e) => return Err(e),
            };

            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            return Ok(ActiveFile {
                file,
                path,
                date,
                index,
                written,
            });
        }
    }

    fn rotate(&self, active: &mut Option<ActiveFile>, today: NaiveDate) -> io::Result<()> {
        let next_index = match active.take() {
            Some(previous) => {
                let next_index = if previous.date == today {
                    previous.index + 1
                } else {
                    0
                };
                let ActiveFile { mut file, path, .. } = previous;
                file.flush()?;
                drop(file);
                if self.config.compress {
                    compress(&path)?;
                }
                next_index
            }
            None => 0,
        };

        self.prune()?;
        *active = Some(self.open_active(today, next_index)?);
        Ok(())
    }

    /// Remove rotated files last modified before the retention window
    fn prune(&self) -> io::Result<()> {
        let cutoff = match SystemTime::now().checked_sub(self.config.retention) {
            Some(cutoff) => cutoff,
            None => return Ok(()),
        };
        let prefix = format!("{}-", self.config.prefix);

        for entry in fs::read_dir(&self.config.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let is_ours =
                name.starts_with(&prefix) && (name.ends_with(".log") || name.ends_with(".log.gz"));
            if !is_ours {
                continue;
            }
            if entry.metadata()?.modified()? < cutoff {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

fn compressed_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` into `<path>.gz` and remove the original
fn compress(path: &Path) -> io::Result<PathBuf> {
    let target = compressed_path(path);
    let mut source = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(&target)?, Compression::default());
    io::copy(&mut source, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(path)?;
    Ok(target)
}

impl Write for &RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let today = (self.clock)();
        let len = buf.len() as u64;

        let needs_rotation = match active.as_ref() {
            None => true,
            Some(current) => {
                current.date != today
                    || (current.written > 0
                        && current.written + len > self.config.max_file_size_bytes)
            }
        };
        if needs_rotation {
            self.rotate(&mut active, today)?;
        }

        let current = active
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no active log file"))?;
        current.file.write_all(buf)?;
        current.written += len;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            Some(current) => current.file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::Arc;

    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn config(dir: &Path, max: u64) -> RotationConfig {
        RotationConfig {
            dir: dir.to_path_buf(),
            prefix: "smms".to_string(),
            max_file_size_bytes: max,
            retention: Duration::from_secs(14 * SECONDS_PER_DAY),
            compress: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_clock(day: NaiveDate) -> Clock {
        Box::new(move || day)
    }

    fn gunzip(path: &Path) -> String {
        let mut out = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_writes_to_dated_file() {
        let tmp = TempDir::new().unwrap();
        let rolling =
            RollingFile::with_clock(config(tmp.path(), 1024), fixed_clock(date(2024, 5, 1))).unwrap();

        (&rolling).write_all(b"first line\n").unwrap();

        let path = tmp.path().join("smms-2024-05-01.log");
        assert_eq!(rolling.current_path(), Some(path.clone()));
        assert_eq!(fs::read_to_string(path).unwrap(), "first line\n");
    }

    #[test]
    fn test_size_cap_rotates_and_compresses() {
        let tmp = TempDir::new().unwrap();
        let rolling =
            RollingFile::with_clock(config(tmp.path(), 16), fixed_clock(date(2024, 5, 1))).unwrap();

        (&rolling).write_all(b"0123456789\n").unwrap();
        (&rolling).write_all(b"abcdefghij\n").unwrap();

        let first = tmp.path().join("smms-2024-05-01.log");
        let second = tmp.path().join("smms-2024-05-01.1.log");
        assert!(!first.exists());
        assert_eq!(gunzip(&compressed_path(&first)), "0123456789\n");
        assert_eq!(fs::read_to_string(second).unwrap(), "abcdefghij\n");
    }

    #[test]
    fn test_oversized_line_still_written() {
        let tmp = TempDir::new().unwrap();
        let rolling =
            RollingFile::with_clock(config(tmp.path(), 4), fixed_clock(date(2024, 5, 1))).unwrap();

        (&rolling).write_all(b"longer than the cap\n").unwrap();

        let path = tmp.path().join("smms-2024-05-01.log");
        assert_eq!(fs::read_to_string(path).unwrap(), "longer than the cap\n");
    }

    #[test]
    fn test_date_change_rotates() {
        let tmp = TempDir::new().unwrap();
        let today = Arc::new(Mutex::new(date(2024, 5, 1)));
        let clock_day = Arc::clone(&today);
        let rolling = RollingFile::with_clock(
            config(tmp.path(), 1024),
            Box::new(move || *clock_day.lock().unwrap()),
        )
        .unwrap();

        (&rolling).write_all(b"may first\n").unwrap();
        *today.lock().unwrap() = date(2024, 5, 2);
        (&rolling).write_all(b"may second\n").unwrap();

        assert!(tmp.path().join("smms-2024-05-01.log.gz").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("smms-2024-05-02.log")).unwrap(),
            "may second\n"
        );
    }

    #[test]
    fn test_reopen_skips_full_and_compressed_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("smms-2024-05-01.log.gz"), b"").unwrap();
        fs::write(tmp.path().join("smms-2024-05-01.1.log"), b"0123456789abcdef").unwrap();

        let rolling =
            RollingFile::with_clock(config(tmp.path(), 16), fixed_clock(date(2024, 5, 1))).unwrap();

        assert_eq!(
            rolling.current_path(),
            Some(tmp.path().join("smms-2024-05-01.2.log"))
        );
    }

    #[test]
    fn test_rotation_prunes_expired_files() {
        let tmp = TempDir::new().unwrap();
        let stale = tmp.path().join("smms-2024-01-01.log.gz");
        let unrelated = tmp.path().join("error.log");
        fs::write(&stale, b"").unwrap();
        fs::write(&unrelated, b"").unwrap();
        let old = SystemTime::now() - Duration::from_secs(30 * SECONDS_PER_DAY);
        for path in [&stale, &unrelated] {
            File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(old)
                .unwrap();
        }

        let rolling =
            RollingFile::with_clock(config(tmp.path(), 8), fixed_clock(date(2024, 5, 1))).unwrap();
        (&rolling).write_all(b"12345678").unwrap();
        (&rolling).write_all(b"rotate").unwrap();

        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_compression_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config(tmp.path(), 8);
        cfg.compress = false;
        let rolling = RollingFile::with_clock(cfg, fixed_clock(date(2024, 5, 1))).unwrap();

        (&rolling).write_all(b"12345678").unwrap();
        (&rolling).write_all(b"next").unwrap();

        assert!(tmp.path().join("smms-2024-05-01.log").exists());
        assert!(!tmp.path().join("smms-2024-05-01.log.gz").exists());
    }
}
