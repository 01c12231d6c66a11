//! File backend for the `log` facade with size-based rotation.
//!
//! Lines go to `~/.config/lucent/logs/lucent.log`. When the file grows
//! past the configured size it is renamed to `lucent.log.1` (one backup
//! kept) and a fresh file is started.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};
use serde::{Deserialize, Serialize};

const LOG_FILE_NAME: &str = "lucent.log";
const BACKUP_FILE_NAME: &str = "lucent.log.1";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether file logging is enabled.
    pub enabled: bool,
    /// Minimum level: "trace", "debug", "info", "warn" or "error".
    pub level: String,
    /// Maximum log file size in megabytes before rotation.
    pub max_file_mb: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".into(),
            max_file_mb: 10,
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

struct Sink {
    file: File,
    path: PathBuf,
    max_bytes: u64,
    written: u64,
}

impl Sink {
    fn open(path: PathBuf, max_bytes: u64) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            file,
            path,
            max_bytes,
            written,
        })
    }

    fn write_line(&mut self, line: &str) {
        let _ = self.file.write_all(line.as_bytes());
        self.written += line.len() as u64;
        if self.max_bytes > 0 && self.written >= self.max_bytes {
            self.rotate();
        }
    }

    fn rotate(&mut self) {
        let backup = self.path.with_file_name(BACKUP_FILE_NAME);
        let _ = fs::rename(&self.path, &backup);
        if let Ok(file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        {
            self.file = file;
        }
        self.written = 0;
    }
}

/// Rotating file logger.
pub struct FileLogger {
    level: LevelFilter,
    sink: Mutex<Sink>,
}

impl FileLogger {
    /// Opens (or creates) `lucent.log` inside `dir`.
    pub fn open(dir: &Path, config: &LogConfig) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let sink = Sink::open(dir.join(LOG_FILE_NAME), config.max_file_mb * 1024 * 1024)?;
        Ok(Self {
            level: config.level_filter(),
            sink: Mutex::new(sink),
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} [{}] {}: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
        if let Ok(mut sink) = self.sink.lock() {
            sink.write_line(&line);
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.file.flush();
        }
    }
}

/// Returns the log directory: `~/.config/lucent/logs/`.
pub fn log_dir() -> Option<PathBuf> {
    crate::config::config_dir().map(|d| d.join("logs"))
}

/// Installs the file logger as the global `log` backend.
///
/// Call once at daemon start. Does nothing when logging is disabled or
/// a logger is already installed.
pub fn init(config: &LogConfig) {
    if !config.enabled {
        return;
    }
    let Some(dir) = log_dir() else {
        return;
    };
    let logger = match FileLogger::open(&dir, config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Warning: could not open log file in {}: {e}", dir.display());
            return;
        }
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(config.level_filter());
    }
}

/// Flushes buffered output. Call at daemon teardown.
pub fn flush() {
    log::logger().flush();
}
