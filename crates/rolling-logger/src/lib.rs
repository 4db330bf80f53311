//! Rolling Logger
//!
//! Installs a `tracing` subscriber that also captures `log` records,
//! writing to stderr and optionally to a size-rotated file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Default size of a log file before it is rotated
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;

/// Default number of rotated files kept
pub const DEFAULT_KEEP: usize = 3;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log file error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
    #[error("logger already initialised: {0}")]
    Init(String),
}

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Application name, used as the log file stem
    pub app_name: String,
    /// Filter directive (`info`, `adoteme=debug`, ...)
    pub level: String,
    /// Directory for the log file; stderr only when `None`
    pub dir: Option<PathBuf>,
    pub max_bytes: u64,
    pub keep: usize,
}

impl LoggerConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            level: "info".to_string(),
            dir: None,
            max_bytes: DEFAULT_MAX_BYTES,
            keep: DEFAULT_KEEP,
        }
    }
}

/// Install the global subscriber.
///
/// Fails if a subscriber (or `log` logger) is already installed.
pub fn init_logger(config: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(&config.level).map_err(|e| LoggerError::Filter {
        filter: config.level.clone(),
        reason: e.to_string(),
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));

    let result = match &config.dir {
        Some(dir) => {
            let file = RollingFile::open(dir, &config.app_name, config.max_bytes, config.keep)?;
            builder
                .with_ansi(false)
                .with_writer(io::stderr.and(Mutex::new(file)))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };
    result.map_err(|e| LoggerError::Init(e.to_string()))?;

    log::debug!("logger initialised for {}", config.app_name);
    Ok(())
}

/// Log a one-off info line
pub fn info(message: &str) {
    tracing::info!("{}", message);
}

/// Log a one-off error line
pub fn error(message: &str) {
    tracing::error!("{}", message);
}

/// Append-only log file rotated by size.
///
/// `app.log` rotates to `app.log.1`, `app.log.1` to `app.log.2`, and so on;
/// files beyond `keep` are dropped.
pub struct RollingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    keep: usize,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, max_bytes: u64, keep: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        let mut rolling = Self {
            path,
            file,
            written,
            max_bytes,
            keep,
        };
        let banner = format!(
            "=== {} log opened {} ===\n",
            app_name,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        rolling.write_all(banner.as_bytes())?;
        Ok(rolling)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.keep == 0 {
            fs::remove_file(&self.path)?;
        } else {
            for index in (1..self.keep).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        }
        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
