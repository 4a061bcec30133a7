//! Logging setup for SMS Bridge using tracing.
//!
//! Everything goes to stderr. The long-running `serve` and `poll` commands
//! also keep a daily log file under the platform data directory; when that
//! directory is not writable (read-only HOME, minimal container, phone) they
//! carry on with stderr only.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the file writer flushing until dropped.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    pub log_dir: Option<PathBuf>,
}

/// Non-blocking writer for a daily rolling log file.
struct LogFile {
    writer: NonBlocking,
    guard: WorkerGuard,
    dir: PathBuf,
}

/// Install the global subscriber. Never fails: file logging is best effort.
pub fn init(with_file: bool) -> LogGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,smsbridge=debug"));

    let (file, file_error) = if with_file {
        match get_log_dir().and_then(|dir| open_log_file(&dir)) {
            Ok(file) => (Some(file), None),
            Err(e) => (None, Some(e)),
        }
    } else {
        (None, None)
    };

    let (file_layer, guard, log_dir) = match file {
        Some(LogFile { writer, guard, dir }) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard), Some(dir))
        }
        None => (None, None, None),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true);

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
    }

    if let Some(e) = file_error {
        tracing::warn!("File logging disabled, logging to stderr only: {:#}", e);
    }
    if let Some(dir) = &log_dir {
        tracing::debug!("Log directory: {}", dir.display());
    }

    LogGuard {
        _file: guard,
        log_dir,
    }
}

/// Create `dir` and a daily `smsbridge.<date>.log` appender inside it.
fn open_log_file(dir: &Path) -> Result<LogFile> {
    std::fs::create_dir_all(dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("smsbridge")
        .filename_suffix("log")
        .build(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok(LogFile {
        writer,
        guard,
        dir: dir.to_path_buf(),
    })
}

/// Get the log directory path.
fn get_log_dir() -> Result<PathBuf> {
    let home = directories::ProjectDirs::from("com", "smsbridge", "smsbridge")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

    Ok(home.data_dir().join("logs"))
}
