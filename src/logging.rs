//! Logging setup for the command-line tools.
//!
//! Each tool writes to stderr and to its own per-run file under the app
//! `logs/` directory. Stdout stays free for progress lines and the
//! evaluation report.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Log files kept per tool.
const MAX_LOG_FILES: usize = 10;

/// Filter applied when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber for `tool`, logging to
/// `logs/<tool>_<timestamp>.log` and stderr.
///
/// Only the first call installs anything. Older files of the same tool beyond
/// the retention count are removed; removal failures are logged, not returned.
pub fn init(tool: &str) -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let log_dir = app_dirs::logs_dir()?;
    let log_file_name = format_log_file_name(tool, now_local_or_utc())?;
    let log_path = log_dir.join(&log_file_name);
    create_log_file(&log_path)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::never(&log_dir, log_file_name));

    let timer = build_timer();
    let stderr_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stderr);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);
    let subscriber = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(stderr_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!(tool, "Logging to {}", log_path.display());
    for (path, err) in prune_old_logs(&log_dir, tool, MAX_LOG_FILES) {
        tracing::warn!("Could not remove old log {}: {err}", path.display());
    }
    Ok(())
}

fn create_log_file(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Remove the oldest `<tool>_*.log` files beyond `keep`, returning the
/// paths that could not be removed.
fn prune_old_logs(dir: &Path, tool: &str, keep: usize) -> Vec<(PathBuf, std::io::Error)> {
    let prefix = format!("{tool}_");
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut logs: Vec<(SystemTime, PathBuf)> = read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&prefix) && name.ends_with(".log")
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect();

    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    logs.into_iter()
        .take(excess)
        .filter_map(|(_, path)| fs::remove_file(&path).err().map(|err| (path, err)))
        .collect()
}

fn format_log_file_name(tool: &str, now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let stamp = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{tool}_{stamp}.log"))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};
    use tempfile::tempdir;

    #[test]
    fn log_filename_carries_tool_and_timestamp() {
        let fixed = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let name = format_log_file_name("disaster-tagger-train", fixed).unwrap();
        assert_eq!(name, "disaster-tagger-train_2023-11-14_22-13-20.log");
    }

    #[test]
    fn prune_only_touches_the_tools_own_logs() {
        let dir = tempdir().unwrap();
        for idx in 0..5 {
            create_log_file(&dir.path().join(format!("train_{idx}.log"))).unwrap();
            thread::sleep(Duration::from_millis(10));
        }
        create_log_file(&dir.path().join("classify_0.log")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert!(prune_old_logs(dir.path(), "train", 3).is_empty());
        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                "classify_0.log",
                "notes.txt",
                "train_2.log",
                "train_3.log",
                "train_4.log",
            ]
        );
    }

    #[test]
    fn pruning_a_missing_directory_is_quiet() {
        let dir = tempdir().unwrap();
        assert!(prune_old_logs(&dir.path().join("absent"), "train", 1).is_empty());
    }
}
