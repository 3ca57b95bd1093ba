//! Application directory helpers anchored to a single `.disaster_tagger` folder.
//!
//! Config and log files live under the OS config directory by default. The
//! `DISASTER_TAGGER_CONFIG_HOME` variable overrides the base for tests or
//! portable setups.

use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the OS config root.
pub const APP_DIR_NAME: &str = ".disaster_tagger";

/// Environment variable overriding the base config directory.
pub const CONFIG_HOME_ENV: &str = "DISASTER_TAGGER_CONFIG_HOME";

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolve the root `.disaster_tagger` path without touching the filesystem.
pub fn app_root_path() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    Ok(base.join(APP_DIR_NAME))
}

/// Return the root `.disaster_tagger` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let path = app_root_path()?;
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Return the logs directory inside the app root, creating both if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    let path = app_root_path()?.join("logs");
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn config_base_dir() -> Option<PathBuf> {
    if let Some(path) = base_override::current() {
        return Some(path);
    }
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(not(test))]
mod base_override {
    use std::path::PathBuf;

    pub(super) fn current() -> Option<PathBuf> {
        None
    }
}

/// In-process base override for unit tests, serialized by a lock held for
/// the guard's lifetime.
#[cfg(test)]
pub(crate) mod base_override {
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard};

    static BASE: Mutex<Option<PathBuf>> = Mutex::new(None);
    static LOCK: Mutex<()> = Mutex::new(());

    pub(super) fn current() -> Option<PathBuf> {
        BASE.lock().ok().and_then(|guard| guard.clone())
    }

    pub(crate) struct ConfigBaseGuard {
        _lock: MutexGuard<'static, ()>,
    }

    impl ConfigBaseGuard {
        pub(crate) fn set(path: PathBuf) -> Self {
            let lock = LOCK.lock().unwrap_or_else(|err| err.into_inner());
            *BASE.lock().unwrap_or_else(|err| err.into_inner()) = Some(path);
            Self { _lock: lock }
        }
    }

    impl Drop for ConfigBaseGuard {
        fn drop(&mut self) {
            *BASE.lock().unwrap_or_else(|err| err.into_inner()) = None;
        }
    }
}
