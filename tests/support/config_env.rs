use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use disaster_tagger::app_dirs::{APP_DIR_NAME, CONFIG_HOME_ENV};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Points `DISASTER_TAGGER_CONFIG_HOME` at `base` until dropped. Holds a
/// process-wide lock so env changes never overlap.
pub struct ConfigHomeGuard {
    base: PathBuf,
    previous: Option<String>,
    _lock: MutexGuard<'static, ()>,
}

impl ConfigHomeGuard {
    pub fn set(base: PathBuf) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(CONFIG_HOME_ENV).ok();
        // SAFETY: every env mutation in these tests happens under ENV_LOCK.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, &base);
        }
        Self {
            base,
            previous,
            _lock: lock,
        }
    }

    /// App root the library resolves while the guard is alive.
    pub fn app_root(&self) -> PathBuf {
        self.base.join(APP_DIR_NAME)
    }
}

impl Drop for ConfigHomeGuard {
    fn drop(&mut self) {
        // SAFETY: still holding ENV_LOCK.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}
