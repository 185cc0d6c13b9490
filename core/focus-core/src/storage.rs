//! Storage configuration and path management for Focus Log.
//!
//! Every file the recorder and viewer touch is resolved through
//! [`StorageConfig`], so tests can point the whole system at a temp directory
//! with [`StorageConfig::with_root`].
//!
//! ## Layout
//!
//! ```text
//! <data_dir>/FocusLog/
//! ├── focus_log.json          session document (recorder writes, viewer reads)
//! ├── viewer_settings.json    program filters
//! ├── recorder.toml           optional recorder configuration
//! └── logs/                   rolling recorder logs
//! ```

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{FocusError, Result};

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "FOCUS_LOG_DIR";

const APP_DIR_NAME: &str = "FocusLog";
const FALLBACK_DIR_NAME: &str = ".focus-log";

/// Central configuration for all Focus Log storage paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the data root: `FOCUS_LOG_DIR`, then the per-user application
    /// data directory, then `~/.focus-log`.
    pub fn resolve() -> Result<Self> {
        if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(dir)));
        }
        if let Some(data_dir) = dirs::data_dir() {
            return Ok(Self::with_root(data_dir.join(APP_DIR_NAME)));
        }
        dirs::home_dir()
            .map(|home| Self::with_root(home.join(FALLBACK_DIR_NAME)))
            .ok_or(FocusError::DataDirNotFound)
    }

    /// Uses an explicit root directory. Used by `--data-dir` and by tests.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to focus_log.json (all recorded sessions).
    pub fn log_file(&self) -> PathBuf {
        self.root.join("focus_log.json")
    }

    /// Path to viewer_settings.json (program filters).
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("viewer_settings.json")
    }

    /// Path to recorder.toml (flush policy and tick interval).
    pub fn recorder_config_file(&self) -> PathBuf {
        self.root.join("recorder.toml")
    }

    /// Directory holding the recorder's rolling log files.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
