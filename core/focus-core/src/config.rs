//! Recorder configuration (`recorder.toml`).
//!
//! ```toml
//! [flush]
//! policy = "threshold"      # or "every_event" (default)
//! max_events = 10
//! max_interval_secs = 30
//!
//! [recorder]
//! tick_interval_ms = 1000
//! ```
//!
//! A missing file means defaults. Every field is optional.

use fs_err as fs;
use serde::Deserialize;
use std::path::Path;

use crate::error::{FocusError, Result};

const DEFAULT_MAX_EVENTS: u32 = 10;
const DEFAULT_MAX_INTERVAL_SECS: u64 = 30;
const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// When the aggregator persists the open session.
///
/// The final flush on stop happens under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Flush after every event that changed the session.
    #[default]
    EveryEvent,
    /// Flush once `max_events` changes accumulated or `max_interval_secs`
    /// passed since the last flush, whichever comes first.
    Threshold {
        max_events: u32,
        max_interval_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    #[default]
    EveryEvent,
    Threshold,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlushConfig {
    pub policy: FlushMode,
    pub max_events: u32,
    pub max_interval_secs: u64,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            policy: FlushMode::EveryEvent,
            max_events: DEFAULT_MAX_EVENTS,
            max_interval_secs: DEFAULT_MAX_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecorderSection {
    /// How often the recorder wakes without events to run time-based flushes.
    pub tick_interval_ms: u64,
}

impl Default for RecorderSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RecorderConfig {
    pub flush: FlushConfig,
    pub recorder: RecorderSection,
}

impl RecorderConfig {
    pub fn flush_policy(&self) -> FlushPolicy {
        match self.flush.policy {
            FlushMode::EveryEvent => FlushPolicy::EveryEvent,
            FlushMode::Threshold => FlushPolicy::Threshold {
                max_events: self.flush.max_events.max(1),
                max_interval_secs: self.flush.max_interval_secs,
            },
        }
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.recorder.tick_interval_ms.max(1)
    }
}

/// Loads the recorder configuration, returning defaults if the file doesn't exist.
pub fn load_recorder_config(path: &Path) -> Result<RecorderConfig> {
    if !path.exists() {
        return Ok(RecorderConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|err| FocusError::io(format!("reading {}", path.display()), err))?;
    toml::from_str::<RecorderConfig>(&content).map_err(|err| FocusError::Config {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}
