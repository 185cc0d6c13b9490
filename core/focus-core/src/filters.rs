//! Program filters for the viewer (`viewer_settings.json`).
//!
//! An enabled filter hides that program from the timeline. Every mutation
//! saves immediately; an unreadable settings file just means no filters.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{FocusError, Result};
use crate::session::store::write_json_atomic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramFilter {
    #[serde(default)]
    pub program_name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ViewerSettings {
    #[serde(default)]
    program_filters: Vec<ProgramFilter>,
}

#[derive(Debug)]
pub struct FilterManager {
    path: PathBuf,
    filters: Vec<ProgramFilter>,
}

impl FilterManager {
    /// Loads the filters stored at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filters = read_filters(&path);
        Self { path, filters }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filters(&self) -> &[ProgramFilter] {
        &self.filters
    }

    /// Adds a filter. Returns false for an empty or already-listed name.
    pub fn add(&mut self, program_name: &str, enabled: bool) -> Result<bool> {
        if program_name.is_empty()
            || self
                .filters
                .iter()
                .any(|filter| filter.program_name == program_name)
        {
            return Ok(false);
        }

        self.filters.push(ProgramFilter {
            program_name: program_name.to_string(),
            enabled,
        });
        self.save()?;
        Ok(true)
    }

    /// Returns false if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Result<bool> {
        if index >= self.filters.len() {
            return Ok(false);
        }
        self.filters.remove(index);
        self.save()?;
        Ok(true)
    }

    /// Flips `enabled` on the filter at `index`. Returns false if out of range.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let Some(filter) = self.filters.get_mut(index) else {
            return Ok(false);
        };
        filter.enabled = !filter.enabled;
        self.save()?;
        Ok(true)
    }

    pub fn is_filtered(&self, program_name: &str) -> bool {
        self.filters
            .iter()
            .any(|filter| filter.enabled && filter.program_name == program_name)
    }

    pub fn save(&self) -> Result<()> {
        let settings = ViewerSettings {
            program_filters: self.filters.clone(),
        };
        let document = serde_json::to_value(&settings)
            .map_err(|err| FocusError::json("serializing viewer settings", err))?;
        write_json_atomic(&self.path, &document)
    }
}

fn read_filters(path: &Path) -> Vec<ProgramFilter> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    match serde_json::from_str::<ViewerSettings>(&content) {
        Ok(settings) => settings
            .program_filters
            .into_iter()
            .filter(|filter| !filter.program_name.is_empty())
            .collect(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable viewer settings");
            Vec::new()
        }
    }
}
