//! File-backed session document (`focus_log.json`).
//!
//! # File Format
//!
//! ```json
//! {
//!   "sessions": [
//!     { "start_timestamp": 1700000000, "end_timestamp": null, "comment": "", "applications": [ ... ] }
//!   ]
//! }
//! ```
//!
//! # Lenient Reads
//!
//! The recorder rewrites this file while the viewer may be reading it, and
//! users occasionally edit it by hand. Reads therefore never fail:
//! - Missing or unreadable file → empty list
//! - Empty file or corrupt JSON → empty list (logged)
//! - One unparsable session entry → that entry skipped (logged)
//!
//! # Merge
//!
//! [`SessionStore::merge`] is the single read-modify-write path used by every
//! flush. It works on raw JSON entries, so sessions written by other tools or
//! in the legacy schema pass through untouched. The entry whose
//! `start_timestamp` matches is replaced in place, otherwise the session is
//! appended.
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a reader never sees a half-written document.

use fs_err as fs;
use serde_json::{Map, Value};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{FocusError, Result};

use super::types::Session;

const SESSIONS_KEY: &str = "sessions";
const START_KEY: &str = "start_timestamp";

/// Result of merging one session into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// An entry with the same `start_timestamp` was overwritten.
    Replaced,
    /// No entry matched; the session was appended.
    Appended,
}

/// Handle on the session document at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<Session> {
        load_from_file(&self.path)
    }

    /// Writes `session` into the document, replacing any entry with the same
    /// `start_timestamp`. Flushing the same session twice yields the same file.
    pub fn merge(&self, session: &Session) -> Result<MergeOutcome> {
        let fresh = serde_json::to_value(session)
            .map_err(|err| FocusError::json("serializing session", err))?;

        let mut document = read_document(&self.path);
        let mut sessions = take_sessions(&mut document);

        let existing = sessions
            .iter()
            .position(|entry| entry_start(entry) == Some(session.start_timestamp));
        let outcome = match existing {
            Some(index) => {
                sessions[index] = fresh;
                MergeOutcome::Replaced
            }
            None => {
                sessions.push(fresh);
                MergeOutcome::Appended
            }
        };

        document.insert(SESSIONS_KEY.to_string(), Value::Array(sessions));
        write_json_atomic(&self.path, &Value::Object(document))?;
        debug!(
            path = %self.path.display(),
            start_timestamp = session.start_timestamp,
            outcome = ?outcome,
            "Session merged"
        );
        Ok(outcome)
    }

    /// Removes the entry with `start_timestamp` from the document.
    ///
    /// Returns `Ok(false)` when no entry matched (including a missing file),
    /// in which case nothing is written.
    pub fn delete_by_start(&self, start_timestamp: i64) -> Result<bool> {
        let mut document = read_document(&self.path);
        let mut sessions = take_sessions(&mut document);

        let before = sessions.len();
        sessions.retain(|entry| entry_start(entry) != Some(start_timestamp));
        if sessions.len() == before {
            return Ok(false);
        }

        document.insert(SESSIONS_KEY.to_string(), Value::Array(sessions));
        write_json_atomic(&self.path, &Value::Object(document))?;
        Ok(true)
    }

    pub fn save(&self, sessions: &[Session]) -> Result<()> {
        save_to_file(&self.path, sessions)
    }
}

/// Loads every readable session from `path`. Never fails.
pub fn load_from_file(path: &Path) -> Vec<Session> {
    let document = read_document(path);
    let Some(Value::Array(entries)) = document.get(SESSIONS_KEY) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(
            |(index, entry)| match serde_json::from_value::<Session>(entry.clone()) {
                Ok(session) => Some(session),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        index,
                        error = %err,
                        "Skipping unreadable session entry"
                    );
                    None
                }
            },
        )
        .collect()
}

/// Writes `sessions` as the whole document, each in the schema it uses.
pub fn save_to_file(path: &Path, sessions: &[Session]) -> Result<()> {
    let entries = sessions
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| FocusError::json("serializing sessions", err))?;

    let mut document = Map::new();
    document.insert(SESSIONS_KEY.to_string(), Value::Array(entries));
    write_json_atomic(path, &Value::Object(document))
}

/// Removes the session at `index` in memory. Callers re-save afterwards.
pub fn delete_session(sessions: &mut Vec<Session>, index: usize) -> bool {
    if index >= sessions.len() {
        return false;
    }
    sessions.remove(index);
    true
}

/// Removes the session starting at `start_timestamp` from the file at `path`.
pub fn delete_session_by_start(path: &Path, start_timestamp: i64) -> Result<bool> {
    SessionStore::new(path).delete_by_start(start_timestamp)
}

fn entry_start(entry: &Value) -> Option<i64> {
    entry.get(START_KEY).and_then(Value::as_i64)
}

/// Takes the `sessions` array out of the document, leaving its slot in place.
fn take_sessions(document: &mut Map<String, Value>) -> Vec<Value> {
    match document.get_mut(SESSIONS_KEY).map(Value::take) {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!("Session document has a non-array `sessions` field; starting a fresh list");
            Vec::new()
        }
    }
}

/// Reads the document as a JSON object, degrading to `{}` on any problem.
fn read_document(path: &Path) -> Map<String, Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Map::new(),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Failed to read session log, treating as empty"
            );
            return Map::new();
        }
    };

    if content.trim().is_empty() {
        return Map::new();
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(document)) => document,
        Ok(_) => {
            warn!(path = %path.display(), "Session log is not a JSON object, treating as empty");
            Map::new()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Failed to parse session log, treating as empty"
            );
            Map::new()
        }
    }
}

/// Pretty-prints `document` to `path` through a sibling temp file and rename.
pub(crate) fn write_json_atomic(path: &Path, document: &Value) -> Result<()> {
    let mut content = serde_json::to_string_pretty(document)
        .map_err(|err| FocusError::json(format!("serializing {}", path.display()), err))?;
    content.push('\n');

    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => return Err(FocusError::InvalidLogPath(path.to_path_buf())),
    };
    fs::create_dir_all(parent_dir).map_err(|err| {
        FocusError::io(format!("creating directory {}", parent_dir.display()), err)
    })?;

    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .map_err(|err| FocusError::io("creating temp file", err))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|err| FocusError::io("writing temp file", err))?;
    temp_file
        .flush()
        .map_err(|err| FocusError::io("flushing temp file", err))?;
    temp_file
        .persist(path)
        .map_err(|err| FocusError::io(format!("replacing {}", path.display()), err.error))?;

    Ok(())
}
