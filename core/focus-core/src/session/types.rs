//! Persisted session types.
//!
//! Two schemas share the `sessions` array:
//!
//! - **Aggregated** (`applications`): one entry per process with summed dwell
//!   time and a per-title breakdown. This is what the recorder writes.
//! - **Legacy** (`window_focus`): a chronological log of focus spans, each with
//!   its title changes. Still readable, never converted.
//!
//! Missing fields and explicit `null`s load as defaults so a partially written
//! or hand-edited entry stays usable.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Deserializes `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accumulated time spent under one window title within one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default, deserialize_with = "null_as_default")]
    pub window_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_time_spent_ms: u64,
}

/// One process observed during a session, with its summed dwell time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFocusEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub process_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub process_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_focus_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_focus_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_time_spent_ms: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tabs: Vec<Tab>,
}

impl ApplicationFocusEvent {
    pub fn tab(&self, window_title: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.window_title == window_title)
    }
}

/// A title observed at one instant inside a legacy focus span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    #[serde(
        rename = "title_timestamp",
        default,
        deserialize_with = "null_as_default"
    )]
    pub timestamp: i64,
    #[serde(rename = "window_title", default, deserialize_with = "null_as_default")]
    pub title: String,
}

/// One contiguous span during which a process held focus (legacy schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFocusRecord")]
pub struct FocusRecord {
    pub focus_timestamp: i64,
    pub process_name: String,
    pub process_path: String,
    pub title_changes: Vec<TitleRecord>,
}

/// On-disk shape of a focus span, including the pre-`title_changes` field.
#[derive(Deserialize)]
struct RawFocusRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    focus_timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    process_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    process_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    title_changes: Vec<TitleRecord>,
    #[serde(default)]
    window_title: Option<String>,
}

impl From<RawFocusRecord> for FocusRecord {
    fn from(raw: RawFocusRecord) -> Self {
        let mut title_changes = raw.title_changes;
        // Oldest files stored a single title on the span itself.
        if let Some(title) = raw.window_title.filter(|title| !title.is_empty()) {
            if title_changes.is_empty() {
                title_changes.push(TitleRecord {
                    timestamp: raw.focus_timestamp,
                    title,
                });
            }
        }
        FocusRecord {
            focus_timestamp: raw.focus_timestamp,
            process_name: raw.process_name,
            process_path: raw.process_path,
            title_changes,
        }
    }
}

/// What a session recorded, in whichever schema its entry uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionActivity {
    Applications(Vec<ApplicationFocusEvent>),
    WindowFocus(Vec<FocusRecord>),
}

impl Default for SessionActivity {
    fn default() -> Self {
        SessionActivity::Applications(Vec::new())
    }
}

/// One recording span, keyed by `start_timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "RawSession")]
pub struct Session {
    pub start_timestamp: i64,
    /// `None` while the session is still being recorded.
    pub end_timestamp: Option<i64>,
    pub comment: String,
    pub activity: SessionActivity,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.end_timestamp.is_none()
    }

    /// Wall-clock length in seconds, if the session has ended.
    pub fn duration_secs(&self) -> Option<i64> {
        self.end_timestamp
            .map(|end| end.saturating_sub(self.start_timestamp).max(0))
    }

    /// Aggregated applications; empty for legacy sessions.
    pub fn applications(&self) -> &[ApplicationFocusEvent] {
        match &self.activity {
            SessionActivity::Applications(apps) => apps,
            SessionActivity::WindowFocus(_) => &[],
        }
    }

    pub fn application(&self, process_name: &str) -> Option<&ApplicationFocusEvent> {
        self.applications()
            .iter()
            .find(|app| app.process_name == process_name)
    }

    /// Sum of every application's dwell time (aggregated schema only).
    pub fn total_time_spent_ms(&self) -> u64 {
        self.applications()
            .iter()
            .fold(0u64, |total, app| total.saturating_add(app.total_time_spent_ms))
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self.activity, SessionActivity::WindowFocus(_))
    }
}

impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Session", 4)?;
        state.serialize_field("start_timestamp", &self.start_timestamp)?;
        state.serialize_field("end_timestamp", &self.end_timestamp)?;
        state.serialize_field("comment", &self.comment)?;
        match &self.activity {
            SessionActivity::Applications(apps) => state.serialize_field("applications", apps)?,
            SessionActivity::WindowFocus(focus) => state.serialize_field("window_focus", focus)?,
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default, deserialize_with = "null_as_default")]
    start_timestamp: i64,
    #[serde(default)]
    end_timestamp: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    comment: String,
    #[serde(default)]
    applications: Option<Vec<ApplicationFocusEvent>>,
    #[serde(default)]
    window_focus: Option<Vec<FocusRecord>>,
}

impl From<RawSession> for Session {
    fn from(raw: RawSession) -> Self {
        let activity = match (raw.applications, raw.window_focus) {
            (Some(apps), _) => SessionActivity::Applications(apps),
            (None, Some(focus)) => SessionActivity::WindowFocus(focus),
            (None, None) => SessionActivity::default(),
        };
        Session {
            start_timestamp: raw.start_timestamp,
            end_timestamp: raw.end_timestamp,
            comment: raw.comment,
            activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_session_serializes_null_end() {
        let session = Session {
            start_timestamp: 100,
            end_timestamp: None,
            comment: "writing".to_string(),
            activity: SessionActivity::Applications(vec![]),
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            json!({
                "start_timestamp": 100,
                "end_timestamp": null,
                "comment": "writing",
                "applications": []
            })
        );
    }

    #[test]
    fn test_legacy_session_keeps_window_focus_schema() {
        let value = json!({
            "start_timestamp": 10,
            "end_timestamp": 20,
            "window_focus": [{
                "focus_timestamp": 11,
                "process_name": "code.exe",
                "process_path": "C:\\code.exe",
                "title_changes": [{"title_timestamp": 11, "window_title": "main.rs"}]
            }]
        });
        let session: Session = serde_json::from_value(value).unwrap();
        assert!(session.is_legacy());
        assert!(session.applications().is_empty());
        assert_eq!(session.comment, "");

        let written = serde_json::to_value(&session).unwrap();
        assert!(written.get("window_focus").is_some());
        assert!(written.get("applications").is_none());
    }

    #[test]
    fn test_bare_window_title_becomes_first_title_change() {
        let record: FocusRecord = serde_json::from_value(json!({
            "focus_timestamp": 42,
            "process_name": "notepad.exe",
            "window_title": "notes.txt",
            "title_changes": []
        }))
        .unwrap();
        assert_eq!(
            record.title_changes,
            vec![TitleRecord {
                timestamp: 42,
                title: "notes.txt".to_string()
            }]
        );
    }

    #[test]
    fn test_bare_window_title_ignored_when_title_changes_exist() {
        let record: FocusRecord = serde_json::from_value(json!({
            "focus_timestamp": 42,
            "window_title": "old",
            "title_changes": [{"title_timestamp": 43, "window_title": "new"}]
        }))
        .unwrap();
        assert_eq!(record.title_changes.len(), 1);
        assert_eq!(record.title_changes[0].title, "new");
    }

    #[test]
    fn test_nulls_load_as_defaults() {
        let session: Session = serde_json::from_value(json!({
            "start_timestamp": 5,
            "end_timestamp": null,
            "comment": null,
            "applications": [{"process_name": "a", "tabs": null}]
        }))
        .unwrap();
        assert!(session.is_open());
        assert_eq!(session.comment, "");
        assert_eq!(session.applications()[0].tabs, vec![]);
    }

    #[test]
    fn test_duration_and_totals() {
        let session = Session {
            start_timestamp: 100,
            end_timestamp: Some(160),
            comment: String::new(),
            activity: SessionActivity::Applications(vec![
                ApplicationFocusEvent {
                    process_name: "a".to_string(),
                    process_path: "/a".to_string(),
                    first_focus_time: 100,
                    last_focus_time: 130,
                    total_time_spent_ms: 30_000,
                    tabs: vec![],
                },
                ApplicationFocusEvent {
                    process_name: "b".to_string(),
                    process_path: "/b".to_string(),
                    first_focus_time: 130,
                    last_focus_time: 160,
                    total_time_spent_ms: 30_000,
                    tabs: vec![],
                },
            ]),
        };
        assert_eq!(session.duration_secs(), Some(60));
        assert_eq!(session.total_time_spent_ms(), 60_000);
        assert!(session.application("b").is_some());
    }
}
