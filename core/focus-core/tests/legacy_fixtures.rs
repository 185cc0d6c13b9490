use focus_core::session::{load_from_file, SessionActivity, SessionStore};
use focus_core::timeline::{SessionView, Timeline};
use focus_core::{ApplicationFocusEvent, Session, Tab};
use fs_err as fs;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/logs")
        .join(name)
}

/// Copies a fixture into a temp dir so tests can write to it.
fn writable_fixture(name: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("focus_log.json");
    fs::copy(fixture_path(name), &path).unwrap();
    (dir, path)
}

#[test]
fn test_bare_window_title_becomes_first_title_change() {
    let sessions = load_from_file(&fixture_path("legacy-window-focus.json"));
    assert_eq!(sessions.len(), 1);

    let SessionActivity::WindowFocus(records) = &sessions[0].activity else {
        panic!("expected legacy schema");
    };
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title_changes.len(), 1);
    assert_eq!(records[0].title_changes[0].title, "todo.txt - Notepad");
    assert_eq!(records[0].title_changes[0].timestamp, 1699990000);
    assert_eq!(records[1].title_changes.len(), 2);
}

#[test]
fn test_legacy_session_renders_as_focus_spans() {
    let sessions = load_from_file(&fixture_path("legacy-window-focus.json"));
    let timeline = Timeline::build(&sessions, |_| false);

    let session = &timeline.days[0].sessions[0];
    assert_eq!(session.comment, "early build");
    assert_eq!(session.duration_secs(), Some(100));
    let SessionView::Focus(spans) = &session.view else {
        panic!("expected focus spans");
    };
    assert_eq!(spans[0].duration_secs, Some(40));
    assert_eq!(spans[1].duration_secs, Some(60));
}

#[test]
fn test_mixed_document_skips_unreadable_entries() {
    let sessions = load_from_file(&fixture_path("mixed.json"));
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].is_legacy());
    assert_eq!(sessions[1].application("code.exe").unwrap().total_time_spent_ms, 10_000);
}

#[test]
fn test_merge_leaves_legacy_and_foreign_entries_untouched() {
    let (_dir, path) = writable_fixture("mixed.json");
    let before: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    let store = SessionStore::new(&path);
    let session = Session {
        start_timestamp: 1700000000,
        end_timestamp: Some(1700000020),
        comment: "aggregated".to_string(),
        activity: SessionActivity::Applications(vec![ApplicationFocusEvent {
            process_name: "code.exe".to_string(),
            process_path: "C:\\Code\\code.exe".to_string(),
            first_focus_time: 1700000000,
            last_focus_time: 1700000020,
            total_time_spent_ms: 20_000,
            tabs: vec![Tab {
                window_title: "main.rs".to_string(),
                total_time_spent_ms: 20_000,
            }],
        }]),
    };
    store.merge(&session).unwrap();

    let after: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(after["version"], before["version"]);
    let (before_entries, after_entries) = (
        before["sessions"].as_array().unwrap(),
        after["sessions"].as_array().unwrap(),
    );
    assert_eq!(after_entries.len(), before_entries.len());
    assert_eq!(after_entries[0], before_entries[0]);
    assert_eq!(after_entries[2], before_entries[2]);
    assert_eq!(after_entries[3], before_entries[3]);
    assert_eq!(after_entries[1], serde_json::to_value(&session).unwrap());
}

#[test]
fn test_delete_by_start_keeps_other_entries() {
    let (_dir, path) = writable_fixture("mixed.json");
    let store = SessionStore::new(&path);

    assert!(store.delete_by_start(1699990000).unwrap());
    assert!(!store.delete_by_start(1699990000).unwrap());

    let after: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(after["sessions"].as_array().unwrap().len(), 3);
    let remaining = store.load();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].comment, "aggregated");
}
