//! Plain-text rendering of the timeline, session list and filters.

use focus_core::time_utils::{format_duration, format_duration_ms, format_time, format_timestamp};
use focus_core::timeline::{ApplicationRow, FocusSpan, SessionView, Timeline, TimelineSession};
use focus_core::{ProgramFilter, Session};
use std::fmt::Write;

const DURATION_WIDTH: usize = 8;

pub fn timeline(timeline: &Timeline) -> String {
    let mut out = String::new();
    if timeline.is_empty() {
        out.push_str("No sessions recorded yet. Run focus-recorder to start tracking.\n");
    }

    for day in &timeline.days {
        let _ = writeln!(out, "--- {} ---", day.heading);
        for session in &day.sessions {
            session_block(&mut out, session);
            out.push('\n');
        }
    }

    let totals = timeline.totals;
    let _ = writeln!(
        out,
        "Total: {} sessions | {} applications | {} tabs",
        totals.sessions, totals.applications, totals.tabs
    );
    out
}

pub fn session_header(session: &TimelineSession) -> String {
    let span = match session.duration_secs() {
        Some(duration) => format!(
            "{} - {}, {}",
            format_time(session.start_timestamp),
            format_time(session.end_timestamp.unwrap_or_default()),
            format_duration(duration)
        ),
        None => format!("{} - recording", format_time(session.start_timestamp)),
    };

    let mut header = format!("Session {}  ({})", session.number, span);
    if !session.comment.is_empty() {
        header.push_str(" - ");
        header.push_str(&session.comment);
    }
    header
}

fn session_block(out: &mut String, session: &TimelineSession) {
    let _ = writeln!(out, "{}", session_header(session));
    match &session.view {
        SessionView::Applications(rows) if rows.is_empty() => {
            out.push_str("  (no activity)\n");
        }
        SessionView::Applications(rows) => rows.iter().for_each(|row| application(out, row)),
        SessionView::Focus(spans) => spans.iter().for_each(|span| focus_span(out, span)),
    }
}

fn application(out: &mut String, row: &ApplicationRow) {
    let _ = writeln!(
        out,
        "  {} - {} ({:.1}%)  {} to {}",
        row.process_name,
        format_duration_ms(row.total_time_spent_ms),
        row.percentage,
        format_time(row.first_focus_time),
        format_time(row.last_focus_time)
    );
    if row.tabs.is_empty() {
        out.push_str("      No tabs recorded\n");
    }
    for tab in &row.tabs {
        let _ = writeln!(
            out,
            "    {:>width$} | {}",
            format_duration_ms(tab.total_time_spent_ms),
            tab.window_title,
            width = DURATION_WIDTH
        );
    }
}

fn focus_span(out: &mut String, span: &FocusSpan) {
    let duration = span
        .duration_secs
        .map(format_duration)
        .unwrap_or_else(|| "ongoing".to_string());
    let _ = writeln!(
        out,
        "  {}  {} ({})",
        format_time(span.focus_timestamp),
        span.process_name,
        duration
    );
    for change in &span.title_changes {
        let _ = writeln!(out, "      {}  {}", format_time(change.timestamp), change.title);
    }
}

/// One line per session, newest first.
pub fn session_list(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No sessions recorded yet.\n".to_string();
    }

    let mut out = String::new();
    for (index, session) in sessions.iter().enumerate().rev() {
        let duration = session
            .duration_secs()
            .map(format_duration)
            .unwrap_or_else(|| "recording".to_string());
        let activity = if session.is_legacy() {
            "legacy".to_string()
        } else {
            format!("{} apps", session.applications().len())
        };
        let _ = write!(
            out,
            "{:>3}  {}  {}  {:>9}  {}",
            index + 1,
            session.start_timestamp,
            format_timestamp(session.start_timestamp),
            duration,
            activity
        );
        if !session.comment.is_empty() {
            let _ = write!(out, "  {}", session.comment);
        }
        out.push('\n');
    }
    out
}

pub fn filter_list(filters: &[ProgramFilter]) -> String {
    if filters.is_empty() {
        return "No program filters.\n".to_string();
    }

    let mut out = String::new();
    for (index, filter) in filters.iter().enumerate() {
        let mark = if filter.enabled { "x" } else { " " };
        let _ = writeln!(out, "{:>3}  [{}] {}", index + 1, mark, filter.program_name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::{ApplicationFocusEvent, SessionActivity, Tab};

    const START: i64 = 1_700_000_000;

    fn sample_session(comment: &str) -> Session {
        Session {
            start_timestamp: START,
            end_timestamp: Some(START + 150),
            comment: comment.to_string(),
            activity: SessionActivity::Applications(vec![ApplicationFocusEvent {
                process_name: "code.exe".to_string(),
                process_path: "/code".to_string(),
                first_focus_time: START,
                last_focus_time: START + 150,
                total_time_spent_ms: 150_000,
                tabs: vec![
                    Tab {
                        window_title: "lib.rs".to_string(),
                        total_time_spent_ms: 30_000,
                    },
                    Tab {
                        window_title: "main.rs".to_string(),
                        total_time_spent_ms: 120_000,
                    },
                ],
            }]),
        }
    }

    #[test]
    fn test_session_header_format() {
        let built = Timeline::build(&[sample_session("deep work")], |_| false);
        let header = session_header(&built.days[0].sessions[0]);
        assert_eq!(
            header,
            format!(
                "Session 1  ({} - {}, 2m 30s) - deep work",
                format_time(START),
                format_time(START + 150)
            )
        );
    }

    #[test]
    fn test_open_session_header() {
        let mut session = sample_session("");
        session.end_timestamp = None;
        let built = Timeline::build(&[session], |_| false);
        assert_eq!(
            session_header(&built.days[0].sessions[0]),
            format!("Session 1  ({} - recording)", format_time(START))
        );
    }

    #[test]
    fn test_timeline_lists_tabs_longest_first_with_footer() {
        let built = Timeline::build(&[sample_session("")], |_| false);
        let text = timeline(&built);

        let main = text.find("  2m 0s | main.rs").unwrap();
        let lib = text.find("    30s | lib.rs").unwrap();
        assert!(main < lib);
        assert!(text.contains("code.exe - 2m 30s (100.0%)"));
        assert!(text.starts_with("--- "));
        assert!(text.ends_with("Total: 1 sessions | 1 applications | 2 tabs\n"));
    }

    #[test]
    fn test_hidden_application_leaves_placeholder() {
        let built = Timeline::build(&[sample_session("")], |name| name == "code.exe");
        let text = timeline(&built);
        assert!(!text.contains("code.exe"));
        assert!(text.contains("(no activity)"));
    }

    #[test]
    fn test_session_list_newest_first() {
        let mut later = sample_session("later");
        later.start_timestamp = START + 1000;
        later.end_timestamp = None;
        let text = session_list(&[sample_session("earlier"), later]);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  2  1700001000"));
        assert!(lines[0].contains("recording"));
        assert!(lines[1].ends_with("1 apps  earlier"));
    }

    #[test]
    fn test_filter_list_marks_enabled() {
        let filters = vec![
            ProgramFilter {
                program_name: "a.exe".to_string(),
                enabled: true,
            },
            ProgramFilter {
                program_name: "b.exe".to_string(),
                enabled: false,
            },
        ];
        assert_eq!(filter_list(&filters), "  1  [x] a.exe\n  2  [ ] b.exe\n");
        assert_eq!(filter_list(&[]), "No program filters.\n");
    }
}
