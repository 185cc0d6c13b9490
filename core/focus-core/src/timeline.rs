//! Display model for the session timeline.
//!
//! Groups sessions under local-date headings and prepares each one for
//! rendering: aggregated sessions become per-application rows with tabs
//! sorted by dwell time, legacy sessions become chronological focus spans.
//! Hidden programs are dropped from the rows; totals always count everything
//! that was loaded.

use crate::session::{
    ApplicationFocusEvent, FocusRecord, Session, SessionActivity, Tab, TitleRecord,
};
use crate::time_utils::{format_date, format_date_with_day};

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub days: Vec<TimelineDay>,
    pub totals: TimelineTotals,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDay {
    /// `YYYY-MM-DD`, local time.
    pub date: String,
    /// e.g. `Saturday, March 09, 2024`.
    pub heading: String,
    pub sessions: Vec<TimelineSession>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSession {
    /// 1-based position in the session document.
    pub number: usize,
    pub start_timestamp: i64,
    pub end_timestamp: Option<i64>,
    pub comment: String,
    pub view: SessionView,
}

impl TimelineSession {
    pub fn duration_secs(&self) -> Option<i64> {
        self.end_timestamp
            .map(|end| end.saturating_sub(self.start_timestamp).max(0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionView {
    Applications(Vec<ApplicationRow>),
    Focus(Vec<FocusSpan>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRow {
    pub process_name: String,
    pub process_path: String,
    pub total_time_spent_ms: u64,
    /// Share of the whole session's dwell time, `0.0..=100.0`.
    pub percentage: f64,
    pub first_focus_time: i64,
    pub last_focus_time: i64,
    /// Longest first.
    pub tabs: Vec<Tab>,
}

/// One contiguous focus span from a legacy session.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusSpan {
    pub process_name: String,
    pub process_path: String,
    pub focus_timestamp: i64,
    /// Until the next span or the session end; `None` for the last span of an
    /// open session.
    pub duration_secs: Option<i64>,
    pub title_changes: Vec<TitleRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineTotals {
    pub sessions: usize,
    pub applications: usize,
    pub tabs: usize,
}

impl Timeline {
    /// Builds the timeline in document order. `is_hidden` decides which
    /// programs are left out of the per-session rows.
    pub fn build(sessions: &[Session], is_hidden: impl Fn(&str) -> bool) -> Self {
        let mut days: Vec<TimelineDay> = Vec::new();

        for (index, session) in sessions.iter().enumerate() {
            let entry = TimelineSession {
                number: index + 1,
                start_timestamp: session.start_timestamp,
                end_timestamp: session.end_timestamp,
                comment: session.comment.clone(),
                view: session_view(session, &is_hidden),
            };

            let date = format_date(session.start_timestamp);
            match days.last_mut() {
                Some(day) if day.date == date => day.sessions.push(entry),
                _ => days.push(TimelineDay {
                    date,
                    heading: format_date_with_day(session.start_timestamp),
                    sessions: vec![entry],
                }),
            }
        }

        Self {
            days,
            totals: totals(sessions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

fn session_view(session: &Session, is_hidden: &impl Fn(&str) -> bool) -> SessionView {
    match &session.activity {
        SessionActivity::Applications(apps) => {
            SessionView::Applications(application_rows(apps, is_hidden))
        }
        SessionActivity::WindowFocus(records) => {
            SessionView::Focus(focus_spans(records, session.end_timestamp, is_hidden))
        }
    }
}

fn application_rows(
    apps: &[ApplicationFocusEvent],
    is_hidden: &impl Fn(&str) -> bool,
) -> Vec<ApplicationRow> {
    let session_total = apps
        .iter()
        .fold(0u64, |total, app| total.saturating_add(app.total_time_spent_ms));

    let mut rows: Vec<ApplicationRow> = apps
        .iter()
        .filter(|app| !is_hidden(&app.process_name))
        .map(|app| {
            let mut tabs = app.tabs.clone();
            tabs.sort_by(|a, b| b.total_time_spent_ms.cmp(&a.total_time_spent_ms));
            ApplicationRow {
                process_name: app.process_name.clone(),
                process_path: app.process_path.clone(),
                total_time_spent_ms: app.total_time_spent_ms,
                percentage: percentage(app.total_time_spent_ms, session_total),
                first_focus_time: app.first_focus_time,
                last_focus_time: app.last_focus_time,
                tabs,
            }
        })
        .collect();

    // Stable: equal totals keep first-focus order.
    rows.sort_by(|a, b| b.total_time_spent_ms.cmp(&a.total_time_spent_ms));
    rows
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / whole as f64).min(100.0)
}

fn focus_spans(
    records: &[FocusRecord],
    session_end: Option<i64>,
    is_hidden: &impl Fn(&str) -> bool,
) -> Vec<FocusSpan> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| !is_hidden(&record.process_name))
        .map(|(index, record)| {
            let span_end = records
                .get(index + 1)
                .map(|next| next.focus_timestamp)
                .or(session_end);
            FocusSpan {
                process_name: record.process_name.clone(),
                process_path: record.process_path.clone(),
                focus_timestamp: record.focus_timestamp,
                duration_secs: span_end
                    .map(|end| end.saturating_sub(record.focus_timestamp).max(0)),
                title_changes: record.title_changes.clone(),
            }
        })
        .collect()
}

fn totals(sessions: &[Session]) -> TimelineTotals {
    let mut totals = TimelineTotals {
        sessions: sessions.len(),
        ..TimelineTotals::default()
    };
    for session in sessions {
        match &session.activity {
            SessionActivity::Applications(apps) => {
                totals.applications += apps.len();
                totals.tabs += apps.iter().map(|app| app.tabs.len()).sum::<usize>();
            }
            SessionActivity::WindowFocus(records) => {
                totals.applications += records.len();
                totals.tabs += records
                    .iter()
                    .map(|record| record.title_changes.len())
                    .sum::<usize>();
            }
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, tabs: &[(&str, u64)]) -> ApplicationFocusEvent {
        ApplicationFocusEvent {
            process_name: name.to_string(),
            process_path: format!("/bin/{name}"),
            first_focus_time: 100,
            last_focus_time: 200,
            total_time_spent_ms: tabs.iter().map(|(_, ms)| ms).sum(),
            tabs: tabs
                .iter()
                .map(|(title, ms)| Tab {
                    window_title: title.to_string(),
                    total_time_spent_ms: *ms,
                })
                .collect(),
        }
    }

    fn aggregated(start: i64, apps: Vec<ApplicationFocusEvent>) -> Session {
        Session {
            start_timestamp: start,
            end_timestamp: Some(start + 60),
            comment: String::new(),
            activity: SessionActivity::Applications(apps),
        }
    }

    fn record(name: &str, at: i64, titles: &[&str]) -> FocusRecord {
        FocusRecord {
            focus_timestamp: at,
            process_name: name.to_string(),
            process_path: String::new(),
            title_changes: titles
                .iter()
                .map(|title| TitleRecord {
                    timestamp: at,
                    title: title.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_rows_sorted_with_percentages() {
        let session = aggregated(
            1_700_000_000,
            vec![
                app("small", &[("s", 1000)]),
                app("big", &[("short", 1000), ("long", 2000)]),
            ],
        );
        let timeline = Timeline::build(&[session], |_| false);

        let SessionView::Applications(rows) = &timeline.days[0].sessions[0].view else {
            panic!("expected aggregated view");
        };
        assert_eq!(rows[0].process_name, "big");
        assert!((rows[0].percentage - 75.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].tabs[0].window_title, "long");
        assert_eq!(rows[1].process_name, "small");
        assert!((rows[1].percentage - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hidden_programs_are_skipped_but_counted() {
        let session = aggregated(
            1_700_000_000,
            vec![app("explorer", &[("x", 1000)]), app("code", &[("y", 3000)])],
        );
        let timeline = Timeline::build(&[session], |name| name == "explorer");

        let SessionView::Applications(rows) = &timeline.days[0].sessions[0].view else {
            panic!("expected aggregated view");
        };
        assert_eq!(rows.len(), 1);
        assert!((rows[0].percentage - 75.0).abs() < f64::EPSILON);
        assert_eq!(
            timeline.totals,
            TimelineTotals {
                sessions: 1,
                applications: 2,
                tabs: 2
            }
        );
    }

    #[test]
    fn test_sessions_grouped_by_day() {
        let first = 1_700_000_000;
        let sessions = vec![
            aggregated(first, vec![]),
            aggregated(first + 60, vec![]),
            aggregated(first + 3 * 86_400, vec![]),
        ];
        let timeline = Timeline::build(&sessions, |_| false);

        assert_eq!(timeline.days.len(), 2);
        assert_eq!(timeline.days[0].sessions.len(), 2);
        assert_eq!(timeline.days[1].sessions[0].number, 3);
        assert_eq!(timeline.days[0].date, format_date(first));
    }

    #[test]
    fn test_legacy_spans_measured_to_next_span() {
        let session = Session {
            start_timestamp: 1000,
            end_timestamp: Some(1030),
            comment: "old".to_string(),
            activity: SessionActivity::WindowFocus(vec![
                record("a", 1000, &["one", "two"]),
                record("b", 1010, &["three"]),
            ]),
        };
        let timeline = Timeline::build(std::slice::from_ref(&session), |_| false);

        let SessionView::Focus(spans) = &timeline.days[0].sessions[0].view else {
            panic!("expected focus spans");
        };
        assert_eq!(spans[0].duration_secs, Some(10));
        assert_eq!(spans[1].duration_secs, Some(20));
        assert_eq!(timeline.totals.tabs, 3);

        let open = Session {
            end_timestamp: None,
            ..session
        };
        let timeline = Timeline::build(&[open], |_| false);
        let SessionView::Focus(spans) = &timeline.days[0].sessions[0].view else {
            panic!("expected focus spans");
        };
        assert_eq!(spans[1].duration_secs, None);
        assert_eq!(timeline.days[0].sessions[0].duration_secs(), None);
    }

    #[test]
    fn test_empty_session_has_zero_percentages() {
        let session = aggregated(1_700_000_000, vec![app("idle", &[])]);
        let timeline = Timeline::build(&[session], |_| false);
        let SessionView::Applications(rows) = &timeline.days[0].sessions[0].view else {
            panic!("expected aggregated view");
        };
        assert_eq!(rows[0].percentage, 0.0);
        assert!(Timeline::build(&[], |_| false).is_empty());
    }

    #[test]
    fn test_huge_totals_saturate_instead_of_overflowing() {
        let mut huge = app("huge", &[]);
        huge.total_time_spent_ms = u64::MAX;
        let mut small = app("small", &[]);
        small.total_time_spent_ms = 5;
        let session = aggregated(1_700_000_000, vec![huge, small]);
        assert_eq!(session.total_time_spent_ms(), u64::MAX);

        let timeline = Timeline::build(&[session], |_| false);
        let SessionView::Applications(rows) = &timeline.days[0].sessions[0].view else {
            panic!("expected aggregated view");
        };
        assert_eq!(rows[0].process_name, "huge");
        for row in rows {
            assert!((0.0..=100.0).contains(&row.percentage));
        }
    }
}
