//! Incremental session aggregation.
//!
//! Turns the focus/title event stream into per-application and per-title dwell
//! totals for the open session, and persists them through
//! [`SessionStore::merge`].
//!
//! ```text
//!            start_session            stop_session
//!   Idle ───────────────────▶ Recording ───────────────▶ Idle
//!                               │  ▲
//!        focus/title change ────┘  └── finalize previous span, flush per policy
//! ```
//!
//! The in-memory accumulators are the source of truth while recording. Each
//! flush serializes the whole session afresh and merges it into the document
//! by `start_timestamp`; nothing is cleared afterwards.
//!
//! Timestamps are whole seconds, so dwell time is `seconds * 1000` and carries
//! no sub-second precision.

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::FlushPolicy;
use crate::error::Result;
use crate::events::FocusEvent;
use crate::session::{ApplicationFocusEvent, Session, SessionActivity, SessionStore, Tab};

/// What currently holds focus and since when.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CurrentFocus {
    process_name: String,
    process_path: String,
    window_title: String,
    focus_start_time: i64,
}

#[derive(Debug)]
struct ActiveSession {
    start_timestamp: i64,
    comment: String,
    /// First-seen order, keyed by `process_name`.
    applications: Vec<ApplicationFocusEvent>,
    current: Option<CurrentFocus>,
    events_since_flush: u32,
    last_flush_at: i64,
}

impl ActiveSession {
    fn new(start_timestamp: i64, comment: &str) -> Self {
        Self {
            start_timestamp,
            comment: comment.to_string(),
            applications: Vec::new(),
            current: None,
            events_since_flush: 0,
            last_flush_at: start_timestamp,
        }
    }

    /// Commits the time since the current span began to its app and title.
    fn finalize(&mut self, at: i64) {
        let Some(current) = self.current.as_mut() else {
            return;
        };

        let elapsed_secs = at.saturating_sub(current.focus_start_time).max(0);
        let elapsed_ms = u64::try_from(elapsed_secs)
            .unwrap_or(0)
            .saturating_mul(1000);

        let index = match self
            .applications
            .iter()
            .position(|app| app.process_name == current.process_name)
        {
            Some(index) => index,
            None => {
                self.applications.push(ApplicationFocusEvent {
                    process_name: current.process_name.clone(),
                    process_path: current.process_path.clone(),
                    first_focus_time: current.focus_start_time,
                    last_focus_time: current.focus_start_time,
                    total_time_spent_ms: 0,
                    tabs: Vec::new(),
                });
                self.applications.len() - 1
            }
        };
        let app = &mut self.applications[index];

        app.total_time_spent_ms = app.total_time_spent_ms.saturating_add(elapsed_ms);
        app.last_focus_time = at.max(app.last_focus_time);
        match app
            .tabs
            .iter_mut()
            .find(|tab| tab.window_title == current.window_title)
        {
            Some(tab) => {
                tab.total_time_spent_ms = tab.total_time_spent_ms.saturating_add(elapsed_ms)
            }
            None => app.tabs.push(Tab {
                window_title: current.window_title.clone(),
                total_time_spent_ms: elapsed_ms,
            }),
        }

        // The committed stretch must never be counted again.
        current.focus_start_time = at.max(current.focus_start_time);
    }

    /// Where a span beginning at `at` starts, never before already committed time.
    fn span_start(&self, at: i64) -> i64 {
        self.current
            .as_ref()
            .map_or(at, |current| at.max(current.focus_start_time))
    }

    fn to_session(&self, end_timestamp: Option<i64>) -> Session {
        Session {
            start_timestamp: self.start_timestamp,
            end_timestamp,
            comment: self.comment.clone(),
            activity: SessionActivity::Applications(self.applications.clone()),
        }
    }
}

/// Owns the open session and decides when it reaches disk.
///
/// Not thread-safe: the recorder keeps it on a single worker thread.
pub struct SessionAggregator<C: Clock = SystemClock> {
    store: SessionStore,
    clock: C,
    policy: FlushPolicy,
    active: Option<ActiveSession>,
    /// A stopped session whose final write failed.
    unsaved: Option<Session>,
}

impl SessionAggregator<SystemClock> {
    pub fn new(store: SessionStore, policy: FlushPolicy) -> Self {
        Self::with_clock(store, policy, SystemClock)
    }
}

impl<C: Clock> SessionAggregator<C> {
    pub fn with_clock(store: SessionStore, policy: FlushPolicy, clock: C) -> Self {
        Self {
            store,
            clock,
            policy,
            active: None,
            unsaved: None,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn is_session_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn session_start(&self) -> Option<i64> {
        self.active.as_ref().map(|session| session.start_timestamp)
    }

    /// Opens a new session. Returns false, changing nothing, if one is open.
    ///
    /// Nothing is written until the first flush.
    pub fn start_session(&mut self, comment: &str) -> bool {
        if let Some(active) = &self.active {
            debug!(
                start_timestamp = active.start_timestamp,
                "Session already active; start ignored"
            );
            return false;
        }

        let start_timestamp = self.clock.now();
        self.active = Some(ActiveSession::new(start_timestamp, comment));
        info!(start_timestamp, comment = %comment, "Session started");
        true
    }

    /// Drops the open session without finalizing or writing it.
    pub(crate) fn discard_session(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(start_timestamp = active.start_timestamp, "Session discarded");
        }
    }

    pub fn apply(&mut self, event: &FocusEvent) -> Result<()> {
        match event {
            FocusEvent::FocusChanged {
                process_name,
                process_path,
                window_title,
                at,
            } => self.on_focus_changed(process_name, process_path, window_title, *at),
            FocusEvent::TitleChanged { window_title, at } => {
                self.on_title_changed(window_title, *at)
            }
        }
    }

    /// Switches focus to a new window, committing the previous span first.
    ///
    /// The returned error only reports a failed flush; the event itself has
    /// been applied and the next flush retries the write.
    pub fn on_focus_changed(
        &mut self,
        process_name: &str,
        process_path: &str,
        window_title: &str,
        at: i64,
    ) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        active.finalize(at);
        let focus_start_time = active.span_start(at);
        active.current = Some(CurrentFocus {
            process_name: process_name.to_string(),
            process_path: process_path.to_string(),
            window_title: window_title.to_string(),
            focus_start_time,
        });
        active.events_since_flush = active.events_since_flush.saturating_add(1);
        debug!(process_name = %process_name, window_title = %window_title, at, "Focus changed");

        self.flush_if_due()
    }

    /// Records a title change inside the focused application.
    ///
    /// Empty titles and repeats of the current title are ignored without a flush.
    pub fn on_title_changed(&mut self, window_title: &str, at: i64) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        if window_title.is_empty() {
            return Ok(());
        }
        let Some(current) = active.current.as_ref() else {
            debug!(window_title = %window_title, "Title change without focus; ignored");
            return Ok(());
        };
        if current.window_title == window_title {
            return Ok(());
        }

        // Finalize leaves the span start at the later of `at` and the
        // committed instant, which is where the new title's span begins.
        active.finalize(at);
        if let Some(current) = active.current.as_mut() {
            current.window_title = window_title.to_string();
        }
        active.events_since_flush = active.events_since_flush.saturating_add(1);
        debug!(window_title = %window_title, at, "Title changed");

        self.flush_if_due()
    }

    /// Time-based flush for the threshold policy; call periodically.
    pub fn tick(&mut self) -> Result<()> {
        match self.policy {
            FlushPolicy::EveryEvent => Ok(()),
            FlushPolicy::Threshold { .. } => self.flush_if_due(),
        }
    }

    /// Merges the open session into the store now, regardless of policy.
    ///
    /// A stopped session whose final write failed is retried first.
    pub fn flush(&mut self) -> Result<()> {
        self.retry_unsaved()?;

        let now = self.clock.now();
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        self.store.merge(&active.to_session(None))?;
        active.events_since_flush = 0;
        active.last_flush_at = now;
        Ok(())
    }

    /// The open session as the next flush would write it.
    pub fn snapshot(&self) -> Option<Session> {
        self.active.as_ref().map(|active| active.to_session(None))
    }

    /// The finalized session still waiting for its final write, if any.
    pub fn unsaved_session(&self) -> Option<&Session> {
        self.unsaved.as_ref()
    }

    /// Writes the session whose final merge failed. Returns it once written,
    /// or `None` if nothing was pending.
    pub fn retry_unsaved(&mut self) -> Result<Option<Session>> {
        let Some(session) = self.unsaved.as_ref() else {
            return Ok(None);
        };
        self.store.merge(session)?;
        info!(start_timestamp = session.start_timestamp, "Unsaved session written");
        Ok(self.unsaved.take())
    }

    /// Closes the session: commits the current span, stamps the end time and
    /// performs the final merge.
    ///
    /// Callers must have stopped event delivery beforehand. The aggregator is
    /// idle afterwards even when the final write fails; the finalized session
    /// is then kept in [`unsaved_session`](Self::unsaved_session) for
    /// [`retry_unsaved`](Self::retry_unsaved).
    pub fn stop_session(&mut self) -> Result<Option<Session>> {
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };

        let end_timestamp = self.clock.now().max(active.start_timestamp);
        active.finalize(end_timestamp);
        active.current = None;

        let session = active.to_session(Some(end_timestamp));
        if let Err(err) = self.store.merge(&session) {
            warn!(
                error = %err,
                start_timestamp = session.start_timestamp,
                "Final session write failed; keeping session for retry"
            );
            self.unsaved = Some(session);
            return Err(err);
        }
        info!(
            start_timestamp = session.start_timestamp,
            end_timestamp,
            applications = session.applications().len(),
            "Session stopped"
        );
        Ok(Some(session))
    }

    fn flush_if_due(&mut self) -> Result<()> {
        let now = self.clock.now();
        let Some(active) = self.active.as_ref() else {
            return Ok(());
        };
        if active.events_since_flush == 0 {
            return Ok(());
        }

        let due = match self.policy {
            FlushPolicy::EveryEvent => true,
            FlushPolicy::Threshold {
                max_events,
                max_interval_secs,
            } => {
                let elapsed = u64::try_from(now.saturating_sub(active.last_flush_at)).unwrap_or(0);
                active.events_since_flush >= max_events || elapsed >= max_interval_secs
            }
        };
        if !due {
            return Ok(());
        }

        let pending = active.events_since_flush;
        if let Err(err) = self.flush() {
            warn!(error = %err, pending_events = pending, "Session flush failed; will retry");
            return Err(err);
        }
        Ok(())
    }
}
