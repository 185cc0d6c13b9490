//! Platform bridge: focus events as newline-delimited JSON.
//!
//! The OS-specific watcher runs as a separate process and pipes one event per
//! line into the recorder:
//!
//! ```text
//! {"event":"focus_changed","process_name":"code.exe","process_path":"C:\\...","window_title":"main.rs","at":1700000000}
//! {"event":"title_changed","window_title":"lib.rs"}
//! ```
//!
//! `at` defaults to the recorder's clock. Blank and malformed lines are
//! skipped; end of input ends the session.

use focus_core::{Clock, EventSink, EventSource, FocusError, FocusEvent, SystemClock};
use serde::Deserialize;
use std::io::{self, BufRead};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
enum BridgeEvent {
    FocusChanged {
        process_name: String,
        #[serde(default)]
        process_path: String,
        #[serde(default)]
        window_title: String,
        at: Option<i64>,
    },
    TitleChanged {
        window_title: String,
        at: Option<i64>,
    },
}

impl BridgeEvent {
    fn into_focus_event(self, now: impl FnOnce() -> i64) -> FocusEvent {
        match self {
            BridgeEvent::FocusChanged {
                process_name,
                process_path,
                window_title,
                at,
            } => FocusEvent::FocusChanged {
                process_name,
                process_path,
                window_title,
                at: at.unwrap_or_else(now),
            },
            BridgeEvent::TitleChanged { window_title, at } => FocusEvent::TitleChanged {
                window_title,
                at: at.unwrap_or_else(now),
            },
        }
    }
}

/// Parses one bridge line. `Ok(None)` for blank lines.
fn parse_line(line: &str, clock: &impl Clock) -> Result<Option<FocusEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let event: BridgeEvent = serde_json::from_str(line)?;
    Ok(Some(event.into_focus_event(|| clock.now())))
}

type SharedSink = Arc<Mutex<Option<EventSink>>>;

/// Reads bridge lines on a background thread and forwards them to the sink.
///
/// Unsubscribing detaches the sink immediately. The reader thread may stay
/// blocked on input until the process exits but can no longer deliver.
pub struct LineSource<R, C = SystemClock> {
    reader: Option<R>,
    clock: C,
    sink: SharedSink,
}

impl<R> LineSource<R, SystemClock> {
    pub fn new(reader: R) -> Self {
        Self::with_clock(reader, SystemClock)
    }
}

impl<R, C> LineSource<R, C> {
    pub fn with_clock(reader: R, clock: C) -> Self {
        Self {
            reader: Some(reader),
            clock,
            sink: Arc::new(Mutex::new(None)),
        }
    }
}

impl<R, C> EventSource for LineSource<R, C>
where
    R: BufRead + Send + 'static,
    C: Clock + Clone + 'static,
{
    fn subscribe(&mut self, sink: EventSink) -> focus_core::Result<()> {
        let reader = self.reader.take().ok_or_else(|| FocusError::Io {
            context: "subscribing bridge reader".to_string(),
            source: io::Error::other("input already consumed by an earlier session"),
        })?;
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);

        let shared = Arc::clone(&self.sink);
        let clock = self.clock.clone();
        thread::Builder::new()
            .name("focus-bridge".to_string())
            .spawn(move || read_lines(reader, clock, shared))
            .map_err(|err| FocusError::Io {
                context: "spawning bridge reader".to_string(),
                source: err,
            })?;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

fn read_lines<R: BufRead, C: Clock>(reader: R, clock: C, sink: SharedSink) {
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read bridge input");
                break;
            }
        };

        let event = match parse_line(&line, &clock) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(line = index + 1, error = %err, "Skipping malformed bridge event");
                continue;
            }
        };

        let delivered = sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sink| sink.send(event));
        if !delivered {
            return;
        }
    }

    tracing::debug!("Bridge input closed");
    if let Some(sink) = sink.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
        sink.source_ended();
    }
}
