//! Focus event contract between platform collaborators and the recorder.
//!
//! A platform layer (window hooks, a polling loop, a bridge process) implements
//! [`EventSource`]. On subscribe it receives one [`EventSink`] and pushes every
//! focus or title change into it from whatever thread its callbacks run on.
//! The sink only enqueues; the recorder's worker thread is the single writer
//! that applies events to the aggregator.

use std::sync::mpsc::Sender;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    /// A different top-level window became the foreground window.
    FocusChanged {
        process_name: String,
        process_path: String,
        window_title: String,
        at: i64,
    },
    /// The focused window's title changed.
    TitleChanged { window_title: String, at: i64 },
}

/// Messages consumed by the recorder worker.
#[derive(Debug)]
pub(crate) enum RecorderMessage {
    Event(FocusEvent),
    /// The source will deliver nothing more (e.g. its input closed).
    SourceEnded,
    StopRequested,
}

/// The handler a source delivers into. Cheap to clone; sends never block.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<RecorderMessage>,
}

impl EventSink {
    pub(crate) fn new(tx: Sender<RecorderMessage>) -> Self {
        Self { tx }
    }

    /// Enqueues an event. Returns false once the recorder is gone.
    pub fn send(&self, event: FocusEvent) -> bool {
        self.tx.send(RecorderMessage::Event(event)).is_ok()
    }

    pub fn focus_changed(
        &self,
        process_name: impl Into<String>,
        process_path: impl Into<String>,
        window_title: impl Into<String>,
        at: i64,
    ) -> bool {
        self.send(FocusEvent::FocusChanged {
            process_name: process_name.into(),
            process_path: process_path.into(),
            window_title: window_title.into(),
            at,
        })
    }

    pub fn title_changed(&self, window_title: impl Into<String>, at: i64) -> bool {
        self.send(FocusEvent::TitleChanged {
            window_title: window_title.into(),
            at,
        })
    }

    /// Tells the recorder this source has no more events; it ends the session.
    pub fn source_ended(&self) {
        let _ = self.tx.send(RecorderMessage::SourceEnded);
    }
}

/// A platform collaborator that produces focus events.
pub trait EventSource: Send {
    /// Starts delivering events into `sink`.
    fn subscribe(&mut self, sink: EventSink) -> Result<()>;

    /// Stops delivery. After this returns the source must not send anything
    /// more into the sink it was given.
    fn unsubscribe(&mut self);
}
