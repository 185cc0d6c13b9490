//! Single-writer recording loop.
//!
//! The [`Recorder`] subscribes an [`EventSource`] to a channel and applies
//! everything it receives on the calling thread, so the aggregator never sees
//! concurrent mutation. Sources deliver from any thread they like.
//!
//! Shutdown order is fixed: unsubscribe the source, apply whatever is still
//! queued, then finalize the session. Once `run` returns no event can reach
//! the aggregator.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::aggregator::SessionAggregator;
use crate::clock::{Clock, SystemClock};
use crate::error::{FocusError, Result};
use crate::events::{EventSink, EventSource, RecorderMessage};
use crate::session::Session;

/// Attempts at the final session write before giving up.
const FINAL_WRITE_ATTEMPTS: u32 = 3;

/// Asks a running recorder to end its session. Usable from signal handlers.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<RecorderMessage>,
}

impl StopHandle {
    /// Returns false if the recorder has already finished.
    pub fn request_stop(&self) -> bool {
        self.tx.send(RecorderMessage::StopRequested).is_ok()
    }
}

pub struct Recorder<S: EventSource, C: Clock = SystemClock> {
    aggregator: SessionAggregator<C>,
    source: S,
    tx: Sender<RecorderMessage>,
    rx: Receiver<RecorderMessage>,
    tick_interval: Duration,
    subscribed: bool,
}

impl<S: EventSource, C: Clock> Recorder<S, C> {
    pub fn new(aggregator: SessionAggregator<C>, source: S, tick_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            aggregator,
            source,
            tx,
            rx,
            tick_interval,
            subscribed: false,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn aggregator(&self) -> &SessionAggregator<C> {
        &self.aggregator
    }

    /// Opens a session and subscribes the source.
    ///
    /// Returns `Ok(false)` if a session is already open. If the source cannot
    /// subscribe, the new session is dropped unwritten and the error returned.
    pub fn start_session(&mut self, comment: &str) -> Result<bool> {
        if !self.aggregator.start_session(comment) {
            return Ok(false);
        }

        if let Err(err) = self.source.subscribe(EventSink::new(self.tx.clone())) {
            warn!(error = %err, "Event source failed to subscribe");
            self.aggregator.discard_session();
            return Err(err);
        }
        self.subscribed = true;
        Ok(true)
    }

    /// Applies events until the source ends or a stop is requested, then
    /// closes the session. Returns the final session, or `None` if none was open.
    pub fn run(mut self) -> Result<Option<Session>> {
        if !self.aggregator.is_session_active() {
            return Ok(None);
        }

        loop {
            match self.rx.recv_timeout(self.tick_interval) {
                Ok(RecorderMessage::Event(event)) => {
                    if let Err(err) = self.aggregator.apply(&event) {
                        warn!(error = %err, "Failed to persist focus event");
                    }
                }
                Ok(RecorderMessage::SourceEnded) => {
                    info!("Event source ended");
                    break;
                }
                Ok(RecorderMessage::StopRequested) => {
                    info!("Stop requested");
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(err) = self.aggregator.tick() {
                        warn!(error = %err, "Periodic flush failed");
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.finish()
    }

    fn finish(&mut self) -> Result<Option<Session>> {
        self.unsubscribe();

        let mut drained = 0usize;
        while let Ok(message) = self.rx.try_recv() {
            if let RecorderMessage::Event(event) = message {
                drained += 1;
                if let Err(err) = self.aggregator.apply(&event) {
                    warn!(error = %err, "Failed to persist focus event");
                }
            }
        }
        if drained > 0 {
            debug!(drained, "Applied queued events before stopping");
        }

        match self.aggregator.stop_session() {
            Ok(session) => Ok(session),
            Err(err) => self.retry_final_write(err),
        }
    }

    /// Retries the final write, pausing one tick between tries. If every
    /// try fails the session is logged in full so it is not lost silently.
    fn retry_final_write(&mut self, mut last_error: FocusError) -> Result<Option<Session>> {
        for attempt in 2..=FINAL_WRITE_ATTEMPTS {
            thread::sleep(self.tick_interval);
            match self.aggregator.retry_unsaved() {
                Ok(session) => return Ok(session),
                Err(err) => {
                    warn!(attempt, error = %err, "Final session write failed");
                    last_error = err;
                }
            }
        }

        if let Some(session) = self.aggregator.unsaved_session() {
            match serde_json::to_string(session) {
                Ok(json) => error!(session = %json, "Session could not be saved"),
                Err(err) => error!(error = %err, "Session could not be saved or serialized"),
            }
        }
        Err(last_error)
    }

    fn unsubscribe(&mut self) {
        if self.subscribed {
            self.source.unsubscribe();
            self.subscribed = false;
        }
    }
}

impl<S: EventSource, C: Clock> Drop for Recorder<S, C> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
