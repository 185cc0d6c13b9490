//! # focus-core
//!
//! Core library for Focus Log: records which application and window title
//! held focus during a session and persists per-application dwell totals to
//! `focus_log.json`.
//!
//! ## Design Principles
//!
//! - **Single writer**: event sources only enqueue; one [`Recorder`] thread
//!   applies events and writes the log.
//! - **Merge, don't overwrite**: every flush merges one session into the
//!   document by `start_timestamp`, leaving other entries untouched.
//! - **Graceful degradation**: missing or corrupt files load as empty.
//! - **Synchronous**: no async runtime; sources bring their own threads.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use focus_core::{FlushPolicy, SessionAggregator, SessionStore, StorageConfig};
//!
//! let storage = StorageConfig::resolve()?;
//! let mut aggregator =
//!     SessionAggregator::new(SessionStore::new(storage.log_file()), FlushPolicy::default());
//! aggregator.start_session("writing");
//! aggregator.on_focus_changed("editor", "/usr/bin/editor", "draft.md", now)?;
//! let session = aggregator.stop_session()?;
//! ```

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod recorder;
pub mod session;
pub mod storage;
pub mod time_utils;
pub mod timeline;

pub use aggregator::SessionAggregator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_recorder_config, FlushPolicy, RecorderConfig};
pub use error::{FocusError, Result};
pub use events::{EventSink, EventSource, FocusEvent};
pub use filters::{FilterManager, ProgramFilter};
pub use recorder::{Recorder, StopHandle};
pub use session::*;
pub use storage::StorageConfig;
pub use timeline::{SessionView, Timeline, TimelineTotals};
