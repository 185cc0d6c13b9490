//! Session model and the on-disk session document.
//!
//! - [`types`]: persisted structures for both the aggregated and the legacy schema
//! - [`store`]: lenient loading, atomic saving and the flush merge

pub mod store;
pub mod types;

pub use store::{
    delete_session, delete_session_by_start, load_from_file, save_to_file, MergeOutcome,
    SessionStore,
};
pub use types::{ApplicationFocusEvent, FocusRecord, Session, SessionActivity, Tab, TitleRecord};
