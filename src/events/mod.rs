//! Event recording and counting.
//!
//! - [`EventLog`]: Append-only occurrence counts and bounded recent history
//! - [`validate_event_name`]: Reserved-namespace checks applied before recording
//!
//! Conditions read the log through the `eventCount` and
//! `eventCountWithLimit` functions.

mod event;
mod log;

pub use event::{
    validate_event_name, EventNamespace, BUILT_IN_EVENTS, BUILT_IN_EVENT_PREFIX, WELL_KNOWN_EVENTS,
    WELL_KNOWN_EVENT_PREFIX,
};
pub use log::{EventLog, EventRecord, DEFAULT_HISTORY_CAPACITY};
