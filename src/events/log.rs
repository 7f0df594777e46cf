//! Append-only event log.
//!
//! Counts every recorded occurrence by name and keeps an ordered history of
//! recent records. Counts are authoritative; the history is capped at
//! [`DEFAULT_HISTORY_CAPACITY`] records unless another capacity is chosen.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// History records kept by [`EventLog::new`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// One recorded occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event name.
    pub name: String,
    /// Position in the log (starts at 1, strictly increasing).
    pub sequence: u64,
}

/// Occurrence counts plus ordered history.
///
/// History uses `im::Vector` so snapshots clone in O(1).
///
/// ## Example
///
/// ```
/// use moment_engine::events::EventLog;
///
/// let mut log = EventLog::new();
/// log.record_event("launch");
/// log.record_event("launch");
///
/// assert_eq!(log.count("launch"), 2);
/// assert_eq!(log.count_with_limit("launch", 1), 1);
/// assert_eq!(log.count("never"), 0);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLog {
    counts: FxHashMap<String, u64>,
    history: Vector<EventRecord>,
    /// Maximum history length.
    history_capacity: usize,
    next_sequence: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create an empty log keeping the last [`DEFAULT_HISTORY_CAPACITY`] records.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty log keeping at most `capacity` history records.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            counts: FxHashMap::default(),
            history: Vector::new(),
            history_capacity: capacity,
            next_sequence: 0,
        }
    }

    /// Maximum number of history records kept.
    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Record one occurrence of `name`. Returns the new count.
    ///
    /// Name validation is the caller's job (see
    /// [`validate_event_name`](super::validate_event_name)).
    pub fn record_event(&mut self, name: &str) -> u64 {
        self.next_sequence += 1;
        self.history.push_back(EventRecord {
            name: name.to_string(),
            sequence: self.next_sequence,
        });
        while self.history.len() > self.history_capacity {
            self.history.pop_front();
        }

        let count = self.counts.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Total occurrences of `name`. Unseen names count 0.
    #[must_use]
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Occurrences of `name` among its most recent `limit` occurrences.
    ///
    /// Never exceeds `limit` or `count(name)`. Lets conditions express
    /// "at least N times" without caring about the full total.
    #[must_use]
    pub fn count_with_limit(&self, name: &str, limit: u64) -> u64 {
        self.count(name).min(limit)
    }

    /// The most recent `n` records, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<&EventRecord> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).collect()
    }

    /// Total events recorded across all names.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.next_sequence
    }

    /// Number of distinct event names seen.
    #[must_use]
    pub fn distinct_names(&self) -> usize {
        self.counts.len()
    }

    /// Encode the log for an external store.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    /// Decode a log produced by [`snapshot`](Self::snapshot).
    pub fn restore(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| EngineError::Snapshot(e.to_string()))
    }
}
