//! Event-to-trigger index.
//!
//! Built once at start from the configured triggers and never mutated
//! afterwards. Lookup preserves configuration order.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::Result;

use super::trigger::Trigger;

/// Index of triggers by event name.
#[derive(Clone, Debug, Default)]
pub struct TriggerBinder {
    /// All triggers, in configuration order.
    triggers: Vec<Trigger>,

    /// Positions in `triggers` for each event name.
    by_event: FxHashMap<String, SmallVec<[usize; 2]>>,
}

impl TriggerBinder {
    /// Create an empty binder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and index triggers.
    ///
    /// # Errors
    ///
    /// `InvalidName` if any trigger lacks an event or action name.
    pub fn from_triggers(triggers: impl IntoIterator<Item = Trigger>) -> Result<Self> {
        let mut binder = Self::new();
        for trigger in triggers {
            trigger.validate()?;
            binder
                .by_event
                .entry(trigger.event_name.clone())
                .or_default()
                .push(binder.triggers.len());
            binder.triggers.push(trigger);
        }
        Ok(binder)
    }

    /// Triggers bound to an event, in configuration order.
    pub fn triggers_for_event<'a>(&'a self, event_name: &str) -> impl Iterator<Item = &'a Trigger> + 'a {
        self.by_event
            .get(event_name)
            .into_iter()
            .flat_map(|positions| positions.iter())
            .filter_map(|&i| self.triggers.get(i))
    }

    /// Does any trigger listen for this event?
    #[must_use]
    pub fn has_triggers(&self, event_name: &str) -> bool {
        self.by_event.contains_key(event_name)
    }

    /// Get total trigger count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Check if the binder is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Iterate all triggers in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }
}
