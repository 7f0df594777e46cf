//! Trigger definitions.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::error::{EngineError, Result};

/// Binds an event name to a named action.
///
/// When the event is sent, the optional condition is checked and, if it
/// holds, the named action is performed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// Event that fires this trigger.
    pub event_name: String,

    /// Named action to perform.
    pub action_name: String,

    /// Extra guard checked when the event fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Trigger {
    /// Create a new unconditional trigger.
    pub fn new(event_name: impl Into<String>, action_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            action_name: action_name.into(),
            condition: None,
        }
    }

    /// Set the guard condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Both names must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.event_name.is_empty() {
            return Err(EngineError::InvalidName(format!(
                "trigger for action \"{}\" has no event name",
                self.action_name
            )));
        }
        if self.action_name.is_empty() {
            return Err(EngineError::InvalidName(format!(
                "trigger for event \"{}\" has no action name",
                self.event_name
            )));
        }
        Ok(())
    }
}
