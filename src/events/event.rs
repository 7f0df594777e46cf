//! Event names and reserved namespaces.
//!
//! Events are identified by free-form names chosen by the application.
//! Two namespaces are reserved for the engine:
//!
//! - `moment.events.built_in.`: events the host library emits itself
//! - `moment.events.well_known.`: events with an engine-defined meaning
//!   that applications may send
//!
//! A name inside a reserved namespace must be one this engine version
//! recognizes. Everything outside those namespaces is a custom event.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Prefix of the built-in event namespace.
pub const BUILT_IN_EVENT_PREFIX: &str = "moment.events.built_in.";

/// Prefix of the well-known event namespace.
pub const WELL_KNOWN_EVENT_PREFIX: &str = "moment.events.well_known.";

/// Built-in events recognized by this engine version.
pub const BUILT_IN_EVENTS: &[&str] = &[
    "moment.events.built_in.app_start",
    "moment.events.built_in.app_entered_foreground",
    "moment.events.built_in.app_entered_background",
    "moment.events.built_in.app_will_terminate",
    "moment.events.built_in.user_updated_settings",
];

/// Well-known events recognized by this engine version.
pub const WELL_KNOWN_EVENTS: &[&str] = &[
    "moment.events.well_known.signed_in",
    "moment.events.well_known.signed_out",
    "moment.events.well_known.account_created",
    "moment.events.well_known.purchase",
    "moment.events.well_known.subscription_started",
    "moment.events.well_known.subscription_cancelled",
    "moment.events.well_known.content_shared",
];

/// Which namespace an event name belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventNamespace {
    /// Emitted by the host library.
    BuiltIn,
    /// Engine-defined meaning, sent by applications.
    WellKnown,
    /// Application-defined.
    Custom,
}

impl EventNamespace {
    /// Classify an event name by prefix.
    #[must_use]
    pub fn of(name: &str) -> Self {
        if name.starts_with(BUILT_IN_EVENT_PREFIX) {
            Self::BuiltIn
        } else if name.starts_with(WELL_KNOWN_EVENT_PREFIX) {
            Self::WellKnown
        } else {
            Self::Custom
        }
    }
}

/// Validate an event name before it is recorded.
///
/// # Errors
///
/// Returns [`EngineError::InvalidEventName`] for empty names and for names
/// inside a reserved namespace that this version does not recognize.
pub fn validate_event_name(name: &str) -> Result<EventNamespace> {
    if name.is_empty() {
        return Err(EngineError::InvalidEventName(String::new()));
    }
    let namespace = EventNamespace::of(name);
    let recognized = match namespace {
        EventNamespace::BuiltIn => BUILT_IN_EVENTS.contains(&name),
        EventNamespace::WellKnown => WELL_KNOWN_EVENTS.contains(&name),
        EventNamespace::Custom => true,
    };
    if recognized {
        Ok(namespace)
    } else {
        Err(EngineError::InvalidEventName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_classification() {
        assert_eq!(EventNamespace::of("moment.events.built_in.app_start"), EventNamespace::BuiltIn);
        assert_eq!(EventNamespace::of("moment.events.well_known.purchase"), EventNamespace::WellKnown);
        assert_eq!(EventNamespace::of("net.example.tapped"), EventNamespace::Custom);
    }

    #[test]
    fn test_recognized_reserved_events() {
        for name in BUILT_IN_EVENTS.iter().chain(WELL_KNOWN_EVENTS) {
            assert!(validate_event_name(name).is_ok(), "{name} should validate");
        }
    }

    #[test]
    fn test_unrecognized_reserved_events_rejected() {
        assert_eq!(
            validate_event_name("moment.events.built_in.invalid"),
            Err(EngineError::InvalidEventName("moment.events.built_in.invalid".into()))
        );
        assert!(validate_event_name("moment.events.well_known.invalid").is_err());
    }

    #[test]
    fn test_custom_and_empty_events() {
        assert_eq!(validate_event_name("custom_event"), Ok(EventNamespace::Custom));
        assert!(validate_event_name("").is_err());
    }
}
