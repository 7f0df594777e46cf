//! Engine error types.
//!
//! All fallible operations return [`EngineError`]. Registration and startup
//! errors are fatal to [`Engine::start`](crate::engine::Engine::start);
//! per-event errors only affect the call that produced them.
//!
//! Evaluation faults never escape the expression evaluator as panics: they
//! surface as [`EngineError::ConditionEvaluation`].

use std::fmt;

use thiserror::Error;

use crate::core::ValueKind;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// What kind of named item could not be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    /// A property provider.
    Property,
    /// A named action.
    Action,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Property => write!(f, "property"),
            ItemKind::Action => write!(f, "action"),
        }
    }
}

/// Top-level error type for the decision engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Name is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid name: \"{0}\"")]
    InvalidName(String),

    /// Name is reserved for a built-in property.
    #[error("reserved built-in name cannot be registered here: {0}")]
    ReservedName(String),

    /// A value or provider kind does not match the kind expected for a name.
    #[error("property \"{name}\" has wrong kind: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Value is nil or not a supported property kind.
    #[error("invalid value for {0}")]
    InvalidValue(String),

    /// Property or action lookup failed.
    #[error("{kind} not found: {name}")]
    NotFound { kind: ItemKind, name: String },

    /// Event name is empty or sits in a reserved namespace without being recognized.
    #[error("invalid event name: \"{0}\"")]
    InvalidEventName(String),

    /// No recognized action type was reachable through the fallback chain.
    #[error("this version of the engine does not support this action type: {0}")]
    UnsupportedActionType(String),

    /// The condition text failed to parse.
    #[error("condition syntax error at {position} in \"{source_text}\": {message}")]
    ConditionSyntax {
        source_text: String,
        position: usize,
        message: String,
    },

    /// A runtime fault caught at the evaluator boundary.
    #[error("condition evaluation failed: {0}")]
    ConditionEvaluation(String),

    /// Startup integrity checks failed; the engine did not become ready.
    #[error("startup validation failed: {0}")]
    StartupValidation(String),

    /// Operation requires a started engine.
    #[error("engine has not been started")]
    NotStarted,

    /// The host capability reported a failure.
    #[error("host capability failed: {0}")]
    Host(#[from] HostError),

    /// Configuration could not be parsed or is internally inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Event log snapshot could not be encoded or decoded.
    #[error("event log snapshot error: {0}")]
    Snapshot(String),
}

impl EngineError {
    /// Shorthand for a missing property.
    pub fn property_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: ItemKind::Property,
            name: name.into(),
        }
    }

    /// Shorthand for a missing action.
    pub fn action_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: ItemKind::Action,
            name: name.into(),
        }
    }

    /// True for configuration/registration errors that block `start`.
    #[must_use]
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidName(_)
                | Self::ReservedName(_)
                | Self::TypeMismatch { .. }
                | Self::StartupValidation(_)
                | Self::Config(_)
        )
    }
}

/// Failure reported by a host capability callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    /// Create a host error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Developer-facing warning: a condition name was reused with a different expression.
///
/// Returned by
/// [`Engine::check_named_condition_collision`](crate::engine::Engine::check_named_condition_collision).
/// This is a warning, never enforced during dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "named condition \"{name}\" was first used with \"{first}\" and is now used with \"{current}\"; \
     condition names should be unique"
)]
pub struct ConditionCollision {
    pub name: String,
    pub first: String,
    pub current: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = EngineError::action_not_found("missing");
        assert_eq!(err.to_string(), "action not found: missing");

        let err = EngineError::property_not_found("x");
        assert_eq!(err.to_string(), "property not found: x");
    }

    #[test]
    fn test_unsupported_action_message() {
        let err = EngineError::UnsupportedActionType("hologram".to_string());
        assert!(err.to_string().contains("does not support this action type"));
        assert!(err.to_string().contains("hologram"));
    }

    #[test]
    fn test_startup_fatal_classification() {
        assert!(EngineError::InvalidName(String::new()).is_startup_fatal());
        assert!(EngineError::StartupValidation("x".into()).is_startup_fatal());
        assert!(!EngineError::UnsupportedActionType("x".into()).is_startup_fatal());
        assert!(!EngineError::NotStarted.is_startup_fatal());
    }

    #[test]
    fn test_host_error_conversion() {
        let err: EngineError = HostError::new("window gone").into();
        assert_eq!(err, EngineError::Host(HostError::new("window gone")));
    }
}
