//! # moment-engine
//!
//! An embedded decision engine: given a stream of named application events
//! and a declarative configuration of conditions, triggers and actions, it
//! decides at each event which user-facing action (if any) to show, and
//! shows it through a host-supplied callback interface.
//!
//! ## Design Principles
//!
//! 1. **Schema Drift Tolerant**: Configuration is written independently of
//!    the engine version. Unknown variables and functions evaluate to `nil`;
//!    unknown action types resolve through a fallback chain.
//!
//! 2. **At Most One Outcome**: Every dispatch ends in at most one host call,
//!    however deeply fallbacks and conditional branches nest.
//!
//! 3. **Faults Are Values**: Condition evaluation never panics into the host.
//!    Type errors, arithmetic faults and even panicking host callbacks come
//!    back as [`EngineError`].
//!
//! ## Modules
//!
//! - `core`: Values, value kinds, configuration and config sources
//! - `properties`: Typed property registry with built-in/well-known/custom namespaces
//! - `condition`: Expression language: lexer, parser, functions, evaluator
//! - `events`: Event log and event-name validation
//! - `triggers`: Event-to-action bindings
//! - `actions`: Action model, host capabilities, resolver
//! - `engine`: Lifecycle, entry points, thread-safe handle
//! - `error`: Error taxonomy

pub mod actions;
pub mod condition;
pub mod core;
pub mod engine;
pub mod error;
pub mod events;
pub mod properties;
pub mod triggers;

// Re-export commonly used types
pub use crate::core::{
    ConfigBundle, ConfigSource, EngineConfig, JsonConfigSource, StaticConfigSource, Theme, Value,
    ValueKind,
};

pub use crate::error::{ConditionCollision, EngineError, HostError, ItemKind, Result};

pub use crate::properties::{
    CallbackProvider, PropertyProvider, PropertyRegistry, PropertyTables, StaticProvider,
};

pub use crate::condition::{
    Condition, ConditionContext, ConditionEvaluator, DynamicFunction, FunctionRegistry, Signature,
};

pub use crate::events::{validate_event_name, EventLog, EventRecord};

pub use crate::triggers::{Trigger, TriggerBinder};

pub use crate::actions::{
    Action, ActionKind, ActionRef, ActionResolver, AlertAction, BannerAction, ConditionalAction,
    DispatchKind, HostCapabilities, LinkAction, ModalAction, Outcome,
};

pub use crate::engine::{Engine, EngineState, SharedEngine};

/// Version of this engine, as exposed to conditions through `engine_version`.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
