//! Core engine types: values and configuration.
//!
//! These are the shared building blocks every other module speaks in.
//! Hosts build [`EngineConfig`] values (or load them as JSON) rather than
//! touching engine internals.

pub mod config;
pub mod value;

pub use config::{
    ConfigBundle, ConfigSource, EngineConfig, JsonConfigSource, StaticConfigSource, Theme,
};
pub use value::{Value, ValueKind};
