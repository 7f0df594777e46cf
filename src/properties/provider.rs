//! Property providers.
//!
//! A provider has a fixed kind and returns a value on demand. Providers are
//! only queried when a condition actually references their property.

use std::fmt;
use std::sync::Arc;

use crate::core::{Value, ValueKind};

/// Source of a property value.
///
/// The kind is fixed at registration; the value may change between calls.
/// Implementations may return [`Value::Nil`] when the value is unavailable.
pub trait PropertyProvider: Send + Sync {
    /// The declared kind.
    fn kind(&self) -> ValueKind;

    /// The current value.
    fn value(&self) -> Value;
}

/// A provider with a value fixed at registration.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticProvider {
    value: Value,
}

impl StaticProvider {
    /// Create a static provider.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl PropertyProvider for StaticProvider {
    fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    fn value(&self) -> Value {
        self.value.clone()
    }
}

/// A provider backed by a host callback.
///
/// The callback is shared with the host; the registry never owns the
/// host object behind it.
#[derive(Clone)]
pub struct CallbackProvider {
    kind: ValueKind,
    callback: Arc<dyn Fn() -> Value + Send + Sync>,
}

impl CallbackProvider {
    /// Create a callback provider declaring `kind`.
    pub fn new(kind: ValueKind, callback: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self {
            kind,
            callback: Arc::new(callback),
        }
    }

    /// Create a provider from an already-shared callback.
    pub fn from_shared(kind: ValueKind, callback: Arc<dyn Fn() -> Value + Send + Sync>) -> Self {
        Self { kind, callback }
    }
}

impl fmt::Debug for CallbackProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProvider")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl PropertyProvider for CallbackProvider {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn value(&self) -> Value {
        (self.callback)()
    }
}
