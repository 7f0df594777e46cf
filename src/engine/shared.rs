//! Thread-safe engine handle.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::actions::Outcome;
use crate::error::{ConditionCollision, Result};

use super::lifecycle::Engine;

/// A cloneable handle serializing every call through one lock.
///
/// Each boundary call holds the lock for its whole duration, including the
/// host callback at the end of a dispatch.
///
/// The lock is not re-entrant. Host callbacks, property providers and
/// dynamic functions run while it is held, so calling a blocking method on
/// the same handle from inside one of them deadlocks the calling thread.
/// Such callbacks should use [`SharedEngine::try_with`] or hand the work to
/// another thread.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    /// Wrap an engine.
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run a closure with exclusive access to the engine.
    ///
    /// Used for registration and anything not mirrored below.
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Like [`SharedEngine::with`], but returns `None` instead of waiting
    /// when the engine is busy.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        self.inner.try_lock().map(|mut engine| f(&mut engine))
    }

    pub fn start(&self, allow_unsigned_config: bool) -> Result<()> {
        self.inner.lock().start(allow_unsigned_config)
    }

    pub fn send_event(&self, name: &str) -> Result<()> {
        self.inner.lock().send_event(name)
    }

    pub fn perform_named_action(&self, name: &str) -> Result<Outcome> {
        self.inner.lock().perform_named_action(name)
    }

    pub fn check_named_condition(&self, name: &str, fallback: &str) -> Result<bool> {
        self.inner.lock().check_named_condition(name, fallback)
    }

    pub fn check_named_condition_collision(
        &self,
        name: &str,
        expression: &str,
    ) -> std::result::Result<(), ConditionCollision> {
        self.inner.lock().check_named_condition_collision(name, expression)
    }

    #[must_use]
    pub fn event_count(&self, name: &str) -> u64 {
        self.inner.lock().event_count(name)
    }

    /// Encode the event log for an external store.
    pub fn snapshot_events(&self) -> Result<Vec<u8>> {
        self.inner.lock().events().snapshot()
    }
}

impl From<Engine> for SharedEngine {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}
