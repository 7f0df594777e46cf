//! Action resolution and dispatch.
//!
//! Resolution walks guards, conditional branches and fallback chains until
//! it reaches an action this engine can show, then makes exactly one host
//! call. At most one host call happens per resolution.

use rustc_hash::FxHashMap;

use crate::condition::{Condition, ConditionContext, ConditionEvaluator};
use crate::error::{EngineError, Result};

use super::action::{Action, ActionKind, ActionRef};
use super::host::HostCapabilities;

/// Maximum number of hops through branches and fallbacks.
///
/// Also terminates reference cycles such as an action naming itself as
/// its own fallback.
pub const MAX_RESOLUTION_DEPTH: usize = 16;

/// The host call a resolution ended in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchKind {
    Banner,
    Alert,
    Link,
    Modal,
    ReviewPrompt,
}

/// Result of resolving an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// One host method was called.
    Dispatched(DispatchKind),
    /// A guard or conditional branch selected nothing.
    Skipped,
}

impl Outcome {
    /// Did this resolution reach the host?
    #[must_use]
    pub fn is_dispatched(self) -> bool {
        matches!(self, Outcome::Dispatched(_))
    }
}

/// Resolves actions against the configured named actions.
pub struct ActionResolver<'a> {
    actions: &'a FxHashMap<String, Action>,
    conditions: &'a ConditionContext<'a>,
    host: &'a dyn HostCapabilities,
}

impl<'a> ActionResolver<'a> {
    /// Create a resolver.
    pub fn new(
        actions: &'a FxHashMap<String, Action>,
        conditions: &'a ConditionContext<'a>,
        host: &'a dyn HostCapabilities,
    ) -> Self {
        Self {
            actions,
            conditions,
            host,
        }
    }

    /// Resolve and dispatch a named action.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the name (or any name reached from it) is not configured
    /// - `UnsupportedActionType` if a fallback chain ends without a known type
    /// - `ConditionEvaluation` if a guard fails to evaluate
    /// - `Host` if the host call fails
    pub fn perform_named(&self, name: &str) -> Result<Outcome> {
        let action = self.lookup(name)?;
        self.resolve(action, 0)
    }

    /// Resolve and dispatch an action value.
    pub fn perform(&self, action: &Action) -> Result<Outcome> {
        self.resolve(action, 0)
    }

    fn lookup(&self, name: &str) -> Result<&'a Action> {
        self.actions
            .get(name)
            .ok_or_else(|| EngineError::action_not_found(name))
    }

    fn follow(&self, reference: &ActionRef, depth: usize) -> Result<Outcome> {
        match reference {
            ActionRef::Named(name) => self.resolve(self.lookup(name)?, depth),
            ActionRef::Inline(action) => self.resolve(action, depth),
        }
    }

    fn check(&self, condition: &Condition) -> Result<bool> {
        ConditionEvaluator::evaluate(condition, self.conditions)
    }

    fn resolve(&self, action: &Action, depth: usize) -> Result<Outcome> {
        if depth > MAX_RESOLUTION_DEPTH {
            return Err(EngineError::UnsupportedActionType(
                action.kind.type_tag().to_string(),
            ));
        }

        if let Some(guard) = &action.condition {
            if !self.check(guard)? {
                tracing::debug!(condition = %guard, "action guard false; skipping");
                return Ok(Outcome::Skipped);
            }
        }

        let dispatched = match &action.kind {
            ActionKind::Banner(banner) => {
                self.host.show_banner(banner)?;
                DispatchKind::Banner
            }
            ActionKind::Alert(alert) => {
                self.host.show_alert(alert)?;
                DispatchKind::Alert
            }
            ActionKind::Link(link) => {
                self.host.show_link(link)?;
                DispatchKind::Link
            }
            ActionKind::Modal(modal) => {
                self.host.show_modal(modal)?;
                DispatchKind::Modal
            }
            ActionKind::ReviewPrompt => {
                self.host.show_review_prompt()?;
                DispatchKind::ReviewPrompt
            }

            ActionKind::Conditional(conditional) => {
                return if self.check(&conditional.condition)? {
                    self.follow(&conditional.passed, depth + 1)
                } else if let Some(failed) = &conditional.failed {
                    self.follow(failed, depth + 1)
                } else {
                    Ok(Outcome::Skipped)
                };
            }

            ActionKind::Future { type_tag, fallback, .. } => {
                return match fallback {
                    Some(fallback) => {
                        tracing::debug!(action_type = %type_tag, "unsupported action type; using fallback");
                        self.follow(fallback, depth + 1)
                    }
                    None => Err(EngineError::UnsupportedActionType(type_tag.clone())),
                };
            }
        };

        tracing::debug!(kind = ?dispatched, "dispatched action");
        Ok(Outcome::Dispatched(dispatched))
    }
}
