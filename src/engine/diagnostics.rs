//! Named-condition collision tracking.

use rustc_hash::FxHashMap;

use crate::error::ConditionCollision;

/// First-seen expression for each named condition.
///
/// Developer tooling only: nothing here affects dispatch.
#[derive(Clone, Debug, Default)]
pub struct NamedConditionLog {
    first_seen: FxHashMap<String, String>,
}

impl NamedConditionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a use of `name` with `expression`.
    ///
    /// The first expression recorded for a name is authoritative. Reusing
    /// the name with the same text is fine; a different text is reported
    /// and logged, but the recorded text does not change.
    pub fn check(&mut self, name: &str, expression: &str) -> Result<(), ConditionCollision> {
        match self.first_seen.get(name) {
            None => {
                self.first_seen
                    .insert(name.to_string(), expression.to_string());
                Ok(())
            }
            Some(first) if first == expression => Ok(()),
            Some(first) => {
                let collision = ConditionCollision {
                    name: name.to_string(),
                    first: first.clone(),
                    current: expression.to_string(),
                };
                tracing::warn!(%collision, "named condition collision");
                Err(collision)
            }
        }
    }

    /// The expression first recorded for `name`.
    #[must_use]
    pub fn first_expression(&self, name: &str) -> Option<&str> {
        self.first_seen.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }
}
