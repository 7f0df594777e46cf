//! Trigger binding.
//!
//! Triggers connect events to named actions. When an event is sent, every
//! trigger bound to its name is checked in configuration order.
//!
//! ## Key Components
//!
//! - [`Trigger`]: Event name, action name, optional guard condition
//! - [`TriggerBinder`]: Immutable event-name index built at start
//!
//! ## Example Usage
//!
//! ```
//! use moment_engine::triggers::{Trigger, TriggerBinder};
//!
//! let binder = TriggerBinder::from_triggers([
//!     Trigger::new("level_complete", "congrats_banner"),
//!     Trigger::new("level_complete", "review_prompt"),
//! ])
//! .unwrap();
//!
//! let actions: Vec<_> = binder
//!     .triggers_for_event("level_complete")
//!     .map(|t| t.action_name.as_str())
//!     .collect();
//! assert_eq!(actions, ["congrats_banner", "review_prompt"]);
//! ```

mod binder;
mod trigger;

pub use binder::TriggerBinder;
pub use trigger::Trigger;
