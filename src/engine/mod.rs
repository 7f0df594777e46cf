//! Engine lifecycle and public entry points.
//!
//! - [`Engine`]: Owns the registries, event log, triggers and configuration
//! - [`SharedEngine`]: `Arc<Mutex<Engine>>` handle for multi-threaded hosts
//! - [`NamedConditionLog`]: Developer diagnostics for reused condition names
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use moment_engine::actions::{
//!     AlertAction, BannerAction, HostCapabilities, LinkAction, ModalAction, Outcome,
//! };
//! use moment_engine::core::{JsonConfigSource, Theme};
//! use moment_engine::engine::Engine;
//! use moment_engine::error::HostError;
//! use moment_engine::properties::PropertyTables;
//!
//! struct ConsoleHost;
//!
//! impl HostCapabilities for ConsoleHost {
//!     fn show_banner(&self, banner: &BannerAction) -> Result<(), HostError> {
//!         println!("banner: {}", banner.body);
//!         Ok(())
//!     }
//!     fn show_alert(&self, alert: &AlertAction) -> Result<(), HostError> {
//!         println!("alert: {}", alert.title);
//!         Ok(())
//!     }
//!     fn show_link(&self, _: &LinkAction) -> Result<(), HostError> { Ok(()) }
//!     fn show_modal(&self, _: &ModalAction) -> Result<(), HostError> { Ok(()) }
//!     fn show_review_prompt(&self) -> Result<(), HostError> { Ok(()) }
//!     fn set_default_theme(&self, _: &Theme) -> Result<(), HostError> { Ok(()) }
//!     fn can_open_url(&self, _: &str) -> bool { true }
//! }
//!
//! let mut engine = Engine::with_property_tables(PropertyTables::empty());
//! engine.set_host(Arc::new(ConsoleHost));
//! engine.set_config_source(JsonConfigSource::from_text(r#"{
//!     "triggers": [{ "eventName": "level_up", "actionName": "congrats",
//!                    "condition": "eventCount('level_up') >= 2" }],
//!     "namedActions": {
//!         "congrats": { "actionType": "banner", "actionData": { "body": "Nice!" } }
//!     }
//! }"#));
//! engine.start(true).unwrap();
//!
//! engine.send_event("level_up").unwrap(); // guard false, nothing shown
//! engine.send_event("level_up").unwrap(); // banner shown
//! assert_eq!(engine.event_count("level_up"), 2);
//! assert!(matches!(engine.perform_named_action("congrats"), Ok(Outcome::Dispatched(_))));
//! ```

mod diagnostics;
mod lifecycle;
mod shared;

pub use diagnostics::NamedConditionLog;
pub use lifecycle::{Engine, EngineState};
pub use shared::SharedEngine;
