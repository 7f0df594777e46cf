//! Typed host properties.
//!
//! - [`PropertyTables`]: Expected kinds for built-in and well-known names
//! - [`PropertyProvider`]: Something that yields a value of a fixed kind
//! - [`PropertyRegistry`]: Name-to-provider map enforcing the naming rules
//!
//! ## Namespaces
//!
//! | Namespace   | Registered by                  | Requirement            |
//! |-------------|--------------------------------|------------------------|
//! | Built-in    | Host library (built-in path)   | Required unless optional |
//! | Well-known  | Host or client                 | Fixed kind             |
//! | Custom      | Client (`custom_` prefix)      | Any property kind      |

mod provider;
mod registry;
mod tables;

pub use provider::{CallbackProvider, PropertyProvider, StaticProvider};
pub use registry::PropertyRegistry;
pub use tables::{PropertyTables, CUSTOM_PROPERTY_PREFIX};
