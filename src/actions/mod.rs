//! Action model and dispatch.
//!
//! - `Action`: What to show, plus an optional guard condition
//! - `HostCapabilities`: The host's presentation callbacks
//! - `ActionResolver`: Walks guards, branches and fallbacks to one host call
//!
//! ## Forward Compatibility
//!
//! Configuration may name action types added in later engine versions.
//! Those load as [`ActionKind::Future`] and resolve through their
//! `fallback`, so an older engine shows the closest thing it supports
//! instead of failing the whole configuration.

mod action;
mod host;
mod resolver;

pub use action::{
    type_tags, Action, ActionKind, ActionRef, AlertAction, AlertStyle, BannerAction,
    BannerPosition, ConditionalAction, LinkAction, ModalAction, ModalButton,
};
pub use host::HostCapabilities;
pub use resolver::{ActionResolver, DispatchKind, Outcome, MAX_RESOLUTION_DEPTH};
