//! Host capabilities.
//!
//! The engine decides *what* to show; the host shows it. Every dispatched
//! action ends in exactly one call on this trait.

use crate::core::Theme;
use crate::error::HostError;

use super::action::{AlertAction, BannerAction, LinkAction, ModalAction};

/// Presentation callbacks implemented by the embedding application.
///
/// Calls are synchronous and made from the thread driving the engine.
/// Implementations should return quickly and report failure through
/// [`HostError`].
pub trait HostCapabilities: Send + Sync {
    fn show_banner(&self, banner: &BannerAction) -> Result<(), HostError>;

    fn show_alert(&self, alert: &AlertAction) -> Result<(), HostError>;

    fn show_link(&self, link: &LinkAction) -> Result<(), HostError>;

    fn show_modal(&self, modal: &ModalAction) -> Result<(), HostError>;

    fn show_review_prompt(&self) -> Result<(), HostError>;

    /// Called once during start when the config has a default theme.
    fn set_default_theme(&self, theme: &Theme) -> Result<(), HostError>;

    /// Can the device open this URL? Backs the `canOpenUrl` condition function.
    fn can_open_url(&self, url: &str) -> bool;
}
