//! Action definitions.
//!
//! Actions are the host-visible outcomes of the engine: banners, alerts,
//! links, modals and review prompts, plus two structural variants that
//! decide *which* of those runs.
//!
//! ## JSON Form
//!
//! ```json
//! {
//!   "actionType": "banner",
//!   "actionData": { "body": "Hello!" },
//!   "condition": "eventCount('launch') > 2",
//!   "fallback": "plainAlert"
//! }
//! ```
//!
//! An `actionType` this engine does not recognize becomes
//! [`ActionKind::Future`], carrying its `fallback` and its untouched
//! `actionData` so the action is written back unchanged.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::condition::Condition;

/// Type tags of the action kinds this engine understands.
pub mod type_tags {
    pub const BANNER: &str = "banner";
    pub const ALERT: &str = "alert";
    pub const LINK: &str = "link";
    pub const MODAL: &str = "modal";
    pub const REVIEW: &str = "review";
    pub const CONDITIONAL: &str = "conditional";
}

/// Where a banner is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BannerPosition {
    Top,
    #[default]
    Bottom,
}

/// A transient message strip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerAction {
    pub body: String,
    #[serde(default = "default_true")]
    pub show_dismiss_button: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_line_count: Option<u32>,
    /// Named action to perform when the banner is tapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_action_name: Option<String>,
    #[serde(default)]
    pub preferred_position: BannerPosition,
}

impl BannerAction {
    /// Create a dismissable bottom banner.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            show_dismiss_button: true,
            max_line_count: None,
            tap_action_name: None,
            preferred_position: BannerPosition::default(),
        }
    }

    /// Set the tap action (builder pattern).
    #[must_use]
    pub fn with_tap_action(mut self, action_name: impl Into<String>) -> Self {
        self.tap_action_name = Some(action_name.into());
        self
    }
}

/// Visual style of an alert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertStyle {
    #[default]
    Dialog,
    Large,
}

/// A system-style alert dialog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertAction {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "default_true")]
    pub show_cancel_button: bool,
    /// Named action to perform when OK is pressed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok_button_action_name: Option<String>,
    #[serde(default)]
    pub style: AlertStyle,
}

impl AlertAction {
    /// Create an alert with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: None,
            show_cancel_button: true,
            ok_button_action_name: None,
            style: AlertStyle::default(),
        }
    }

    /// Set the message body (builder pattern).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Open a URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAction {
    pub url: String,
    /// Open inside the app instead of the system browser.
    #[serde(default)]
    pub use_embedded_browser: bool,
}

impl LinkAction {
    /// Create a link opened in the system browser.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            use_embedded_browser: false,
        }
    }
}

/// A button shown in a modal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalButton {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
}

/// A full-screen modal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalAction {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default = "default_true")]
    pub show_close_button: bool,
    #[serde(default)]
    pub buttons: Vec<ModalButton>,
}

impl ModalAction {
    /// Create a closable modal with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            show_close_button: true,
            buttons: Vec::new(),
        }
    }

    /// Add a button (builder pattern).
    #[must_use]
    pub fn with_button(mut self, label: impl Into<String>, action_name: Option<String>) -> Self {
        self.buttons.push(ModalButton {
            label: label.into(),
            action_name,
        });
        self
    }
}

/// Choose between two actions with a condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalAction {
    pub condition: Condition,
    /// Performed when the condition holds.
    #[serde(rename = "passedActionName")]
    pub passed: ActionRef,
    /// Performed when it does not. Nothing runs if absent.
    #[serde(
        rename = "failedActionName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub failed: Option<ActionRef>,
}

impl ConditionalAction {
    /// Create a conditional with no failure branch.
    pub fn new(condition: Condition, passed: impl Into<ActionRef>) -> Self {
        Self {
            condition,
            passed: passed.into(),
            failed: None,
        }
    }

    /// Set the failure branch (builder pattern).
    #[must_use]
    pub fn with_failed(mut self, failed: impl Into<ActionRef>) -> Self {
        self.failed = Some(failed.into());
        self
    }
}

/// Reference to another action: by name, or written inline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionRef {
    Named(String),
    Inline(Box<Action>),
}

impl From<&str> for ActionRef {
    fn from(name: &str) -> Self {
        ActionRef::Named(name.to_string())
    }
}

impl From<String> for ActionRef {
    fn from(name: String) -> Self {
        ActionRef::Named(name)
    }
}

impl From<Action> for ActionRef {
    fn from(action: Action) -> Self {
        ActionRef::Inline(Box::new(action))
    }
}

/// What an action does.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionKind {
    Banner(BannerAction),
    Alert(AlertAction),
    Link(LinkAction),
    Modal(ModalAction),
    ReviewPrompt,
    Conditional(ConditionalAction),
    /// A type this engine does not recognize.
    ///
    /// Resolved through `fallback`; with no fallback it cannot be performed.
    Future {
        type_tag: String,
        fallback: Option<ActionRef>,
        /// Raw `actionData`, kept for re-serialization.
        data: serde_json::Value,
    },
}

impl ActionKind {
    /// The JSON `actionType` tag.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        match self {
            ActionKind::Banner(_) => type_tags::BANNER,
            ActionKind::Alert(_) => type_tags::ALERT,
            ActionKind::Link(_) => type_tags::LINK,
            ActionKind::Modal(_) => type_tags::MODAL,
            ActionKind::ReviewPrompt => type_tags::REVIEW,
            ActionKind::Conditional(_) => type_tags::CONDITIONAL,
            ActionKind::Future { type_tag, .. } => type_tag,
        }
    }
}

/// An action plus an optional guard.
///
/// If the guard evaluates false the action is skipped without error.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub condition: Option<Condition>,
}

impl Action {
    /// Create an unguarded action.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            condition: None,
        }
    }

    /// Create an action of an unrecognized type with a fallback.
    pub fn future(type_tag: impl Into<String>, fallback: Option<ActionRef>) -> Self {
        Self::new(ActionKind::Future {
            type_tag: type_tag.into(),
            fallback,
            data: serde_json::Value::Null,
        })
    }

    /// Set the guard condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

fn default_true() -> bool {
    true
}

/// Wire form shared by serialization and deserialization.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    action_type: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    action_data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback: Option<ActionRef>,
}

fn payload<T: serde::de::DeserializeOwned>(tag: &str, data: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(data).map_err(|e| format!("invalid actionData for {tag} action: {e}"))
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAction::deserialize(deserializer)?;
        let tag = raw.action_type.as_str();
        let data = raw.action_data;

        let kind = match tag {
            type_tags::BANNER => payload(tag, data).map(ActionKind::Banner),
            type_tags::ALERT => payload(tag, data).map(ActionKind::Alert),
            type_tags::LINK => payload(tag, data).map(ActionKind::Link),
            type_tags::MODAL => payload(tag, data).map(ActionKind::Modal),
            type_tags::CONDITIONAL => payload(tag, data).map(ActionKind::Conditional),
            type_tags::REVIEW => Ok(ActionKind::ReviewPrompt),
            "" => Err("action is missing actionType".to_string()),
            _ => Ok(ActionKind::Future {
                type_tag: raw.action_type.clone(),
                fallback: raw.fallback,
                data,
            }),
        }
        .map_err(D::Error::custom)?;

        Ok(Action {
            kind,
            condition: raw.condition,
        })
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match &self.kind {
            ActionKind::Banner(banner) => serde_json::to_value(banner),
            ActionKind::Alert(alert) => serde_json::to_value(alert),
            ActionKind::Link(link) => serde_json::to_value(link),
            ActionKind::Modal(modal) => serde_json::to_value(modal),
            ActionKind::Conditional(conditional) => serde_json::to_value(conditional),
            ActionKind::Future { data, .. } => Ok(data.clone()),
            ActionKind::ReviewPrompt => Ok(serde_json::Value::Null),
        }
        .map_err(S::Error::custom)?;

        let fallback = match &self.kind {
            ActionKind::Future { fallback, .. } => fallback.clone(),
            _ => None,
        };

        RawAction {
            action_type: self.kind.type_tag().to_string(),
            action_data: data,
            condition: self.condition.clone(),
            fallback,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Action {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_banner_json() {
        let action = parse(r#"{"actionType": "banner", "actionData": {"body": "Hello world, but on a banner!"}}"#);
        match action.kind {
            ActionKind::Banner(banner) => {
                assert_eq!(banner.body, "Hello world, but on a banner!");
                assert!(banner.show_dismiss_button);
                assert_eq!(banner.preferred_position, BannerPosition::Bottom);
            }
            other => panic!("expected banner, got {other:?}"),
        }
        assert!(action.condition.is_none());
    }

    #[test]
    fn test_guard_condition() {
        let action = parse(
            r#"{"actionType": "alert", "actionData": {"title": "Hi"}, "condition": "1 > 2"}"#,
        );
        assert_eq!(action.condition.unwrap().source(), "1 > 2");
    }

    #[test]
    fn test_review_needs_no_data() {
        assert_eq!(parse(r#"{"actionType": "review"}"#).kind, ActionKind::ReviewPrompt);
    }

    #[test]
    fn test_unknown_type_becomes_future() {
        let action = parse(
            r#"{"actionType": "hologram", "actionData": {"beam": 3}, "fallback": "alertAction"}"#,
        );
        assert_eq!(
            action.kind,
            ActionKind::Future {
                type_tag: "hologram".into(),
                fallback: Some(ActionRef::Named("alertAction".into())),
                data: serde_json::json!({"beam": 3}),
            }
        );
    }

    #[test]
    fn test_future_action_keeps_payload() {
        let json = serde_json::json!({
            "actionType": "hologram",
            "actionData": {"beam": 3, "colors": ["red", "blue"]},
            "condition": "true",
            "fallback": "alertAction"
        });
        let action: Action = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&action).unwrap(), json);

        let bare = serde_json::to_value(Action::future("hologram", None)).unwrap();
        assert!(bare.get("actionData").is_none());
    }

    #[test]
    fn test_inline_fallback() {
        let action = parse(
            r#"{"actionType": "hologram", "fallback": {"actionType": "link", "actionData": {"url": "https://example.com"}}}"#,
        );
        let ActionKind::Future { fallback: Some(ActionRef::Inline(inner)), .. } = action.kind else {
            panic!("expected inline fallback");
        };
        assert_eq!(inner.kind, ActionKind::Link(LinkAction::new("https://example.com")));
    }

    #[test]
    fn test_conditional_json() {
        let action = parse(
            r#"{"actionType": "conditional", "actionData": {
                "condition": "true", "passedActionName": "a", "failedActionName": "b"}}"#,
        );
        let ActionKind::Conditional(conditional) = action.kind else {
            panic!("expected conditional");
        };
        assert_eq!(conditional.passed, ActionRef::Named("a".into()));
        assert_eq!(conditional.failed, Some(ActionRef::Named("b".into())));
    }

    #[test]
    fn test_bad_payload_is_error() {
        let result: Result<Action, _> =
            serde_json::from_str(r#"{"actionType": "banner", "actionData": {}}"#);
        assert!(result.unwrap_err().to_string().contains("banner"));

        let result: Result<Action, _> = serde_json::from_str(r#"{"actionType": ""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_keeps_wire_shape() {
        let action = Action::new(ActionKind::Banner(BannerAction::new("Hi")))
            .with_condition(Condition::parse("true").unwrap());
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["actionType"], "banner");
        assert_eq!(json["actionData"]["body"], "Hi");
        assert_eq!(json["condition"], "true");

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }
}
