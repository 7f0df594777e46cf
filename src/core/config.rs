//! Engine configuration.
//!
//! Configuration is authored remotely as JSON and handed to the engine by a
//! [`ConfigSource`]:
//! - `Theme`: Default visual styling applied through the host at start
//! - `EngineConfig`: Triggers, named actions and named conditions
//! - `ConfigBundle`: A loaded config plus whether its signature was verified
//!
//! The engine never fetches or verifies configuration itself.

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::condition::Condition;
use crate::error::{EngineError, Result};
use crate::triggers::Trigger;

/// Default visual styling for host-rendered UI.
///
/// Colors are hex strings (`#rrggbb`); the engine passes them through
/// untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub banner_background_color: Option<String>,
    pub banner_foreground_color: Option<String>,
    pub font_name: Option<String>,
    pub bold_font_name: Option<String>,
    /// Multiplier applied to host font sizes.
    pub font_scale: f64,
    pub scale_fonts_with_dynamic_type: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            banner_background_color: None,
            banner_foreground_color: None,
            font_name: None,
            bold_font_name: None,
            font_scale: 1.0,
            scale_fonts_with_dynamic_type: true,
        }
    }
}

impl Theme {
    /// Set banner colors.
    #[must_use]
    pub fn with_banner_colors(
        mut self,
        background: impl Into<String>,
        foreground: impl Into<String>,
    ) -> Self {
        self.banner_background_color = Some(background.into());
        self.banner_foreground_color = Some(foreground.into());
        self
    }

    /// Set the font scale.
    #[must_use]
    pub fn with_font_scale(mut self, scale: f64) -> Self {
        self.font_scale = scale;
        self
    }
}

/// Complete engine configuration.
///
/// ## JSON Form
///
/// ```
/// use moment_engine::core::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{
///     "appId": "io.example.app",
///     "configVersion": "v1",
///     "triggers": [{ "eventName": "custom_event", "actionName": "hello" }],
///     "namedActions": {
///         "hello": { "actionType": "banner", "actionData": { "body": "Hello!" } }
///     },
///     "namedConditions": { "trueCondition": "1 < 2" }
/// }"#).unwrap();
///
/// assert_eq!(config.triggers.len(), 1);
/// assert!(config.action("hello").is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// App this config was written for. Empty matches any app.
    pub app_id: String,

    /// Free-form version label, used only for diagnostics.
    pub config_version: String,

    /// Theme applied through the host at start.
    pub default_theme: Option<Theme>,

    /// Event-to-action bindings, in firing order.
    pub triggers: Vec<Trigger>,

    /// Actions by name.
    pub named_actions: FxHashMap<String, Action>,

    /// Condition overrides by name.
    pub named_conditions: FxHashMap<String, Condition>,
}

impl EngineConfig {
    /// Create an empty configuration for an app.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// `Config` if the text is not a valid configuration, including
    /// conditions that fail to parse.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Set the config version label.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.config_version = version.into();
        self
    }

    /// Set the default theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.default_theme = Some(theme);
        self
    }

    /// Append a trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Add a named action.
    #[must_use]
    pub fn with_action(mut self, name: impl Into<String>, action: Action) -> Self {
        self.named_actions.insert(name.into(), action);
        self
    }

    /// Add a named condition override.
    #[must_use]
    pub fn with_condition(mut self, name: impl Into<String>, condition: Condition) -> Self {
        self.named_conditions.insert(name.into(), condition);
        self
    }

    /// Get a named action.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.named_actions.get(name)
    }

    /// Get a named condition override.
    #[must_use]
    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.named_conditions.get(name)
    }
}

/// A loaded configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigBundle {
    pub config: EngineConfig,
    /// Whether the loader verified the config's signature.
    pub signature_verified: bool,
}

/// External loader and verifier of configuration.
///
/// Implementations own fetching and signature checking; the engine only
/// looks at the result.
pub trait ConfigSource: Send + Sync {
    /// Load the configuration.
    fn load(&self) -> Result<ConfigBundle>;
}

/// A config source returning a fixed, already-built bundle.
#[derive(Clone, Debug)]
pub struct StaticConfigSource {
    bundle: ConfigBundle,
}

impl StaticConfigSource {
    /// Wrap a config whose signature the caller vouches for.
    pub fn signed(config: EngineConfig) -> Self {
        Self {
            bundle: ConfigBundle {
                config,
                signature_verified: true,
            },
        }
    }

    /// Wrap a config with no signature.
    pub fn unsigned(config: EngineConfig) -> Self {
        Self {
            bundle: ConfigBundle {
                config,
                signature_verified: false,
            },
        }
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<ConfigBundle> {
        Ok(self.bundle.clone())
    }
}

/// Where a [`JsonConfigSource`] reads from.
#[derive(Clone, Debug)]
enum JsonInput {
    Text(String),
    File(PathBuf),
}

/// Plain JSON configuration. Never signature-verified.
///
/// Intended for development builds, where the engine is started with
/// unsigned configuration allowed.
#[derive(Clone, Debug)]
pub struct JsonConfigSource {
    input: JsonInput,
}

impl JsonConfigSource {
    /// Read configuration from JSON text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            input: JsonInput::Text(text.into()),
        }
    }

    /// Read configuration from a JSON file at load time.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: JsonInput::File(path.into()),
        }
    }
}

impl ConfigSource for JsonConfigSource {
    fn load(&self) -> Result<ConfigBundle> {
        let config = match &self.input {
            JsonInput::Text(text) => EngineConfig::from_json(text)?,
            JsonInput::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    EngineError::Config(format!("unable to read {}: {e}", path.display()))
                })?;
                EngineConfig::from_json(&text)?
            }
        };
        Ok(ConfigBundle {
            config,
            signature_verified: false,
        })
    }
}
