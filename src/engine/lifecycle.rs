//! The engine and its lifecycle.
//!
//! An [`Engine`] starts in [`EngineState::Configuring`]: properties,
//! functions, the host and the config source are registered. [`Engine::start`]
//! loads and checks configuration and, on success, moves to
//! [`EngineState::Ready`]. Everything event- or action-related requires a
//! ready engine.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::actions::{ActionResolver, HostCapabilities, Outcome};
use crate::condition::{
    Condition, ConditionContext, ConditionEvaluator, DynamicFunction, FunctionRegistry,
    BUILT_IN_DYNAMIC_FUNCTIONS, CAN_OPEN_URL,
};
use crate::core::{ConfigSource, EngineConfig, Value, ValueKind};
use crate::error::{ConditionCollision, EngineError, Result};
use crate::events::{validate_event_name, EventLog};
use crate::properties::{PropertyProvider, PropertyRegistry, PropertyTables};
use crate::triggers::TriggerBinder;

use super::diagnostics::NamedConditionLog;

/// Name of the built-in property used as the app id when none is set.
const APP_ID_PROPERTY: &str = "app_id";

/// Fallback expressions kept compiled by `check_named_condition`.
///
/// Past this, new fallback texts are compiled per call and not cached.
pub const MAX_CACHED_FALLBACKS: usize = 128;

/// Lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineState {
    /// Accepting registrations; not yet started.
    #[default]
    Configuring,
    /// Started; events and actions are accepted.
    Ready,
}

/// The decision engine.
///
/// Single owner: every mutating operation takes `&mut self`. Use
/// [`SharedEngine`](super::SharedEngine) to share one engine across threads.
pub struct Engine {
    state: EngineState,
    app_id: Option<String>,
    properties: PropertyRegistry,
    functions: FunctionRegistry,
    events: EventLog,
    host: Option<Arc<dyn HostCapabilities>>,
    config_source: Option<Box<dyn ConfigSource>>,
    config: Option<EngineConfig>,
    triggers: TriggerBinder,
    /// Fallback expressions compiled by `check_named_condition`, by source text.
    fallback_conditions: FxHashMap<String, Condition>,
    condition_log: NamedConditionLog,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine using the standard property tables.
    #[must_use]
    pub fn new() -> Self {
        Self::with_property_tables(PropertyTables::standard())
    }

    /// Create an engine validating properties against custom tables.
    #[must_use]
    pub fn with_property_tables(tables: PropertyTables) -> Self {
        Self {
            state: EngineState::Configuring,
            app_id: None,
            properties: PropertyRegistry::new(tables),
            functions: FunctionRegistry::new(),
            events: EventLog::new(),
            host: None,
            config_source: None,
            config: None,
            triggers: TriggerBinder::new(),
            fallback_conditions: FxHashMap::default(),
            condition_log: NamedConditionLog::new(),
        }
    }

    /// Replace the event log, e.g. with one restored from a snapshot.
    #[must_use]
    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    // === Registration ===

    /// Set the host capability object.
    pub fn set_host(&mut self, host: Arc<dyn HostCapabilities>) {
        self.host = Some(host);
    }

    /// Set where configuration is loaded from.
    pub fn set_config_source(&mut self, source: impl ConfigSource + 'static) {
        self.config_source = Some(Box::new(source));
    }

    /// Set the app id configuration must match.
    ///
    /// Without one, the `app_id` built-in property is used if registered.
    pub fn set_app_id(&mut self, app_id: impl Into<String>) {
        self.app_id = Some(app_id.into());
    }

    /// Register a well-known or custom property provider.
    pub fn register_property_provider(
        &mut self,
        name: &str,
        provider: impl PropertyProvider + 'static,
    ) -> Result<()> {
        self.properties.register_provider(name, provider)
    }

    /// Register a built-in property provider (host library glue).
    pub fn register_builtin_property_provider(
        &mut self,
        name: &str,
        provider: impl PropertyProvider + 'static,
    ) -> Result<()> {
        self.properties.register_builtin_provider(name, provider)
    }

    /// Register a static client property.
    pub fn register_client_property(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.properties.register_client_property(name, value)
    }

    /// Register host functions callable from conditions.
    pub fn register_dynamic_functions(
        &mut self,
        functions: impl IntoIterator<Item = (String, DynamicFunction)>,
    ) -> Result<()> {
        self.functions.register_dynamic(functions)
    }

    // === Lifecycle ===

    /// Load configuration and become ready.
    ///
    /// `allow_unsigned_config` permits configuration whose signature was not
    /// verified; only debug builds should pass `true`.
    ///
    /// On failure the engine stays in `Configuring` with no configuration
    /// retained, and `start` may be called again.
    ///
    /// # Errors
    ///
    /// - `StartupValidation` if already started, if the host or config source
    ///   is missing, for unsigned config when not allowed, for an app id
    ///   mismatch, for failed property validation, or if an engine function
    ///   is missing
    /// - `Config` if the source fails to load
    /// - `InvalidName` for triggers without an event or action name
    /// - `Host` if the host rejects the default theme
    pub fn start(&mut self, allow_unsigned_config: bool) -> Result<()> {
        if self.state == EngineState::Ready {
            return Err(EngineError::StartupValidation(
                "engine already started".to_string(),
            ));
        }
        let host = self
            .host
            .clone()
            .ok_or_else(|| EngineError::StartupValidation("no host capabilities set".to_string()))?;
        let source = self
            .config_source
            .as_ref()
            .ok_or_else(|| EngineError::StartupValidation("no config source set".to_string()))?;

        let bundle = source.load()?;
        if !bundle.signature_verified && !allow_unsigned_config {
            return Err(EngineError::StartupValidation(
                "config signature not verified; unsigned config is only allowed in debug builds"
                    .to_string(),
            ));
        }
        let config = bundle.config;
        self.check_app_id(&config)?;

        self.register_engine_functions(&host)?;
        self.properties.validate_all()?;

        let triggers = TriggerBinder::from_triggers(config.triggers.iter().cloned())?;
        if let Some(theme) = &config.default_theme {
            host.set_default_theme(theme)?;
        }

        tracing::info!(
            app_id = %config.app_id,
            config_version = %config.config_version,
            triggers = triggers.len(),
            actions = config.named_actions.len(),
            "engine started"
        );

        self.triggers = triggers;
        self.config = Some(config);
        self.state = EngineState::Ready;
        Ok(())
    }

    fn check_app_id(&self, config: &EngineConfig) -> Result<()> {
        let expected = match &self.app_id {
            Some(app_id) => Some(app_id.clone()),
            None => match self.properties.value(APP_ID_PROPERTY) {
                Ok(Value::String(app_id)) => Some(app_id),
                _ => None,
            },
        };

        match expected {
            Some(expected) if !config.app_id.is_empty() && config.app_id != expected => {
                Err(EngineError::StartupValidation(format!(
                    "this config file isn't valid for this app: config is for \"{}\", app is \"{expected}\"",
                    config.app_id
                )))
            }
            _ => Ok(()),
        }
    }

    fn register_engine_functions(&mut self, host: &Arc<dyn HostCapabilities>) -> Result<()> {
        self.functions.register_event_functions()?;

        let url_host = Arc::clone(host);
        self.functions.register_dynamic([(
            CAN_OPEN_URL.to_string(),
            DynamicFunction::new([ValueKind::String], move |args| match args {
                [Value::String(url)] => Ok(Value::Bool(url_host.can_open_url(url))),
                _ => Err("expected (string)".to_string()),
            }),
        )])?;

        match BUILT_IN_DYNAMIC_FUNCTIONS
            .iter()
            .find(|name| !self.functions.contains(name))
        {
            Some(missing) => Err(EngineError::StartupValidation(format!(
                "engine function not registered: {missing}"
            ))),
            None => Ok(()),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state == EngineState::Ready
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            EngineState::Ready => Ok(()),
            EngineState::Configuring => Err(EngineError::NotStarted),
        }
    }

    fn ready_parts(&self) -> Result<(&EngineConfig, &dyn HostCapabilities)> {
        match (&self.config, &self.host) {
            (Some(config), Some(host)) if self.state == EngineState::Ready => {
                Ok((config, host.as_ref()))
            }
            _ => Err(EngineError::NotStarted),
        }
    }

    // === Events and actions ===

    /// Record an event and fire its triggers.
    ///
    /// Every bound trigger is attempted, in configuration order, even if an
    /// earlier one fails. Failures are logged and the first one is returned.
    ///
    /// # Errors
    ///
    /// - `NotStarted` before start
    /// - `InvalidEventName` for empty or unrecognized reserved names (nothing recorded)
    /// - The first trigger failure, after all triggers ran
    pub fn send_event(&mut self, name: &str) -> Result<()> {
        self.ensure_ready()?;
        validate_event_name(name)?;
        let count = self.events.record_event(name);
        tracing::debug!(event = %name, count, "event recorded");

        let (config, host) = self.ready_parts()?;
        let ctx = ConditionContext::new(&self.properties, &self.functions, &self.events);
        let resolver = ActionResolver::new(&config.named_actions, &ctx, host);

        let mut first_error = None;
        for trigger in self.triggers.triggers_for_event(name) {
            let fire = match &trigger.condition {
                Some(condition) => ConditionEvaluator::evaluate(condition, &ctx),
                None => Ok(true),
            };
            let result = fire.and_then(|fire| {
                if fire {
                    resolver.perform_named(&trigger.action_name)
                } else {
                    Ok(Outcome::Skipped)
                }
            });

            if let Err(error) = result {
                tracing::warn!(
                    event = %name,
                    action = %trigger.action_name,
                    %error,
                    "trigger failed"
                );
                first_error.get_or_insert(error);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Resolve and dispatch a named action directly.
    ///
    /// # Errors
    ///
    /// - `NotStarted` before start
    /// - `NotFound` if no action has this name
    /// - `UnsupportedActionType` if its fallback chain reaches no known type
    pub fn perform_named_action(&self, name: &str) -> Result<Outcome> {
        let (config, host) = self.ready_parts()?;
        let ctx = ConditionContext::new(&self.properties, &self.functions, &self.events);
        ActionResolver::new(&config.named_actions, &ctx, host).perform_named(name)
    }

    /// Evaluate a named condition.
    ///
    /// Uses the configured override for `name` if there is one, otherwise
    /// `fallback`. The first [`MAX_CACHED_FALLBACKS`] distinct fallback
    /// texts are compiled once and cached; later ones are compiled per call.
    ///
    /// # Errors
    ///
    /// - `NotStarted` before start
    /// - `InvalidName` for an empty name
    /// - `ConditionSyntax` if `fallback` is needed and does not parse
    /// - `ConditionEvaluation` for runtime faults
    pub fn check_named_condition(&mut self, name: &str, fallback: &str) -> Result<bool> {
        self.ensure_ready()?;
        if name.is_empty() {
            return Err(EngineError::InvalidName(
                "named conditions require a name".to_string(),
            ));
        }

        let uncached;
        let configured = self.config.as_ref().and_then(|c| c.condition(name));
        let condition: &Condition = match configured {
            Some(condition) => condition,
            None if self.fallback_conditions.contains_key(fallback)
                || self.fallback_conditions.len() < MAX_CACHED_FALLBACKS =>
            {
                match self.fallback_conditions.entry(fallback.to_string()) {
                    std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                    std::collections::hash_map::Entry::Vacant(entry) => {
                        entry.insert(Condition::parse(fallback)?)
                    }
                }
            }
            None => {
                uncached = Condition::parse(fallback)?;
                &uncached
            }
        };

        let ctx = ConditionContext::new(&self.properties, &self.functions, &self.events);
        ConditionEvaluator::evaluate(condition, &ctx)
    }

    /// Developer check that a condition name is only ever used with one expression.
    ///
    /// Never affects dispatch. Available before start.
    pub fn check_named_condition_collision(
        &mut self,
        name: &str,
        expression: &str,
    ) -> std::result::Result<(), ConditionCollision> {
        self.condition_log.check(name, expression)
    }

    /// Evaluate an ad-hoc condition against current state.
    pub fn evaluate_condition(&self, source: &str) -> Result<bool> {
        self.ensure_ready()?;
        let condition = Condition::parse(source)?;
        let ctx = ConditionContext::new(&self.properties, &self.functions, &self.events);
        ConditionEvaluator::evaluate(&condition, &ctx)
    }

    /// Total occurrences of an event. Readable in any state.
    #[must_use]
    pub fn event_count(&self, name: &str) -> u64 {
        self.events.count(name)
    }

    // === Accessors ===

    /// The loaded configuration, once started.
    #[must_use]
    pub fn config(&self) -> Option<&EngineConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    #[must_use]
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn triggers(&self) -> &TriggerBinder {
        &self.triggers
    }
}
