//! Property registry.
//!
//! The `PropertyRegistry` maps property names to providers and enforces the
//! naming and kind rules from [`PropertyTables`]:
//!
//! - Names are non-empty and use only `[A-Za-z0-9_]`
//! - Built-in names are registered only through the built-in path
//! - Built-in and well-known names must match their expected kind exactly
//! - Any other name carries the `custom_` prefix
//!
//! Client properties registered without the prefix are stored under it, and
//! lookups fall back to the prefixed name, so conditions can use either.

use rustc_hash::FxHashMap;

use crate::core::{Value, ValueKind};
use crate::error::{EngineError, Result};

use super::provider::{PropertyProvider, StaticProvider};
use super::tables::{PropertyTables, CUSTOM_PROPERTY_PREFIX};

/// Which registration path a provider came through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RegistrationPath {
    BuiltIn,
    Public,
}

/// Registry of property providers.
///
/// ## Example
///
/// ```
/// use moment_engine::core::Value;
/// use moment_engine::properties::{PropertyRegistry, PropertyTables};
///
/// let mut registry = PropertyRegistry::new(PropertyTables::standard());
/// registry.register_client_property("favorite_color", "green").unwrap();
///
/// // Reachable with or without the custom prefix
/// assert_eq!(registry.value("favorite_color").unwrap(), Value::from("green"));
/// assert_eq!(registry.value("custom_favorite_color").unwrap(), Value::from("green"));
/// ```
pub struct PropertyRegistry {
    providers: FxHashMap<String, Box<dyn PropertyProvider>>,
    tables: PropertyTables,
}

impl PropertyRegistry {
    /// Create an empty registry using the given tables.
    #[must_use]
    pub fn new(tables: PropertyTables) -> Self {
        Self {
            providers: FxHashMap::default(),
            tables,
        }
    }

    /// The tables this registry validates against.
    #[must_use]
    pub fn tables(&self) -> &PropertyTables {
        &self.tables
    }

    /// Register a provider for a well-known or custom property.
    ///
    /// # Errors
    ///
    /// - `InvalidName` for malformed names or names outside every namespace
    /// - `ReservedName` for built-in names
    /// - `TypeMismatch` if the provider's kind differs from the expected kind
    pub fn register_provider(
        &mut self,
        name: &str,
        provider: impl PropertyProvider + 'static,
    ) -> Result<()> {
        self.add_provider(name, Box::new(provider), RegistrationPath::Public)
    }

    /// Register a provider through the built-in path (host library glue).
    pub fn register_builtin_provider(
        &mut self,
        name: &str,
        provider: impl PropertyProvider + 'static,
    ) -> Result<()> {
        self.add_provider(name, Box::new(provider), RegistrationPath::BuiltIn)
    }

    /// Register a static client-declared property.
    ///
    /// Well-known names keep their name and must match the expected kind;
    /// other names are stored as `custom_<name>`.
    ///
    /// # Errors
    ///
    /// - `ReservedName` for built-in names
    /// - `InvalidValue` for nil or non-property values
    /// - `TypeMismatch` for a well-known name with the wrong kind
    pub fn register_client_property(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();

        if self.tables.is_built_in(name) {
            return Err(EngineError::ReservedName(name.to_string()));
        }
        if !value.kind().is_property_kind() {
            return Err(EngineError::InvalidValue(name.to_string()));
        }

        let key = match self.tables.well_known_kind(name) {
            Some(expected) if expected != value.kind() => {
                return Err(EngineError::TypeMismatch {
                    name: name.to_string(),
                    expected,
                    found: value.kind(),
                });
            }
            Some(_) => name.to_string(),
            None => format!("{CUSTOM_PROPERTY_PREFIX}{name}"),
        };

        self.add_provider(&key, Box::new(StaticProvider::new(value)), RegistrationPath::Public)
    }

    fn add_provider(
        &mut self,
        name: &str,
        provider: Box<dyn PropertyProvider>,
        path: RegistrationPath,
    ) -> Result<()> {
        if !valid_property_name(name) {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        if path == RegistrationPath::Public && self.tables.is_built_in(name) {
            return Err(EngineError::ReservedName(name.to_string()));
        }

        let kind = provider.kind();
        if !kind.is_property_kind() {
            return Err(EngineError::InvalidValue(name.to_string()));
        }

        if !name.starts_with(CUSTOM_PROPERTY_PREFIX) {
            let Some(expected) = self.tables.expected_kind(name) else {
                // Must be custom, built-in or well-known
                return Err(EngineError::InvalidName(name.to_string()));
            };
            if kind != expected {
                return Err(EngineError::TypeMismatch {
                    name: name.to_string(),
                    expected,
                    found: kind,
                });
            }
        }

        if self.providers.contains_key(name) {
            tracing::warn!(property = %name, "re-registering property provider");
        }
        self.providers.insert(name.to_string(), provider);
        Ok(())
    }

    /// Current value of a property.
    ///
    /// Unregistered names are retried with the custom prefix.
    ///
    /// # Errors
    ///
    /// - `NotFound` if neither form is registered
    /// - `TypeMismatch` if a provider returns a value of another kind
    pub fn value(&self, name: &str) -> Result<Value> {
        let (key, provider) = match self.providers.get_key_value(name) {
            Some(found) => found,
            None => self
                .providers
                .get_key_value(format!("{CUSTOM_PROPERTY_PREFIX}{name}").as_str())
                .ok_or_else(|| EngineError::property_not_found(name))?,
        };

        let value = provider.value();
        let declared = provider.kind();
        if !value.is_nil() && value.kind() != declared {
            return Err(EngineError::TypeMismatch {
                name: key.clone(),
                expected: declared,
                found: value.kind(),
            });
        }
        Ok(value)
    }

    /// Declared kind of a registered property (with prefix fallback).
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.providers
            .get(name)
            .or_else(|| self.providers.get(&format!("{CUSTOM_PROPERTY_PREFIX}{name}")))
            .map(|p| p.kind())
    }

    /// Startup integrity check.
    ///
    /// # Errors
    ///
    /// `StartupValidation` naming the first offending property.
    pub fn validate_all(&self) -> Result<()> {
        for (name, expected) in self.tables.built_ins() {
            let allow_missing = self.tables.is_optional_built_in(name);
            self.validate_expected(name, expected, allow_missing)?;
        }

        for (name, expected) in self.tables.well_knowns() {
            self.validate_expected(name, expected, true)?;
        }

        for name in self.providers.keys() {
            let in_tables = self.tables.is_built_in(name) || self.tables.is_well_known(name);
            if !in_tables && !name.starts_with(CUSTOM_PROPERTY_PREFIX) {
                return Err(EngineError::StartupValidation(format!(
                    "property \"{name}\" is not a custom property and is not a built in or well known property"
                )));
            }
        }

        Ok(())
    }

    fn validate_expected(&self, name: &str, expected: ValueKind, allow_missing: bool) -> Result<()> {
        match self.providers.get(name) {
            None if allow_missing => Ok(()),
            None => Err(EngineError::StartupValidation(format!(
                "missing required property: {name}"
            ))),
            Some(provider) if provider.kind() != expected => Err(EngineError::StartupValidation(
                format!("property \"{name}\" of wrong kind; expected {expected}"),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Is a provider registered under exactly this name?
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Iterate over registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

/// Non-empty, not just the prefix, `[A-Za-z0-9_]` only.
fn valid_property_name(name: &str) -> bool {
    !name.is_empty()
        && name != CUSTOM_PROPERTY_PREFIX
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
