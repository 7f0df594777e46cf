//! Engine-version-pinned property tables.
//!
//! Built-in properties are supplied by the host library and are required
//! unless marked optional. Well-known properties have a fixed kind but no
//! registration requirement. Everything else is a custom property and must
//! carry [`CUSTOM_PROPERTY_PREFIX`].

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::ValueKind;

/// Prefix applied to client-declared properties.
pub const CUSTOM_PROPERTY_PREFIX: &str = "custom_";

/// Expected kinds for built-in and well-known property names.
///
/// Loaded once when the engine is constructed; never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct PropertyTables {
    built_in: FxHashMap<&'static str, ValueKind>,
    optional_built_in: FxHashSet<&'static str>,
    well_known: FxHashMap<&'static str, ValueKind>,
}

impl PropertyTables {
    /// The tables for this engine version.
    #[must_use]
    pub fn standard() -> Self {
        use ValueKind::{Bool, Float, Int, String as Str};

        let built_in = [
            ("platform", Str),
            ("os_version", Str),
            ("device_manufacturer", Str),
            ("device_model", Str),
            ("app_version", Str),
            ("app_id", Str),
            ("locale_language_code", Str),
            ("locale_country_code", Str),
            ("screen_width_pixels", Int),
            ("screen_height_pixels", Int),
            ("screen_scale", Float),
            ("device_battery_level", Float),
            ("device_low_power_mode", Bool),
            ("has_network_connection", Bool),
        ];
        let optional = [
            "device_battery_level",
            "device_low_power_mode",
            "locale_country_code",
        ];
        let well_known = [
            ("user_signed_in", Bool),
            ("user_interface_style", Str),
            ("has_active_subscription", Bool),
            ("account_age_days", Int),
            ("lifetime_purchase_total", Float),
            ("user_ring_tier", Str),
        ];

        Self {
            built_in: built_in.into_iter().collect(),
            optional_built_in: optional.into_iter().collect(),
            well_known: well_known.into_iter().collect(),
        }
    }

    /// Tables with no built-in or well-known names.
    ///
    /// Every property must then be custom. Useful for embedding tests.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a built-in property (builder pattern).
    #[must_use]
    pub fn with_built_in(mut self, name: &'static str, kind: ValueKind, optional: bool) -> Self {
        self.built_in.insert(name, kind);
        if optional {
            self.optional_built_in.insert(name);
        }
        self
    }

    /// Add a well-known property (builder pattern).
    #[must_use]
    pub fn with_well_known(mut self, name: &'static str, kind: ValueKind) -> Self {
        self.well_known.insert(name, kind);
        self
    }

    /// Expected kind of a built-in property.
    #[must_use]
    pub fn built_in_kind(&self, name: &str) -> Option<ValueKind> {
        self.built_in.get(name).copied()
    }

    /// Expected kind of a well-known property.
    #[must_use]
    pub fn well_known_kind(&self, name: &str) -> Option<ValueKind> {
        self.well_known.get(name).copied()
    }

    /// Expected kind for any table name (built-in first).
    #[must_use]
    pub fn expected_kind(&self, name: &str) -> Option<ValueKind> {
        self.built_in_kind(name).or_else(|| self.well_known_kind(name))
    }

    #[must_use]
    pub fn is_built_in(&self, name: &str) -> bool {
        self.built_in.contains_key(name)
    }

    #[must_use]
    pub fn is_well_known(&self, name: &str) -> bool {
        self.well_known.contains_key(name)
    }

    #[must_use]
    pub fn is_optional_built_in(&self, name: &str) -> bool {
        self.optional_built_in.contains(name)
    }

    /// Built-in names and kinds.
    pub fn built_ins(&self) -> impl Iterator<Item = (&'static str, ValueKind)> + '_ {
        self.built_in.iter().map(|(k, v)| (*k, *v))
    }

    /// Well-known names and kinds.
    pub fn well_knowns(&self) -> impl Iterator<Item = (&'static str, ValueKind)> + '_ {
        self.well_known.iter().map(|(k, v)| (*k, *v))
    }
}
