//! Functions and constants available to conditions.
//!
//! Three sources make up the set of known functions:
//! - Static helpers, always present (version comparison)
//! - Event-count intrinsics, registered by the engine at start
//! - Host functions, registered through
//!   [`Engine::register_dynamic_functions`](crate::engine::Engine::register_dynamic_functions)
//!
//! Any function a condition calls that is not known is bound to a stub
//! returning nil, so conditions written for newer engines keep working.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{Value, ValueKind};
use crate::error::{EngineError, Result};

/// Name of the total event count intrinsic.
pub const EVENT_COUNT: &str = "eventCount";

/// Name of the limited event count intrinsic.
pub const EVENT_COUNT_WITH_LIMIT: &str = "eventCountWithLimit";

/// Name of the URL capability check backed by the host.
pub const CAN_OPEN_URL: &str = "canOpenUrl";

/// Functions the engine itself registers during start.
pub const BUILT_IN_DYNAMIC_FUNCTIONS: &[&str] = &[EVENT_COUNT, EVENT_COUNT_WITH_LIMIT, CAN_OPEN_URL];

/// Host function body.
///
/// Returning `Err` surfaces as a condition evaluation error.
pub type HostFn = Arc<dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync>;

type StaticFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// Exact parameter kinds for one overload of a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(SmallVec<[ValueKind; 3]>);

impl Signature {
    /// Create a signature from parameter kinds.
    pub fn new(params: impl IntoIterator<Item = ValueKind>) -> Self {
        Self(params.into_iter().collect())
    }

    /// Parameter kinds.
    #[must_use]
    pub fn params(&self) -> &[ValueKind] {
        &self.0
    }

    /// Do the arguments match exactly (arity and kind)?
    #[must_use]
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.0.len() == args.len() && self.0.iter().zip(args).all(|(k, v)| *k == v.kind())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{kind}")?;
        }
        write!(f, ")")
    }
}

/// A host-registered function with its accepted signatures.
///
/// An empty signature list accepts any arguments.
#[derive(Clone)]
pub struct DynamicFunction {
    pub signatures: Vec<Signature>,
    pub body: HostFn,
}

impl DynamicFunction {
    /// Create a function with a single signature.
    pub fn new(
        params: impl IntoIterator<Item = ValueKind>,
        body: impl Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            signatures: vec![Signature::new(params)],
            body: Arc::new(body),
        }
    }

    /// Create a function that accepts any arguments.
    pub fn variadic(
        body: impl Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            signatures: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Add another accepted overload (builder pattern).
    #[must_use]
    pub fn with_signature(mut self, params: impl IntoIterator<Item = ValueKind>) -> Self {
        self.signatures.push(Signature::new(params));
        self
    }
}

impl fmt::Debug for DynamicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicFunction")
            .field("signatures", &self.signatures)
            .finish_non_exhaustive()
    }
}

/// How a known function is executed.
#[derive(Clone)]
pub(crate) enum FunctionBody {
    Static(StaticFn),
    Host(HostFn),
    EventCount,
    EventCountWithLimit,
}

/// A known function: signatures plus body.
#[derive(Clone)]
pub(crate) struct ConditionFunction {
    pub signatures: Vec<Signature>,
    pub body: FunctionBody,
}

impl ConditionFunction {
    fn fixed(params: &[ValueKind], body: FunctionBody) -> Self {
        Self {
            signatures: vec![Signature::new(params.iter().copied())],
            body,
        }
    }

    /// Validate arguments against the declared signatures.
    pub fn check_args(&self, name: &str, args: &[Value]) -> Result<()> {
        if self.signatures.is_empty() || self.signatures.iter().any(|s| s.accepts(args)) {
            return Ok(());
        }
        let given: Vec<String> = args.iter().map(|a| a.kind().to_string()).collect();
        let expected: Vec<String> = self.signatures.iter().map(ToString::to_string).collect();
        Err(EngineError::ConditionEvaluation(format!(
            "invalid arguments for {name}({}); expected {}",
            given.join(", "),
            expected.join(" or ")
        )))
    }
}

/// Known functions and constants for condition evaluation.
#[derive(Clone)]
pub struct FunctionRegistry {
    statics: FxHashMap<&'static str, ConditionFunction>,
    dynamic: FxHashMap<String, ConditionFunction>,
    constants: FxHashMap<&'static str, Value>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a registry with the static helpers and constants.
    #[must_use]
    pub fn new() -> Self {
        use ValueKind::{Int, String as Str};

        let mut statics = FxHashMap::default();
        statics.insert(
            "versionNumberComponent",
            ConditionFunction::fixed(&[Str, Int], FunctionBody::Static(version_number_component)),
        );
        statics.insert(
            "versionGreaterThan",
            ConditionFunction::fixed(&[Str, Str], FunctionBody::Static(version_greater_than)),
        );
        statics.insert(
            "versionLessThan",
            ConditionFunction::fixed(&[Str, Str], FunctionBody::Static(version_less_than)),
        );
        statics.insert(
            "versionEqual",
            ConditionFunction::fixed(&[Str, Str], FunctionBody::Static(version_equal)),
        );

        let mut constants = FxHashMap::default();
        constants.insert("engine_version", Value::from(env!("CARGO_PKG_VERSION")));

        Self {
            statics,
            dynamic: FxHashMap::default(),
            constants,
        }
    }

    /// Register host functions.
    ///
    /// Fails with `ReservedName` if a name collides with a static helper
    /// and with `InvalidName` if a name is not a valid identifier.
    /// Re-registering a dynamic name replaces it.
    pub fn register_dynamic(&mut self, functions: impl IntoIterator<Item = (String, DynamicFunction)>) -> Result<()> {
        for (name, function) in functions {
            self.insert_dynamic(
                name,
                ConditionFunction {
                    signatures: function.signatures,
                    body: FunctionBody::Host(function.body),
                },
            )?;
        }
        Ok(())
    }

    /// Register the event-count intrinsics.
    pub(crate) fn register_event_functions(&mut self) -> Result<()> {
        use ValueKind::{Int, String as Str};

        self.insert_dynamic(
            EVENT_COUNT.to_string(),
            ConditionFunction::fixed(&[Str], FunctionBody::EventCount),
        )?;
        self.insert_dynamic(
            EVENT_COUNT_WITH_LIMIT.to_string(),
            ConditionFunction::fixed(&[Str, Int], FunctionBody::EventCountWithLimit),
        )
    }

    fn insert_dynamic(&mut self, name: String, function: ConditionFunction) -> Result<()> {
        if !is_identifier(&name) {
            return Err(EngineError::InvalidName(name));
        }
        if self.statics.contains_key(name.as_str()) {
            return Err(EngineError::ReservedName(name));
        }
        if self.dynamic.contains_key(&name) {
            tracing::warn!(function = %name, "re-registering condition function");
        }
        self.dynamic.insert(name, function);
        Ok(())
    }

    /// Look up a known function.
    pub(crate) fn get(&self, name: &str) -> Option<&ConditionFunction> {
        self.statics.get(name).or_else(|| self.dynamic.get(name))
    }

    /// Is this function known (static or dynamic)?
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up a static constant.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Names of all registered dynamic functions.
    pub fn dynamic_names(&self) -> impl Iterator<Item = &str> {
        self.dynamic.keys().map(String::as_str)
    }

    /// Names of all known functions.
    pub fn known_names(&self) -> impl Iterator<Item = &str> {
        self.statics.keys().copied().chain(self.dynamic_names())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// === Version helpers ===

/// Parse a dotted version like `v1.2.3` or `2.0-beta` into numeric components.
fn parse_version(text: &str) -> Option<SmallVec<[u64; 4]>> {
    let trimmed = text.trim().trim_start_matches(['v', 'V']);
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split('.')
        .map(|part| {
            let digits: &str = &part[..part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len())];
            digits.parse::<u64>().ok()
        })
        .collect()
}

fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let a = parse_version(a)?;
    let b = parse_version(b)?;
    let len = a.len().max(b.len());
    let component = |v: &[u64], i: usize| v.get(i).copied().unwrap_or(0);
    Some(
        (0..len)
            .map(|i| component(&a, i).cmp(&component(&b, i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal),
    )
}

fn string_args(args: &[Value]) -> std::result::Result<(&str, &str), String> {
    match args {
        [Value::String(a), Value::String(b)] => Ok((a, b)),
        _ => Err("expected two strings".to_string()),
    }
}

fn version_number_component(args: &[Value]) -> std::result::Result<Value, String> {
    let [Value::String(version), Value::Int(index)] = args else {
        return Err("expected (string, int)".to_string());
    };
    let component = usize::try_from(*index)
        .ok()
        .zip(parse_version(version))
        .and_then(|(i, parts)| parts.get(i).copied())
        .and_then(|v| i64::try_from(v).ok());
    Ok(component.map_or(Value::Nil, Value::Int))
}

fn version_greater_than(args: &[Value]) -> std::result::Result<Value, String> {
    let (a, b) = string_args(args)?;
    Ok(compare_versions(a, b).map_or(Value::Nil, |o| Value::Bool(o.is_gt())))
}

fn version_less_than(args: &[Value]) -> std::result::Result<Value, String> {
    let (a, b) = string_args(args)?;
    Ok(compare_versions(a, b).map_or(Value::Nil, |o| Value::Bool(o.is_lt())))
}

fn version_equal(args: &[Value]) -> std::result::Result<Value, String> {
    let (a, b) = string_args(args)?;
    Ok(compare_versions(a, b).map_or(Value::Nil, |o| Value::Bool(o.is_eq())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_accepts_exact() {
        let sig = Signature::new([ValueKind::String, ValueKind::Int]);
        assert!(sig.accepts(&[Value::from("a"), Value::Int(1)]));
        assert!(!sig.accepts(&[Value::from("a")]));
        assert!(!sig.accepts(&[Value::from("a"), Value::Float(1.0)]));
        assert!(!sig.accepts(&[Value::Int(1), Value::from("a")]));
        assert_eq!(sig.to_string(), "(string, int)");
    }

    #[test]
    fn test_check_args_message() {
        let registry = FunctionRegistry::new();
        let f = registry.get("versionEqual").unwrap();
        let err = f.check_args("versionEqual", &[Value::Int(1)]).unwrap_err();
        assert!(err.to_string().contains("versionEqual(int)"));
    }

    #[test]
    fn test_variadic_accepts_anything() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_dynamic([("anything".to_string(), DynamicFunction::variadic(|_| Ok(Value::Nil)))])
            .unwrap();
        let f = registry.get("anything").unwrap();
        assert!(f.check_args("anything", &[]).is_ok());
        assert!(f.check_args("anything", &[Value::Int(1), Value::Nil]).is_ok());
    }

    #[test]
    fn test_static_names_are_reserved() {
        let mut registry = FunctionRegistry::new();
        let result = registry.register_dynamic([(
            "versionEqual".to_string(),
            DynamicFunction::variadic(|_| Ok(Value::Nil)),
        )]);
        assert!(matches!(result, Err(EngineError::ReservedName(_))));

        let result = registry.register_dynamic([(
            "bad name".to_string(),
            DynamicFunction::variadic(|_| Ok(Value::Nil)),
        )]);
        assert!(matches!(result, Err(EngineError::InvalidName(_))));
    }

    #[test]
    fn test_event_functions_registration() {
        let mut registry = FunctionRegistry::new();
        assert!(!registry.contains(EVENT_COUNT));
        registry.register_event_functions().unwrap();
        assert!(registry.contains(EVENT_COUNT));
        assert!(registry.contains(EVENT_COUNT_WITH_LIMIT));
        let mut names: Vec<&str> = registry.dynamic_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec![EVENT_COUNT, EVENT_COUNT_WITH_LIMIT]);
    }

    #[test]
    fn test_constants() {
        let registry = FunctionRegistry::new();
        assert_eq!(
            registry.constant("engine_version"),
            Some(&Value::from(env!("CARGO_PKG_VERSION")))
        );
        assert!(registry.constant("nope").is_none());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3").unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(parse_version("v10.0").unwrap().as_slice(), &[10, 0]);
        assert_eq!(parse_version("2.1-beta").unwrap().as_slice(), &[2, 1]);
        assert!(parse_version("").is_none());
        assert!(parse_version("abc").is_none());
        assert!(parse_version("1..2").is_none());
    }

    #[test]
    fn test_version_comparison() {
        let args = |a: &str, b: &str| [Value::from(a), Value::from(b)];
        assert_eq!(version_greater_than(&args("1.10", "1.9")), Ok(Value::Bool(true)));
        assert_eq!(version_less_than(&args("1.9", "1.10")), Ok(Value::Bool(true)));
        assert_eq!(version_equal(&args("1.0", "1.0.0")), Ok(Value::Bool(true)));
        assert_eq!(version_equal(&args("1.0", "junk")), Ok(Value::Nil));
    }

    #[test]
    fn test_version_number_component() {
        let call = |v: &str, i: i64| version_number_component(&[Value::from(v), Value::Int(i)]);
        assert_eq!(call("4.5.6", 0), Ok(Value::Int(4)));
        assert_eq!(call("4.5.6", 2), Ok(Value::Int(6)));
        assert_eq!(call("4.5.6", 3), Ok(Value::Nil));
        assert_eq!(call("4.5.6", -1), Ok(Value::Nil));
    }
}
