//! Condition language integration tests.
//!
//! Exercises the evaluator through its public API: registries are built
//! by hand and conditions are compiled with `Condition::parse`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use moment_engine::condition::{
    Condition, ConditionContext, ConditionEvaluator, DynamicFunction, FunctionRegistry,
};
use moment_engine::core::{Value, ValueKind};
use moment_engine::error::EngineError;
use moment_engine::events::EventLog;
use moment_engine::properties::{CallbackProvider, PropertyRegistry, PropertyTables, StaticProvider};

struct Env {
    properties: PropertyRegistry,
    functions: FunctionRegistry,
    events: EventLog,
}

impl Env {
    fn new() -> Self {
        Self {
            properties: PropertyRegistry::new(PropertyTables::standard()),
            functions: FunctionRegistry::new(),
            events: EventLog::new(),
        }
    }

    fn check(&self, source: &str) -> Result<bool, EngineError> {
        let condition = Condition::parse(source)?;
        let ctx = ConditionContext::new(&self.properties, &self.functions, &self.events);
        ConditionEvaluator::evaluate(&condition, &ctx)
    }

    fn value(&self, source: &str) -> Result<Value, EngineError> {
        let condition = Condition::parse(source)?;
        let ctx = ConditionContext::new(&self.properties, &self.functions, &self.events);
        ConditionEvaluator::evaluate_value(&condition, &ctx)
    }

    fn assert_true(&self, source: &str) {
        assert_eq!(self.check(source), Ok(true), "{source}");
    }

    fn assert_eval_error(&self, source: &str) {
        assert!(
            matches!(self.check(source), Err(EngineError::ConditionEvaluation(_))),
            "{source} should fail at evaluation"
        );
    }
}

// === Grammar ===

/// Operator precedence and associativity.
#[test]
fn test_precedence() {
    let env = Env::new();
    env.assert_true("1 + 2 * 3 == 7");
    env.assert_true("(1 + 2) * 3 == 9");
    env.assert_true("2 ** 3 ** 2 == 512");
    env.assert_true("-2 ** 2 == 4 || -2 ** 2 == -4");
    env.assert_true("not false and true");
    env.assert_true("true || false && false");
    env.assert_true("nil ?? 1 > 0");
    assert_eq!(env.value("1 > 2 ? 'yes' : 'no'"), Ok(Value::from("no")));
}

/// Keyword and symbol forms are interchangeable.
#[test]
fn test_keyword_operators() {
    let env = Env::new();
    env.assert_true("(true and true) == (true && true)");
    env.assert_true("(false or true) == (false || true)");
    env.assert_true("(not true) == !true");
    env.assert_true("null == nil");
    env.assert_true("\"double\" == 'double'");
}

/// Syntax errors report where they happened.
#[test]
fn test_syntax_errors_report_position() {
    match Condition::parse("1 + * 2") {
        Err(EngineError::ConditionSyntax { position, source_text, .. }) => {
            assert_eq!(position, 4);
            assert_eq!(source_text, "1 + * 2");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
    assert!(Condition::parse("'unterminated").is_err());
    assert!(Condition::parse("f(1,").is_err());
    assert!(Condition::parse("").is_err());
}

// === Values ===

/// Arithmetic rules: checked ints, float division and powers.
#[test]
fn test_arithmetic() {
    let env = Env::new();
    assert_eq!(env.value("7 / 2"), Ok(Value::Float(3.5)));
    assert_eq!(env.value("7 % 3"), Ok(Value::Int(1)));
    assert_eq!(env.value("2 ** 10"), Ok(Value::Float(1024.0)));
    assert_eq!(env.value("'a' + 'b'"), Ok(Value::from("ab")));
    env.assert_true("2 ** 10 == 1024");

    env.assert_eval_error("1 / 0");
    env.assert_eval_error("1 % 0");
    env.assert_eval_error("9223372036854775807 + 1");
    assert_eq!(env.value("-9223372036854775808"), Ok(Value::Int(i64::MIN)));
    env.assert_eval_error("-9223372036854775808 - 1");
    env.assert_eval_error("-(-9223372036854775808)");
    env.assert_eval_error("1.5 % 1");
}

/// Relational and logical operators demand matching kinds.
#[test]
fn test_type_errors() {
    let env = Env::new();
    env.assert_eval_error("1 < 'a'");
    env.assert_eval_error("nil > 1");
    env.assert_eval_error("true && 1");
    env.assert_eval_error("-'text'");
}

/// Non-boolean results are false.
#[test]
fn test_non_boolean_result() {
    let env = Env::new();
    assert_eq!(env.check("42"), Ok(false));
    assert_eq!(env.check("'true'"), Ok(false));
    assert_eq!(env.check("nil"), Ok(false));
}

// === Environment ===

/// Unregistered variables are nil; custom properties resolve either way.
#[test]
fn test_variable_resolution() {
    let mut env = Env::new();
    env.properties.register_client_property("tier", "gold").unwrap();
    env.properties
        .register_provider("user_signed_in", StaticProvider::new(true))
        .unwrap();

    env.assert_true("tier == 'gold' && custom_tier == 'gold'");
    env.assert_true("user_signed_in");
    env.assert_true("platform == nil");
    env.assert_true("(not_registered ?? 'fallback') == 'fallback'");
}

/// Only properties a condition names are queried.
#[test]
fn test_only_referenced_properties_are_queried() {
    let mut env = Env::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    env.properties
        .register_provider(
            "custom_expensive",
            CallbackProvider::new(ValueKind::Int, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Value::Int(3)
            }),
        )
        .unwrap();

    env.assert_true("1 < 2");
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    env.assert_true("expensive == 3");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// Faults inside providers and host functions come back as errors.
#[test]
fn test_fault_boundary() {
    let mut env = Env::new();
    env.properties
        .register_provider(
            "custom_unstable",
            CallbackProvider::new(ValueKind::Int, || panic!("provider crashed")),
        )
        .unwrap();
    env.functions
        .register_dynamic([(
            "crash".to_string(),
            DynamicFunction::variadic(|_| panic!("host crashed")),
        )])
        .unwrap();

    env.assert_eval_error("unstable == 1");
    env.assert_eval_error("crash()");
    env.assert_true("1 == 1");
}

/// Unknown functions are stubbed; known ones check their arguments.
#[test]
fn test_functions() {
    let mut env = Env::new();
    env.functions
        .register_dynamic([(
            "double".to_string(),
            DynamicFunction::new([ValueKind::Int], |args| match args {
                [Value::Int(n)] => Ok(Value::Int(n * 2)),
                _ => Err("expected int".to_string()),
            })
            .with_signature([ValueKind::Float]),
        )])
        .unwrap();

    env.assert_true("double(21) == 42");
    env.assert_eval_error("double('x')");
    env.assert_eval_error("double(1.5)");
    env.assert_eval_error("double()");

    env.assert_true("notYetInvented(1, 2, 3) == nil");
    env.assert_true("(notYetInvented() ?? 'safe') == 'safe'");
    assert_eq!(env.check("notYetInvented()"), Ok(false));
}

/// Version helpers compare numerically and return nil on junk.
#[test]
fn test_version_helpers() {
    let env = Env::new();
    env.assert_true("versionGreaterThan('2.10.0', '2.9.9')");
    env.assert_true("versionLessThan('v1.2', '1.10')");
    env.assert_true("versionEqual('3', '3.0.0')");
    env.assert_true("versionNumberComponent('5.4.3', 1) == 4");
    env.assert_true("versionEqual('junk', '1.0') == nil");
    env.assert_eval_error("versionEqual(1, 2)");
}
