//! Condition evaluation.
//!
//! Evaluation happens in two phases:
//!
//! 1. **Close** the environment: every variable the condition references is
//!    resolved (constants, then properties; unregistered properties become
//!    nil) and every function it calls is bound to a known function or a
//!    nil-returning stub.
//! 2. **Execute** the tree against that closed environment.
//!
//! Both phases run inside a fault boundary. Type errors, arithmetic faults
//! and panics raised by host callbacks all come back as
//! [`EngineError::ConditionEvaluation`].

use std::any::Any;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};

use rustc_hash::FxHashMap;

use crate::core::Value;
use crate::error::{EngineError, Result};
use crate::events::EventLog;
use crate::properties::PropertyRegistry;

use super::functions::{ConditionFunction, FunctionBody, FunctionRegistry};
use super::parser::{BinaryOp, Condition, ConditionFields, Expr, UnaryOp};

/// Everything a condition may read.
pub struct ConditionContext<'a> {
    /// Property values.
    pub properties: &'a PropertyRegistry,
    /// Static, intrinsic and host functions plus constants.
    pub functions: &'a FunctionRegistry,
    /// Event counts for the count intrinsics.
    pub events: &'a EventLog,
}

impl<'a> ConditionContext<'a> {
    /// Create a new context.
    pub fn new(
        properties: &'a PropertyRegistry,
        functions: &'a FunctionRegistry,
        events: &'a EventLog,
    ) -> Self {
        Self {
            properties,
            functions,
            events,
        }
    }
}

/// Evaluator for compiled conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate a condition to a boolean.
    ///
    /// A result that is not a bool counts as `false`.
    ///
    /// # Errors
    ///
    /// `ConditionEvaluation` for any runtime fault; registry errors other
    /// than a missing property propagate unchanged.
    pub fn evaluate(condition: &Condition, ctx: &ConditionContext<'_>) -> Result<bool> {
        Ok(Self::evaluate_value(condition, ctx)?
            .as_bool()
            .unwrap_or(false))
    }

    /// Evaluate a condition to its raw value.
    pub fn evaluate_value(condition: &Condition, ctx: &ConditionContext<'_>) -> Result<Value> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let env = Environment::close(condition.fields(), ctx)?;
            env.eval(condition.expr())
        }));

        outcome.unwrap_or_else(|payload| {
            Err(EngineError::ConditionEvaluation(format!(
                "evaluation of \"{}\" panicked: {}",
                condition.source(),
                panic_message(payload.as_ref())
            )))
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// A function name as bound in the closed environment.
enum Bound<'a> {
    Known(&'a ConditionFunction),
    Stub,
}

/// Closed environment for one evaluation.
struct Environment<'a> {
    variables: FxHashMap<&'a str, Value>,
    functions: FxHashMap<&'a str, Bound<'a>>,
    events: &'a EventLog,
}

impl<'a> Environment<'a> {
    fn close(fields: &'a ConditionFields, ctx: &ConditionContext<'a>) -> Result<Self> {
        let mut variables = FxHashMap::default();
        for name in &fields.variables {
            let value = match ctx.functions.constant(name) {
                Some(constant) => constant.clone(),
                None => match ctx.properties.value(name) {
                    Ok(value) => value,
                    Err(EngineError::NotFound { .. }) => Value::Nil,
                    Err(e) => return Err(e),
                },
            };
            variables.insert(name.as_str(), value);
        }

        let mut functions = FxHashMap::default();
        for name in &fields.functions {
            let bound = match ctx.functions.get(name) {
                Some(function) => Bound::Known(function),
                None => {
                    tracing::debug!(function = %name, "stubbing unknown condition function");
                    Bound::Stub
                }
            };
            functions.insert(name.as_str(), bound);
        }

        Ok(Self {
            variables,
            functions,
            events: ctx.events,
        })
    }

    fn eval(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Variable(name) => Ok(self
                .variables
                .get(name.as_str())
                .cloned()
                .unwrap_or_default()),

            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),

            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>>>()?;
                self.call(name, &args)
            }

            Expr::Unary { op, expr } => {
                let value = self.eval(expr)?;
                unary(*op, &value)
            }

            Expr::Binary { op, left, right } => self.binary(*op, left, right),

            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => match self.eval(condition)? {
                Value::Bool(true) => self.eval(then),
                Value::Bool(false) => self.eval(otherwise),
                other => Err(fault(format!(
                    "ternary condition must be bool, found {}",
                    other.kind()
                ))),
            },
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let lhs = self.logical_operand(op, left)?;
                // Short-circuit
                if (op == BinaryOp::And && !lhs) || (op == BinaryOp::Or && lhs) {
                    return Ok(Value::Bool(lhs));
                }
                self.logical_operand(op, right).map(Value::Bool)
            }
            BinaryOp::Coalesce => match self.eval(left)? {
                Value::Nil => self.eval(right),
                value => Ok(value),
            },
            _ => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                apply_binary(op, &lhs, &rhs)
            }
        }
    }

    fn logical_operand(&self, op: BinaryOp, expr: &Expr) -> Result<bool> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(fault(format!(
                "operator {op} expects bool operands, found {}",
                other.kind()
            ))),
        }
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let function = match self.functions.get(name) {
            Some(Bound::Known(function)) => *function,
            Some(Bound::Stub) | None => return Ok(Value::Nil),
        };
        function.check_args(name, args)?;

        match &function.body {
            FunctionBody::Static(body) => body(args).map_err(|e| fault(format!("{name}: {e}"))),
            FunctionBody::Host(body) => body(args).map_err(|e| fault(format!("{name}: {e}"))),
            FunctionBody::EventCount => match args {
                [Value::String(event)] => count_value(self.events.count(event)),
                _ => Err(fault(format!("{name}: expected (string)"))),
            },
            FunctionBody::EventCountWithLimit => match args {
                [Value::String(event), Value::Int(limit)] => {
                    let limit = u64::try_from(*limit)
                        .map_err(|_| fault(format!("{name}: limit must not be negative")))?;
                    count_value(self.events.count_with_limit(event, limit))
                }
                _ => Err(fault(format!("{name}: expected (string, int)"))),
            },
        }
    }
}

fn fault(message: impl Into<String>) -> EngineError {
    EngineError::ConditionEvaluation(message.into())
}

fn count_value(count: u64) -> Result<Value> {
    i64::try_from(count)
        .map(Value::Int)
        .map_err(|_| fault("event count out of range"))
}

fn unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| fault("integer overflow in negation")),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Not, other) => Err(fault(format!("cannot apply ! to {}", other.kind()))),
        (UnaryOp::Neg, other) => Err(fault(format!("cannot negate {}", other.kind()))),
    }
}

fn type_error(op: BinaryOp, lhs: &Value, rhs: &Value) -> EngineError {
    fault(format!(
        "invalid operation: {} {op} {}",
        lhs.kind(),
        rhs.kind()
    ))
}

/// Integer arithmetic with overflow detection, float arithmetic otherwise.
fn arithmetic(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| fault(format!("integer overflow in {a} {op} {b}"))),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(type_error(op, lhs, rhs)),
        },
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Ordering> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(type_error(op, lhs, rhs)),
        },
    };
    // NaN compares false in every direction
    ordering.ok_or_else(|| fault("comparison with NaN"))
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(lhs.loose_eq(rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!lhs.loose_eq(rhs))),

        BinaryOp::Lt => compare(op, lhs, rhs).map(|o| Value::Bool(o.is_lt())),
        BinaryOp::Le => compare(op, lhs, rhs).map(|o| Value::Bool(o.is_le())),
        BinaryOp::Gt => compare(op, lhs, rhs).map(|o| Value::Bool(o.is_gt())),
        BinaryOp::Ge => compare(op, lhs, rhs).map(|o| Value::Bool(o.is_ge())),

        BinaryOp::In => match (lhs, rhs) {
            (_, Value::Array(items)) => Ok(Value::Bool(items.iter().any(|v| v.loose_eq(lhs)))),
            (Value::String(needle), Value::String(haystack)) => {
                Ok(Value::Bool(haystack.contains(needle.as_str())))
            }
            _ => Err(type_error(op, lhs, rhs)),
        },

        BinaryOp::Contains | BinaryOp::StartsWith | BinaryOp::EndsWith => match (lhs, rhs) {
            (Value::String(a), Value::String(b)) => Ok(Value::Bool(match op {
                BinaryOp::Contains => a.contains(b.as_str()),
                BinaryOp::StartsWith => a.starts_with(b.as_str()),
                _ => a.ends_with(b.as_str()),
            })),
            _ => Err(type_error(op, lhs, rhs)),
        },

        BinaryOp::Add => match (lhs, rhs) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => arithmetic(op, lhs, rhs, i64::checked_add, |a, b| a + b),
        },
        BinaryOp::Sub => arithmetic(op, lhs, rhs, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => arithmetic(op, lhs, rhs, i64::checked_mul, |a, b| a * b),

        BinaryOp::Div => match (lhs.as_float(), rhs.as_float()) {
            (Some(_), Some(b)) if b == 0.0 => Err(fault("division by zero")),
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(type_error(op, lhs, rhs)),
        },

        BinaryOp::Mod => match (lhs, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(fault("modulo by zero")),
            (Value::Int(a), Value::Int(b)) => a
                .checked_rem(*b)
                .map(Value::Int)
                .ok_or_else(|| fault(format!("integer overflow in {a} % {b}"))),
            _ => Err(type_error(op, lhs, rhs)),
        },

        BinaryOp::Pow => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
            _ => Err(type_error(op, lhs, rhs)),
        },

        // Handled lazily by the caller
        BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => Err(type_error(op, lhs, rhs)),
    }
}
