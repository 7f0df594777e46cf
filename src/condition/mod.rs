//! Condition expression language.
//!
//! Conditions are small, dynamically-typed expressions that decide whether
//! a trigger fires or an action runs.
//!
//! ## Key Components
//!
//! - [`Condition`]: Parsed expression plus the identifiers it references
//! - [`FunctionRegistry`]: Static helpers, event-count intrinsics, host functions
//! - [`ConditionEvaluator`]: Runs a condition against a [`ConditionContext`]
//!
//! ## Forward Compatibility
//!
//! Configuration may be written for a newer engine than the one running it.
//! Unregistered variables evaluate to `nil` and unknown functions return
//! `nil`, so authors can write `newProperty ?? true` and keep older engines
//! working. Wrong arguments to a *known* function are still an error.
//!
//! ## Example
//!
//! ```
//! use moment_engine::condition::{Condition, ConditionContext, ConditionEvaluator, FunctionRegistry};
//! use moment_engine::events::EventLog;
//! use moment_engine::properties::{PropertyRegistry, PropertyTables};
//!
//! let mut properties = PropertyRegistry::new(PropertyTables::empty());
//! properties.register_client_property("level", 7i64).unwrap();
//! let functions = FunctionRegistry::new();
//! let events = EventLog::new();
//!
//! let condition = Condition::parse("level >= 5 && (brandNewFlag ?? true)").unwrap();
//! let ctx = ConditionContext::new(&properties, &functions, &events);
//! assert!(ConditionEvaluator::evaluate(&condition, &ctx).unwrap());
//! ```

mod eval;
mod functions;
mod lexer;
mod parser;

pub use eval::{ConditionContext, ConditionEvaluator};
pub use functions::{
    DynamicFunction, FunctionRegistry, HostFn, Signature, BUILT_IN_DYNAMIC_FUNCTIONS,
    CAN_OPEN_URL, EVENT_COUNT, EVENT_COUNT_WITH_LIMIT,
};
pub use parser::{
    BinaryOp, Condition, ConditionFields, Expr, UnaryOp, MAX_EXPRESSION_DEPTH,
    MAX_EXPRESSION_TOKENS,
};
