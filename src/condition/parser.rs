//! Condition parsing and static identifier extraction.
//!
//! A [`Condition`] is parsed once from its source text. Parsing also walks
//! the tree to collect the free variables and function names it uses, so
//! the evaluator can build a closed environment without touching anything
//! the condition does not reference.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::Value;
use crate::error::{EngineError, Result};

use super::lexer::{tokenize, Spanned, Token};

/// Maximum nesting depth accepted by the parser.
///
/// Bounds the recursion of both parsing and evaluation.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

/// Maximum number of tokens in one condition.
///
/// Operator chains like `a + b + c` build left-deep trees without nesting,
/// so the token count is what bounds the final tree height.
pub const MAX_EXPRESSION_TOKENS: usize = 1024;

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Coalesce,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::Contains => "contains",
            BinaryOp::StartsWith => "startsWith",
            BinaryOp::EndsWith => "endsWith",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        };
        f.write_str(symbol)
    }
}

/// Parsed expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Array(Vec<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// Identifiers referenced by a condition.
///
/// Names appear once each, in order of first use.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionFields {
    /// Free variable names.
    pub variables: Vec<String>,
    /// Called function names.
    pub functions: Vec<String>,
}

impl ConditionFields {
    fn collect(expr: &Expr) -> Self {
        let mut fields = Self::default();
        fields.visit(expr);
        fields
    }

    fn visit(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Variable(name) => push_unique(&mut self.variables, name),
            Expr::Array(items) => items.iter().for_each(|e| self.visit(e)),
            Expr::Call { name, args } => {
                push_unique(&mut self.functions, name);
                args.iter().for_each(|e| self.visit(e));
            }
            Expr::Unary { expr, .. } => self.visit(expr),
            Expr::Binary { left, right, .. } => {
                self.visit(left);
                self.visit(right);
            }
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => {
                self.visit(condition);
                self.visit(then);
                self.visit(otherwise);
            }
        }
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

/// A compiled condition.
///
/// ## Example
///
/// ```
/// use moment_engine::condition::Condition;
///
/// let condition = Condition::parse("eventCount('launch') > 3 && (user_signed_in ?? false)").unwrap();
/// assert_eq!(condition.fields().functions, vec!["eventCount"]);
/// assert_eq!(condition.fields().variables, vec!["user_signed_in"]);
/// ```
#[derive(Clone, Debug)]
pub struct Condition {
    source: String,
    expr: Expr,
    fields: ConditionFields,
}

impl Condition {
    /// Parse condition text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConditionSyntax`] if the text is not a valid expression.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let tokens = tokenize(&source)?;
        if tokens.len() > MAX_EXPRESSION_TOKENS {
            return Err(EngineError::ConditionSyntax {
                position: tokens[MAX_EXPRESSION_TOKENS].position,
                source_text: source,
                message: format!("condition exceeds {MAX_EXPRESSION_TOKENS} tokens"),
            });
        }
        let expr = Parser::new(&source, tokens).parse()?;
        let fields = ConditionFields::collect(&expr);
        Ok(Self {
            source,
            expr,
            fields,
        })
    }

    /// The original condition text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Variables and functions referenced by this condition.
    #[must_use]
    pub fn fields(&self) -> &ConditionFields {
        &self.fields
    }

    /// The parsed expression tree.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Condition {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Condition::parse(source).map_err(serde::de::Error::custom)
    }
}

/// Recursive-descent parser.
///
/// Precedence, loosest first: ternary, `??`, `||`, `&&`, equality,
/// relational/membership, additive, multiplicative, `**`, unary, call.
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Spanned>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Expr> {
        if self.peek() == &Token::Eof {
            return Err(self.error_here("empty condition"));
        }
        let expr = self.ternary()?;
        if self.peek() != &Token::Eof {
            let found = self.peek().describe();
            return Err(self.error_here(format!("unexpected {found}")));
        }
        Ok(expr)
    }

    fn peek(&self) -> &Token {
        // tokenize always terminates with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn position(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].position
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            let found = self.peek().describe();
            Err(self.error_here(format!("expected {}, found {found}", token.describe())))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> EngineError {
        EngineError::ConditionSyntax {
            source_text: self.source.to_string(),
            position: self.position(),
            message: message.into(),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(self.error_here("expression nested too deeply"));
        }
        Ok(())
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn ternary(&mut self) -> Result<Expr> {
        self.enter()?;
        let condition = self.coalesce()?;
        let expr = if self.eat(&Token::Question) {
            let then = self.ternary()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.ternary()?;
            Expr::Ternary {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            condition
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn coalesce(&mut self) -> Result<Expr> {
        let mut left = self.or()?;
        while self.eat(&Token::QuestionQuestion) {
            let right = self.or()?;
            left = Self::binary(BinaryOp::Coalesce, left, right);
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut left = self.and()?;
        while matches!(self.peek(), Token::OrOr | Token::Or) {
            self.advance();
            let right = self.and()?;
            left = Self::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut left = self.equality()?;
        while matches!(self.peek(), Token::AndAnd | Token::And) {
            self.advance();
            let right = self.equality()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut left = self.relational()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.relational()?;
            left = Self::binary(op, left, right);
        }
    }

    fn relational(&mut self) -> Result<Expr> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                Token::In => BinaryOp::In,
                Token::Contains => BinaryOp::Contains,
                Token::StartsWith => BinaryOp::StartsWith,
                Token::EndsWith => BinaryOp::EndsWith,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.additive()?;
            left = Self::binary(op, left, right);
        }
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = Self::binary(op, left, right);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.power()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.power()?;
            left = Self::binary(op, left, right);
        }
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.unary()?;
        if self.eat(&Token::StarStar) {
            self.enter()?;
            let exponent = self.power()?;
            self.depth -= 1;
            return Ok(Self::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Token::Bang | Token::Not => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.primary(),
        };
        self.advance();

        // `i64::MIN` has no positive literal to negate.
        if op == UnaryOp::Neg && *self.peek() == Token::Int(i64::MIN.unsigned_abs()) {
            self.advance();
            return Ok(Expr::Literal(Value::Int(i64::MIN)));
        }

        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;

        // Fold negative numeric literals.
        if op == UnaryOp::Neg {
            match operand {
                Expr::Literal(Value::Int(v)) if v != i64::MIN => {
                    return Ok(Expr::Literal(Value::Int(-v)));
                }
                Expr::Literal(Value::Float(v)) => return Ok(Expr::Literal(Value::Float(-v))),
                _ => {}
            }
        }
        Ok(Expr::Unary {
            op,
            expr: Box::new(operand),
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let start = self.position();
        match self.advance() {
            Token::Int(v) => i64::try_from(v)
                .map(|v| Expr::Literal(Value::Int(v)))
                .map_err(|_| EngineError::ConditionSyntax {
                    source_text: self.source.to_string(),
                    position: start,
                    message: format!("integer literal `{v}` out of range"),
                }),
            Token::Float(v) => Ok(Expr::Literal(Value::Float(v))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Nil => Ok(Expr::Literal(Value::Nil)),
            Token::LParen => {
                let inner = self.ternary()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                let items = self.list(&Token::RBracket)?;
                Ok(Expr::Array(items))
            }
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.list(&Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            other => Err(EngineError::ConditionSyntax {
                source_text: self.source.to_string(),
                position: start,
                message: format!("unexpected {}", other.describe()),
            }),
        }
    }

    /// Comma-separated expressions up to `close` (already past the opener).
    fn list(&mut self, close: &Token) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.ternary()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&Token::Comma)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Expr {
        Condition::parse(source).unwrap().expr().clone()
    }

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable(name.into()))
    }

    #[test]
    fn test_precedence_and_over_or() {
        assert_eq!(
            parse("a || b && c"),
            Expr::Binary {
                op: BinaryOp::Or,
                left: var("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::And,
                    left: var("b"),
                    right: var("c"),
                }),
            }
        );
    }

    #[test]
    fn test_precedence_arithmetic() {
        assert_eq!(
            parse("1 + 2 * 3"),
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Literal(Value::Int(1))),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expr::Literal(Value::Int(2))),
                    right: Box::new(Expr::Literal(Value::Int(3))),
                }),
            }
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let Expr::Binary { op, right, .. } = parse("2 ** 3 ** 2") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Pow);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn test_coalesce_binds_looser_than_or() {
        let Expr::Binary { op, .. } = parse("a || b ?? true") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Coalesce);
    }

    #[test]
    fn test_ternary() {
        assert!(matches!(parse("a ? 1 : 2"), Expr::Ternary { .. }));
        assert!(matches!(parse("a ?? b ? 1 : 2"), Expr::Ternary { .. }));
    }

    #[test]
    fn test_calls_and_arrays() {
        assert_eq!(
            parse("f(1, [2, x])"),
            Expr::Call {
                name: "f".into(),
                args: vec![
                    Expr::Literal(Value::Int(1)),
                    Expr::Array(vec![Expr::Literal(Value::Int(2)), Expr::Variable("x".into())]),
                ],
            }
        );
        assert_eq!(parse("g()"), Expr::Call { name: "g".into(), args: vec![] });
    }

    #[test]
    fn test_negative_literal_folding() {
        assert_eq!(parse("-5"), Expr::Literal(Value::Int(-5)));
        assert!(matches!(parse("-x"), Expr::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn test_integer_literal_bounds() {
        assert_eq!(parse("-9223372036854775808"), Expr::Literal(Value::Int(i64::MIN)));
        assert_eq!(parse("9223372036854775807"), Expr::Literal(Value::Int(i64::MAX)));
        assert!(matches!(
            Condition::parse("9223372036854775808"),
            Err(EngineError::ConditionSyntax { position: 0, .. })
        ));
        assert!(matches!(
            Condition::parse("1 + 9223372036854775808"),
            Err(EngineError::ConditionSyntax { position: 4, .. })
        ));
    }

    #[test]
    fn test_field_extraction() {
        let condition =
            Condition::parse("a > 1 && f(b, a) || g(f(c)) ?? missing").unwrap();
        assert_eq!(condition.fields().variables, vec!["a", "b", "c", "missing"]);
        assert_eq!(condition.fields().functions, vec!["f", "g"]);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "a &&", "(a", "f(1,", "a b", "1 +* 2", "a ? b"] {
            assert!(
                matches!(Condition::parse(bad), Err(EngineError::ConditionSyntax { .. })),
                "expected syntax error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(matches!(
            Condition::parse(deep),
            Err(EngineError::ConditionSyntax { .. })
        ));

        let nots = format!("{}true", "!".repeat(200));
        assert!(Condition::parse(nots).is_err());

        let chain = vec!["1"; 600].join(" + ");
        assert!(Condition::parse(chain).is_err());
    }

    #[test]
    fn test_condition_serde() {
        let condition: Condition = serde_json::from_str("\"a == 1\"").unwrap();
        assert_eq!(condition.source(), "a == 1");
        assert_eq!(serde_json::to_string(&condition).unwrap(), "\"a == 1\"");
        assert!(serde_json::from_str::<Condition>("\"a ==\"").is_err());
    }
}
