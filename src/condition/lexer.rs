//! Tokenizer for condition expressions.

use crate::error::{EngineError, Result};

/// A lexical token.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    /// Unsigned magnitude; the parser applies any leading minus.
    Int(u64),
    Float(f64),
    Str(String),
    Ident(String),

    // Keywords
    True,
    False,
    Nil,
    And,
    Or,
    Not,
    In,
    Contains,
    StartsWith,
    EndsWith,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Question,
    Colon,

    // Operators
    Bang,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    QuestionQuestion,

    Eof,
}

impl Token {
    /// Short human-readable description for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Int(v) => format!("integer {v}"),
            Token::Float(v) => format!("float {v}"),
            Token::Str(s) => format!("string {s:?}"),
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::Eof => "end of expression".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::True => "true",
            Token::False => "false",
            Token::Nil => "nil",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::In => "in",
            Token::Contains => "contains",
            Token::StartsWith => "startsWith",
            Token::EndsWith => "endsWith",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Bang => "!",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::StarStar => "**",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::QuestionQuestion => "??",
            Token::Int(_) | Token::Float(_) | Token::Str(_) | Token::Ident(_) | Token::Eof => "",
        }
    }
}

/// A token with its byte offset in the source.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split condition text into tokens.
///
/// Always ends with a single `Token::Eof`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, position: usize, message: impl Into<String>) -> EngineError {
        EngineError::ConditionSyntax {
            source_text: self.source.to_string(),
            position,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();

        loop {
            while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
                self.pos += 1;
            }

            let start = self.pos;
            let Some(byte) = self.peek() else {
                tokens.push(Spanned {
                    token: Token::Eof,
                    position: start,
                });
                return Ok(tokens);
            };

            let token = match byte {
                b'0'..=b'9' => self.number()?,
                b'\'' | b'"' => self.string(byte)?,
                b if b.is_ascii_alphabetic() || b == b'_' => self.word(),
                _ => self.operator()?,
            };

            tokens.push(Spanned {
                token,
                position: start,
            });
        }
    }

    fn number(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit() || b == b'_') {
            self.pos += 1;
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            if self.peek_at(1 + sign).is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                self.pos += 1 + sign;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }

        let text: String = self.source[start..self.pos].chars().filter(|c| *c != '_').collect();
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(start, format!("invalid float literal `{text}`")))
        } else {
            text.parse::<u64>()
                .map(Token::Int)
                .map_err(|_| self.error(start, format!("integer literal `{text}` out of range")))
        }
    }

    fn string(&mut self, quote: u8) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();

        loop {
            let Some(ch) = self.source[self.pos..].chars().next() else {
                return Err(self.error(start, "unterminated string literal"));
            };
            self.pos += ch.len_utf8();

            if ch as u32 == u32::from(quote) {
                return Ok(Token::Str(out));
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }

            let Some(escaped) = self.source[self.pos..].chars().next() else {
                return Err(self.error(start, "unterminated string literal"));
            };
            self.pos += escaped.len_utf8();
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' | '\'' | '"' => out.push(escaped),
                other => {
                    return Err(self.error(self.pos - other.len_utf8() - 1, format!("unknown escape `\\{other}`")));
                }
            }
        }
    }

    fn word(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }

        match &self.source[start..self.pos] {
            "true" => Token::True,
            "false" => Token::False,
            "nil" | "null" => Token::Nil,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            "contains" => Token::Contains,
            "startsWith" => Token::StartsWith,
            "endsWith" => Token::EndsWith,
            name => Token::Ident(name.to_string()),
        }
    }

    fn operator(&mut self) -> Result<Token> {
        let start = self.pos;
        let first = self.bytes[start];
        let second = self.peek_at(1);

        let (token, width) = match (first, second) {
            (b'*', Some(b'*')) => (Token::StarStar, 2),
            (b'=', Some(b'=')) => (Token::EqEq, 2),
            (b'!', Some(b'=')) => (Token::NotEq, 2),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'&', Some(b'&')) => (Token::AndAnd, 2),
            (b'|', Some(b'|')) => (Token::OrOr, 2),
            (b'?', Some(b'?')) => (Token::QuestionQuestion, 2),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b'[', _) => (Token::LBracket, 1),
            (b']', _) => (Token::RBracket, 1),
            (b',', _) => (Token::Comma, 1),
            (b'?', _) => (Token::Question, 1),
            (b':', _) => (Token::Colon, 1),
            (b'!', _) => (Token::Bang, 1),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'>', _) => (Token::Gt, 1),
            _ => {
                let ch = self.source[start..].chars().next().unwrap_or('?');
                return Err(self.error(start, format!("unexpected character `{ch}`")));
            }
        };

        self.pos += width;
        Ok(token)
    }
}
