//! Arithmetic formula engine
//!
//! Derived fields hold formulas such as `Price * (1 + Tax / 100)` where the
//! words are other fields' labels. Labels are replaced by their values one
//! binding at a time, in binding order, before tokenizing, so the formula
//! text is never turned into code. What remains after label resolution may
//! only contain numeric literals, `+ - * / ( )` and spaces.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | '(' expr ')'
//! ```

use std::fmt;
use thiserror::Error;

const MAX_DEPTH: usize = 64;

/// Formula failure. Never shown to the user, only logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("invalid number '{text}' at {position}")]
    InvalidNumber { text: String, position: usize },

    #[error("unexpected {found} at {position}")]
    UnexpectedToken { found: TokenKind, position: usize },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("formula nests too deeply")]
    TooDeep,

    #[error("label '{label}' at {position} has no plain decimal value")]
    NonDecimalValue { label: String, position: usize },
}

/// Label to value pairs, resolved in order over the formula text.
pub type Bindings = [(String, f64)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
        }
    }
}

/// Token with its byte offset in the formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Piece of a formula after label resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment<'a> {
    /// Formula text no label has claimed, with its byte offset
    Text { text: &'a str, offset: usize },
    /// Number bound to a label occurrence
    Bound { value: f64, offset: usize },
}

/// Replace label occurrences with their values, one label at a time in
/// binding order. A label only matches text no earlier label has claimed,
/// so with `B` bound before `AB`, the formula `AB` resolves to `A` followed
/// by the value of `B`.
pub fn resolve_labels<'a>(input: &'a str, bindings: &Bindings) -> Result<Vec<Segment<'a>>, FormulaError> {
    let mut segments = vec![Segment::Text { text: input, offset: 0 }];

    for (label, value) in bindings.iter().filter(|(label, _)| !label.is_empty()) {
        let mut next = Vec::with_capacity(segments.len());
        for segment in segments {
            let Segment::Text { text, offset } = segment else {
                next.push(segment);
                continue;
            };

            let mut rest = 0;
            for (at, _) in text.match_indices(label.as_str()) {
                if !is_plain_decimal(*value) {
                    return Err(FormulaError::NonDecimalValue {
                        label: label.clone(),
                        position: offset + at,
                    });
                }
                if at > rest {
                    next.push(Segment::Text { text: &text[rest..at], offset: offset + rest });
                }
                next.push(Segment::Bound { value: *value, offset: offset + at });
                rest = at + label.len();
            }
            if rest < text.len() {
                next.push(Segment::Text { text: &text[rest..], offset: offset + rest });
            }
        }
        segments = next;
    }

    Ok(segments)
}

/// Scanner over formula text left after label resolution
pub struct Tokenizer<'a> {
    input: &'a str,
    offset: usize,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    /// `offset` is where `input` starts inside the whole formula.
    pub fn new(input: &'a str, offset: usize) -> Self {
        Self { input, offset, pos: 0 }
    }

    /// Resolve labels, then tokenize every remaining piece of text
    pub fn tokenize(input: &str, bindings: &Bindings) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();
        for segment in resolve_labels(input, bindings)? {
            match segment {
                Segment::Bound { value, offset } => {
                    tokens.push(Token { kind: TokenKind::Number(value), position: offset });
                }
                Segment::Text { text, offset } => {
                    let mut tokenizer = Tokenizer::new(text, offset);
                    while let Some(token) = tokenizer.next_token()? {
                        tokens.push(token);
                    }
                }
            }
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, FormulaError> {
        self.skip_spaces();
        let start = self.pos;
        let position = self.offset + start;

        let Some(c) = self.peek_char() else {
            return Ok(None);
        };

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if c.is_ascii_digit() || c == '.' => return self.read_number(start).map(Some),
            ch => return Err(FormulaError::UnexpectedCharacter { ch, position }),
        };
        self.pos += c.len_utf8();
        Ok(Some(Token { kind, position }))
    }

    fn read_number(&mut self, start: usize) -> Result<Token, FormulaError> {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                self.pos += 1;
            } else {
                break;
            }
        }

        let text = &self.input[start..self.pos];
        let position = self.offset + start;
        let value: f64 = text
            .parse()
            .map_err(|_| FormulaError::InvalidNumber { text: text.to_string(), position })?;
        Ok(Token { kind: TokenKind::Number(value), position })
    }

    // Only plain spaces separate tokens
    fn skip_spaces(&mut self) {
        while self.peek_char() == Some(' ') {
            self.pos += 1;
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// IEEE semantics throughout, so `1 / 0` is infinite and `0 / 0` is NaN.
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Neg(inner) => -inner.eval(),
            Expr::Binary { op, lhs, rhs } => {
                let (l, r) = (lhs.eval(), rhs.eval());
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                }
            }
        }
    }
}

/// Recursive-descent parser over a token slice
pub struct Parser<'t> {
    tokens: &'t [Token],
    index: usize,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub fn parse(tokens: &'t [Token]) -> Result<Expr, FormulaError> {
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }
        let mut parser = Parser { tokens, index: 0, depth: 0 };
        let expr = parser.expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(FormulaError::UnexpectedToken {
                found: token.kind,
                position: token.position,
            }),
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek_op(&[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)]) {
            self.index += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_op(&[(TokenKind::Star, BinaryOp::Mul), (TokenKind::Slash, BinaryOp::Div)]) {
            self.index += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        self.enter()?;
        let result = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Minus) => {
                self.index += 1;
                self.unary().map(|inner| Expr::Neg(Box::new(inner)))
            }
            Some(TokenKind::Plus) => {
                self.index += 1;
                self.unary()
            }
            _ => self.primary(),
        };
        self.depth -= 1;
        result
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self.next().ok_or(FormulaError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::LParen => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token { kind: TokenKind::RParen, .. }) => Ok(inner),
                    Some(other) => Err(FormulaError::UnexpectedToken {
                        found: other.kind,
                        position: other.position,
                    }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            found => Err(FormulaError::UnexpectedToken { found, position: token.position }),
        }
    }

    fn enter(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.depth -= 1;
            return Err(FormulaError::TooDeep);
        }
        Ok(())
    }

    fn peek_op(&self, table: &[(TokenKind, BinaryOp)]) -> Option<BinaryOp> {
        let kind = self.peek()?.kind;
        table.iter().find(|(k, _)| *k == kind).map(|(_, op)| *op)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).copied();
        if token.is_some() {
            self.index += 1;
        }
        token
    }
}

/// Tokenize, parse and evaluate `formula` with `bindings`.
pub fn evaluate(formula: &str, bindings: &Bindings) -> Result<f64, FormulaError> {
    let tokens = Tokenizer::tokenize(formula, bindings)?;
    Ok(Parser::parse(&tokens)?.eval())
}

/// Text stored for a computed value: `7`, `0.5`, `1e+21`, `Infinity`, `NaN`.
///
/// Magnitudes from `1e21` up and below `1e-6` use exponent notation.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let text = format!("{:e}", value);
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        }
    } else {
        value.to_string()
    }
}

/// Whether a bound value can stand in formula text as digits and a point.
fn is_plain_decimal(value: f64) -> bool {
    value.is_finite() && !format_number(value).contains('e')
}
