//! Coordinate expressions
//!
//! Every position and size in a draw op is a small arithmetic expression over
//! frame measurements, e.g. `width - (left_width + 2) \`max\` 4`. Expressions
//! are tokenized once at load time, user constants are folded in, and fully
//! constant expressions are evaluated immediately.
//!
//! Evaluation reduces a flat term list in three passes: `* / %`, then `+ -`,
//! then `` `max` `min` ``. The max/min operators therefore bind looser than
//! addition, which themes rely on.

use tracing::warn;

use crate::shared::Rect;
use crate::theme::error::ExprError;

/// Binary operators understood by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Max,
    Min,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Mod => "%",
            Self::Max => "`max`",
            Self::Min => "`min`",
        }
    }

    /// Reduction pass the operator belongs to; higher runs first
    fn precedence(&self) -> u8 {
        match self {
            Self::Multiply | Self::Divide | Self::Mod => 2,
            Self::Add | Self::Subtract => 1,
            Self::Max | Self::Min => 0,
        }
    }

    /// Match an operator at the start of `text`, returning it and its byte length
    fn from_prefix(text: &str) -> Option<(Self, usize)> {
        let op = match text.as_bytes().first()? {
            b'+' => Self::Add,
            b'-' => Self::Subtract,
            b'*' => Self::Multiply,
            b'/' => Self::Divide,
            b'%' => Self::Mod,
            b'`' => {
                return if text.starts_with("`max`") {
                    Some((Self::Max, 5))
                } else if text.starts_with("`min`") {
                    Some((Self::Min, 5))
                } else {
                    None
                };
            }
            _ => return None,
        };
        Some((op, 1))
    }
}

/// Output of the tokenizer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i32),
    Double(f64),
    Operator(Operator),
    Variable(String),
    OpenParen,
    CloseParen,
}

/// Source of user-defined named constants used for folding
pub trait ConstantLookup {
    fn lookup_int(&self, name: &str) -> Option<i32>;
    fn lookup_float(&self, name: &str) -> Option<f64>;
}

/// Lookup with no constants at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstants;

impl ConstantLookup for NoConstants {
    fn lookup_int(&self, _name: &str) -> Option<i32> {
        None
    }

    fn lookup_float(&self, _name: &str) -> Option<f64> {
        None
    }
}

/// Named measurements an expression can refer to during one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprEnv {
    /// Target rectangle; `width`/`height` and the position origin come from here
    pub rect: Rect,
    /// Natural size of the image being drawn, if it has one
    pub object_width: Option<f64>,
    pub object_height: Option<f64>,

    pub left_width: f64,
    pub right_width: f64,
    pub top_height: f64,
    pub bottom_height: f64,
    pub title_width: f64,
    pub title_height: f64,
    pub frame_x_center: f64,
    pub frame_y_center: f64,
    pub mini_icon_width: f64,
    pub mini_icon_height: f64,
    pub icon_width: f64,
    pub icon_height: f64,

    /// Window scale; above 1 variables are evaluated as floating point
    pub scale: i32,
}

impl Default for ExprEnv {
    fn default() -> Self {
        Self {
            rect: Rect::default(),
            object_width: None,
            object_height: None,
            left_width: 0.0,
            right_width: 0.0,
            top_height: 0.0,
            bottom_height: 0.0,
            title_width: 0.0,
            title_height: 0.0,
            frame_x_center: 0.0,
            frame_y_center: 0.0,
            mini_icon_width: 0.0,
            mini_icon_height: 0.0,
            icon_width: 0.0,
            icon_height: 0.0,
            scale: 1,
        }
    }
}

impl ExprEnv {
    fn variable(&self, name: &str) -> Option<f64> {
        let value = match name {
            "width" => self.rect.width,
            "height" => self.rect.height,
            "object_width" => return self.object_width,
            "object_height" => return self.object_height,
            "left_width" => self.left_width,
            "right_width" => self.right_width,
            "top_height" => self.top_height,
            "bottom_height" => self.bottom_height,
            "mini_icon_width" => self.mini_icon_width,
            "mini_icon_height" => self.mini_icon_height,
            "icon_width" => self.icon_width,
            "icon_height" => self.icon_height,
            "title_width" => self.title_width,
            "title_height" => self.title_height,
            "frame_x_center" => self.frame_x_center,
            "frame_y_center" => self.frame_y_center,
            _ => return None,
        };
        Some(value)
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Split an expression into tokens
pub fn tokenize(expr: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut rest = expr;

    while let Some(c) = rest.chars().next() {
        match c {
            '*' | '/' | '+' | '-' | '%' | '`' => {
                let (op, len) = Operator::from_prefix(rest)
                    .ok_or_else(|| ExprError::UnknownOperator(rest.to_string()))?;
                tokens.push(Token::Operator(op));
                rest = &rest[len..];
            }
            '(' => {
                tokens.push(Token::OpenParen);
                rest = &rest[1..];
            }
            ')' => {
                tokens.push(Token::CloseParen);
                rest = &rest[1..];
            }
            ' ' | '\t' | '\n' => rest = &rest[1..],
            c if c.is_ascii_alphabetic() || c == '_' => {
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
                    .unwrap_or(rest.len());
                tokens.push(Token::Variable(rest[..end].to_string()));
                rest = &rest[end..];
            }
            c => {
                let end = rest
                    .find(|c: char| !(c == '.' || c.is_ascii_digit()))
                    .unwrap_or(rest.len());
                if end == 0 {
                    return Err(ExprError::BadCharacter(c));
                }
                tokens.push(parse_number(&rest[..end])?);
                rest = &rest[end..];
            }
        }
    }

    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }

    Ok(tokens)
}

fn parse_number(text: &str) -> Result<Token, ExprError> {
    if text.contains('.') {
        parse_leading_float(text)
            .map(Token::Double)
            .ok_or_else(|| ExprError::BadFloat(text.to_string()))
    } else {
        text.parse::<i32>()
            .map(Token::Int)
            .map_err(|_| ExprError::BadInteger(text.to_string()))
    }
}

/// Parse the longest leading floating point number in `text`, ignoring any
/// trailing garbage. Leading whitespace is skipped.
pub(crate) fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let candidate_len = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(text.len());

    (1..=candidate_len)
        .rev()
        .find_map(|len| text[..len].parse::<f64>().ok())
}

// ============================================================================
// Evaluation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i32),
    Double(f64),
}

impl Value {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Double(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Term {
    Value(Value),
    Operator(Operator),
}

fn apply(a: Value, b: Value, op: Operator) -> Result<Value, ExprError> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => {
            let v = match op {
                Operator::Multiply => a.wrapping_mul(b),
                Operator::Divide => {
                    if b == 0 {
                        return Err(ExprError::DivideByZero);
                    }
                    a.wrapping_div(b)
                }
                Operator::Mod => {
                    if b == 0 {
                        return Err(ExprError::DivideByZero);
                    }
                    a.wrapping_rem(b)
                }
                Operator::Add => a.wrapping_add(b),
                Operator::Subtract => a.wrapping_sub(b),
                Operator::Max => a.max(b),
                Operator::Min => a.min(b),
            };
            Ok(Value::Int(v))
        }
        (a, b) => {
            // Either side is floating point: promote both
            let (a, b) = (a.as_f64(), b.as_f64());
            let v = match op {
                Operator::Multiply => a * b,
                Operator::Divide => {
                    if b == 0.0 {
                        return Err(ExprError::DivideByZero);
                    }
                    a / b
                }
                Operator::Mod => {
                    if b == 0.0 {
                        return Err(ExprError::DivideByZero);
                    }
                    a % b
                }
                Operator::Add => a + b,
                Operator::Subtract => a - b,
                Operator::Max => {
                    if a > b {
                        a
                    } else {
                        b
                    }
                }
                Operator::Min => {
                    if a < b {
                        a
                    } else {
                        b
                    }
                }
            };
            Ok(Value::Double(v))
        }
    }
}

/// One left-to-right reduction over `terms` for operators of `precedence`
fn reduce(terms: &mut Vec<Term>, precedence: u8) -> Result<(), ExprError> {
    let mut i = 1;

    while i < terms.len() {
        if let Term::Operator(op) = terms[i - 1] {
            return Err(ExprError::Malformed(format!(
                "Coordinate expression has an operator \"{}\" where an operand was expected",
                op.as_str()
            )));
        }

        let op = match terms[i] {
            Term::Operator(op) => op,
            Term::Value(_) => {
                return Err(ExprError::Malformed(
                    "Coordinate expression had an operand where an operator was expected".into(),
                ));
            }
        };

        if i == terms.len() - 1 {
            return Err(ExprError::Malformed(
                "Coordinate expression ended with an operator instead of an operand".into(),
            ));
        }

        let rhs = match terms[i + 1] {
            Term::Value(v) => v,
            Term::Operator(next) => {
                return Err(ExprError::Malformed(format!(
                    "Coordinate expression has operator \"{}\" following operator \"{}\" with no operand in between",
                    next.as_str(),
                    op.as_str()
                )));
            }
        };

        if op.precedence() == precedence {
            let Term::Value(lhs) = terms[i - 1] else {
                unreachable!("operand checked above");
            };
            terms[i - 1] = Term::Value(apply(lhs, rhs, op)?);
            terms.drain(i..i + 2);
        } else {
            i += 2;
        }
    }

    Ok(())
}

fn eval_tokens(tokens: &[Token], env: Option<&ExprEnv>) -> Result<Value, ExprError> {
    let mut terms = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;
    let mut group_start = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if depth > 0 {
            match token {
                Token::OpenParen => depth += 1,
                Token::CloseParen => {
                    if depth == 1 {
                        let inner = eval_tokens(&tokens[group_start + 1..i], env)?;
                        terms.push(Term::Value(inner));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            continue;
        }

        match token {
            Token::Int(v) => terms.push(Term::Value(Value::Int(*v))),
            Token::Double(v) => terms.push(Term::Value(Value::Double(*v))),
            Token::Operator(op) => terms.push(Term::Operator(*op)),
            Token::OpenParen => {
                depth = 1;
                group_start = i;
            }
            Token::CloseParen => return Err(ExprError::UnmatchedClose),
            Token::Variable(name) => {
                let env = env.ok_or_else(|| ExprError::UnknownVariable(name.clone()))?;
                let value = env
                    .variable(name)
                    .ok_or_else(|| ExprError::UnknownVariable(name.clone()))?;
                if env.scale > 1 {
                    terms.push(Term::Value(Value::Double(value)));
                } else {
                    terms.push(Term::Value(Value::Int(value as i32)));
                }
            }
        }
    }

    if depth > 0 {
        return Err(ExprError::UnmatchedOpen);
    }

    if terms.is_empty() {
        return Err(ExprError::Malformed(
            "Coordinate expression doesn't seem to have any operators or operands".into(),
        ));
    }

    for precedence in [2, 1, 0] {
        reduce(&mut terms, precedence)?;
    }

    match terms.as_slice() {
        [Term::Value(v)] => Ok(*v),
        [Term::Operator(op), ..] => Err(ExprError::Malformed(format!(
            "Coordinate expression has an operator \"{}\" where an operand was expected",
            op.as_str()
        ))),
        _ => Err(ExprError::Malformed(
            "Coordinate expression had an operand where an operator was expected".into(),
        )),
    }
}

// ============================================================================
// Compiled expression
// ============================================================================

/// A compiled coordinate expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    tokens: Vec<Token>,
    /// Cached result when no variables remain after constant folding
    constant: Option<f64>,
}

impl Expression {
    /// Tokenize `source`, fold in constants, and pre-evaluate if constant
    pub fn new(source: &str, constants: &dyn ConstantLookup) -> Result<Self, ExprError> {
        let mut tokens = tokenize(source)?;
        let mut is_constant = true;

        for token in tokens.iter_mut() {
            if let Token::Variable(name) = token {
                if let Some(v) = constants.lookup_int(name) {
                    *token = Token::Int(v);
                } else if let Some(v) = constants.lookup_float(name) {
                    *token = Token::Double(v);
                } else {
                    is_constant = false;
                }
            }
        }

        let constant = if is_constant {
            Some(eval_tokens(&tokens, None)?.as_f64())
        } else {
            None
        };

        Ok(Self {
            source: source.to_string(),
            tokens,
            constant,
        })
    }

    /// Compile with no user constants
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        Self::new(source, &NoConstants)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Raw value of the expression; constants ignore `env`
    pub fn evaluate(&self, env: &ExprEnv) -> Result<f64, ExprError> {
        match self.constant {
            Some(v) => Ok(v),
            None => eval_tokens(&self.tokens, Some(env)).map(Value::as_f64),
        }
    }

    pub fn x_position(&self, env: &ExprEnv) -> Result<f64, ExprError> {
        Ok(env.rect.x + self.evaluate(env)?)
    }

    pub fn y_position(&self, env: &ExprEnv) -> Result<f64, ExprError> {
        Ok(env.rect.y + self.evaluate(env)?)
    }

    /// Sizes are never below one pixel
    pub fn size(&self, env: &ExprEnv) -> Result<f64, ExprError> {
        Ok(self.evaluate(env)?.max(1.0))
    }

    /// Render-time X position; logs and yields 0 on error
    pub fn parse_x_position(&self, env: &ExprEnv) -> f64 {
        self.x_position(env).unwrap_or_else(|err| {
            warn!("Theme contained an expression that resulted in an error: {}", err);
            0.0
        })
    }

    /// Render-time Y position; logs and yields 0 on error
    pub fn parse_y_position(&self, env: &ExprEnv) -> f64 {
        self.y_position(env).unwrap_or_else(|err| {
            warn!("Theme contained an expression that resulted in an error: {}", err);
            0.0
        })
    }

    /// Render-time size; logs and yields the 1 pixel floor on error
    pub fn parse_size(&self, env: &ExprEnv) -> f64 {
        self.size(env).unwrap_or_else(|err| {
            warn!("Theme contained an expression that resulted in an error: {}", err);
            1.0
        })
    }
}
