//! Functional expression evaluation (`calc`, `clamp`, `min`, `max`).
//!
//! Expressions are parsed into an ephemeral binary tree, evaluated
//! bottom-up, and converted through pixels via a fixed reference context
//! whenever operand units differ. The reference values approximate an
//! authoring-time environment, not a live viewport.

use crate::entry::{ComputedValue, Confidence};
use thiserror::Error;

/// Reference base font size used for `em`/`rem`/`%` conversion
pub const BASE_FONT_SIZE_PX: f64 = 16.0;
/// Reference viewport used for `vw`/`vh`/`vmin`/`vmax` conversion
pub const VIEWPORT_WIDTH_PX: f64 = 1920.0;
pub const VIEWPORT_HEIGHT_PX: f64 = 1080.0;
/// Reference resolution used for physical units
pub const DOTS_PER_INCH: f64 = 96.0;

pub type CalcResult<T> = Result<T, CalcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Unexpected token at {pos}: {found}")]
    UnexpectedToken { pos: usize, found: String },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Incompatible units: {left} and {right}")]
    IncompatibleUnits { left: String, right: String },

    #[error("'{op}' requires a unitless operand")]
    NonScalarProduct { op: char },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("{function}() expects {expected} operands, found {found}")]
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },
}

/// Ephemeral expression tree, built and discarded per evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum CalcAst {
    Value {
        value: f64,
        unit: String,
    },
    Binary {
        op: CalcOp,
        left: Box<CalcAst>,
        right: Box<CalcAst>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Evaluated quantity plus whether any unit conversion occurred
#[derive(Debug, Clone, PartialEq)]
struct Quantity {
    value: f64,
    unit: String,
    converted: bool,
}

/// Convert a dimension to reference pixels. Returns `None` for units the
/// reference context cannot express.
pub fn to_px(value: f64, unit: &str) -> Option<f64> {
    let px = match unit.to_ascii_lowercase().as_str() {
        "px" | "" => value,
        "em" | "rem" => value * BASE_FONT_SIZE_PX,
        "pt" => value * DOTS_PER_INCH / 72.0,
        "pc" => value * DOTS_PER_INCH / 6.0,
        "in" => value * DOTS_PER_INCH,
        "cm" => value * DOTS_PER_INCH / 2.54,
        "mm" => value * DOTS_PER_INCH / 25.4,
        "q" => value * DOTS_PER_INCH / 101.6,
        "vw" => value * VIEWPORT_WIDTH_PX / 100.0,
        "vh" => value * VIEWPORT_HEIGHT_PX / 100.0,
        "vmin" => value * VIEWPORT_HEIGHT_PX / 100.0,
        "vmax" => value * VIEWPORT_WIDTH_PX / 100.0,
        "%" => value * BASE_FONT_SIZE_PX / 100.0,
        _ => return None,
    };
    Some(px)
}

/// Parse a bare dimension token (`16px`, `1.5`, `-2em`, `120%`)
pub fn parse_dimension(text: &str) -> Option<(f64, String)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut split = text.len();
    for (i, c) in text.char_indices() {
        if c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0) {
            continue;
        }
        split = i;
        break;
    }
    let (num, unit) = text.split_at(split);
    let value: f64 = num.parse().ok()?;
    if !unit.is_empty() && !unit.chars().all(|c| c.is_ascii_alphabetic() || c == '%') {
        return None;
    }
    Some((value, unit.to_string()))
}

/// True when the text contains a functional expression this evaluator
/// understands
pub fn contains_function(text: &str) -> bool {
    ["calc(", "clamp(", "min(", "max("]
        .iter()
        .any(|f| find_call(text, &f[..f.len() - 1]).is_some())
}

/// Locate a call to `name` that is a word on its own (`min(` but not
/// `transform-origin(`). Returns the byte offset of the name.
fn find_call(text: &str, name: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(rel) = text[from..].find(name) {
        let at = from + rel;
        let end = at + name.len();
        let boundary_ok = at == 0
            || !(bytes[at - 1].is_ascii_alphanumeric() || bytes[at - 1] == b'-' || bytes[at - 1] == b'_');
        if boundary_ok && bytes.get(end) == Some(&b'(') {
            return Some(at);
        }
        from = end;
    }
    None
}

/// Evaluate the first functional expression found in `text`
pub fn evaluate_expression(text: &str) -> CalcResult<ComputedValue> {
    let text = text.trim();
    for name in ["calc", "clamp", "min", "max"] {
        if let Some(at) = find_call(text, name) {
            let body_start = at + name.len() + 1;
            let body_end = matching_paren(text, body_start - 1).ok_or(CalcError::UnexpectedEnd)?;
            return evaluate_function(name, &text[body_start..body_end]);
        }
    }
    Err(CalcError::UnknownFunction {
        name: text.split('(').next().unwrap_or(text).to_string(),
    })
}

/// Byte offset of the `)` matching the `(` at `open`
pub(crate) fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn evaluate_function(name: &str, body: &str) -> CalcResult<ComputedValue> {
    match name {
        "calc" => {
            let q = evaluate_operand(body)?;
            let confidence = if q.converted {
                Confidence::Approximate
            } else {
                Confidence::Exact
            };
            Ok(ComputedValue::new(q.value, q.unit, confidence))
        }
        "clamp" => {
            let operands = split_top_level(body, ',');
            if operands.len() != 3 {
                return Err(CalcError::WrongArity {
                    function: "clamp".to_string(),
                    expected: 3,
                    found: operands.len(),
                });
            }
            // No runtime-width dependence: the preferred operand stands in
            // for the clamped result.
            let q = evaluate_operand(operands[1])?;
            Ok(ComputedValue::new(q.value, q.unit, Confidence::Approximate))
        }
        "min" | "max" => {
            let operands = split_top_level(body, ',');
            if operands.is_empty() {
                return Err(CalcError::WrongArity {
                    function: name.to_string(),
                    expected: 1,
                    found: 0,
                });
            }
            let mut quantities = Vec::with_capacity(operands.len());
            for operand in &operands {
                quantities.push(evaluate_operand(operand)?);
            }

            let first_unit = quantities[0].unit.clone();
            let uniform = quantities.iter().all(|q| q.unit == first_unit);
            if !uniform {
                // Compare in reference pixels
                for q in &mut quantities {
                    let px = to_px(q.value, &q.unit).ok_or_else(|| CalcError::IncompatibleUnits {
                        left: first_unit.clone(),
                        right: q.unit.clone(),
                    })?;
                    q.value = px;
                    q.unit = "px".to_string();
                }
            }
            let extreme = pick_extreme(&quantities, name, |q| q.value)?;
            Ok(ComputedValue::new(
                extreme.value,
                extreme.unit.clone(),
                Confidence::Approximate,
            ))
        }
        _ => Err(CalcError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

fn pick_extreme<'a>(
    quantities: &'a [Quantity],
    name: &str,
    key: impl Fn(&Quantity) -> f64,
) -> CalcResult<&'a Quantity> {
    let mut best = quantities.first().ok_or(CalcError::UnexpectedEnd)?;
    for q in &quantities[1..] {
        let better = if name == "min" {
            key(q) < key(best)
        } else {
            key(q) > key(best)
        };
        if better {
            best = q;
        }
    }
    Ok(best)
}

/// Split on a separator at paren depth zero
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Evaluate one operand: a bare dimension, an arithmetic sum, or a nested
/// function call
fn evaluate_operand(text: &str) -> CalcResult<Quantity> {
    let mut parser = Parser::new(text)?;
    let ast = parser.parse_expr()?;
    parser.expect_end()?;
    let mut q = eval(&ast)?;
    q.converted |= parser.nested_approx;
    Ok(q)
}

fn eval(ast: &CalcAst) -> CalcResult<Quantity> {
    match ast {
        CalcAst::Value { value, unit } => Ok(Quantity {
            value: *value,
            unit: unit.clone(),
            converted: false,
        }),
        CalcAst::Binary { op, left, right } => {
            let l = eval(left)?;
            let r = eval(right)?;
            let converted = l.converted || r.converted;
            match op {
                CalcOp::Multiply => {
                    if l.unit.is_empty() {
                        Ok(Quantity {
                            value: l.value * r.value,
                            unit: r.unit,
                            converted,
                        })
                    } else if r.unit.is_empty() {
                        Ok(Quantity {
                            value: l.value * r.value,
                            unit: l.unit,
                            converted,
                        })
                    } else {
                        Err(CalcError::NonScalarProduct { op: '*' })
                    }
                }
                CalcOp::Divide => {
                    if !r.unit.is_empty() {
                        return Err(CalcError::NonScalarProduct { op: '/' });
                    }
                    if r.value == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    Ok(Quantity {
                        value: l.value / r.value,
                        unit: l.unit,
                        converted,
                    })
                }
                CalcOp::Add | CalcOp::Subtract => {
                    let sign = if *op == CalcOp::Add { 1.0 } else { -1.0 };
                    if l.unit == r.unit {
                        return Ok(Quantity {
                            value: l.value + sign * r.value,
                            unit: l.unit,
                            converted,
                        });
                    }
                    let lp = to_px(l.value, &l.unit);
                    let rp = to_px(r.value, &r.unit);
                    match (lp, rp) {
                        (Some(lp), Some(rp)) => Ok(Quantity {
                            value: lp + sign * rp,
                            unit: "px".to_string(),
                            converted: true,
                        }),
                        _ => Err(CalcError::IncompatibleUnits {
                            left: l.unit,
                            right: r.unit,
                        }),
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64, String),
    Op(CalcOp),
    LParen,
    RParen,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// A nested clamp/min/max was folded in; the result is approximate
    nested_approx: bool,
}

impl Parser {
    fn new(text: &str) -> CalcResult<Self> {
        let mut tokens = Vec::new();
        let mut nested_approx = false;
        let bytes = text.as_bytes();
        let mut i = 0usize;

        while i < bytes.len() {
            let c = bytes[i] as char;
            if c.is_ascii_whitespace() {
                i += 1;
            } else if c == '(' {
                tokens.push(Token::LParen);
                i += 1;
            } else if c == ')' {
                tokens.push(Token::RParen);
                i += 1;
            } else if c == '+' {
                tokens.push(Token::Op(CalcOp::Add));
                i += 1;
            } else if c == '*' {
                tokens.push(Token::Op(CalcOp::Multiply));
                i += 1;
            } else if c == '/' {
                tokens.push(Token::Op(CalcOp::Divide));
                i += 1;
            } else if c == '-'
                && bytes
                    .get(i + 1)
                    .map(|b| b.is_ascii_digit() || *b == b'.')
                    .unwrap_or(false)
                && matches!(tokens.last(), None | Some(Token::Op(_)) | Some(Token::LParen))
            {
                // Unary minus bound to the following number
                let (token, next) = Self::lex_number(text, i)?;
                tokens.push(token);
                i = next;
            } else if c == '-' {
                tokens.push(Token::Op(CalcOp::Subtract));
                i += 1;
            } else if c.is_ascii_digit() || c == '.' {
                let (token, next) = Self::lex_number(text, i)?;
                tokens.push(token);
                i = next;
            } else if c.is_ascii_alphabetic() {
                // Nested function call; evaluated eagerly, folded to a value
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'-')
                {
                    i += 1;
                }
                let name = &text[start..i];
                if bytes.get(i) != Some(&b'(') {
                    return Err(CalcError::UnexpectedToken {
                        pos: start,
                        found: name.to_string(),
                    });
                }
                let body_end = matching_paren(text, i).ok_or(CalcError::UnexpectedEnd)?;
                let inner = evaluate_function(name, &text[i + 1..body_end])?;
                if inner.confidence != Confidence::Exact {
                    nested_approx = true;
                }
                tokens.push(Token::Number(inner.value, inner.unit));
                i = body_end + 1;
            } else {
                return Err(CalcError::UnexpectedToken {
                    pos: i,
                    found: c.to_string(),
                });
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            nested_approx,
        })
    }

    fn lex_number(text: &str, start: usize) -> CalcResult<(Token, usize)> {
        let bytes = text.as_bytes();
        let mut i = start;
        if bytes[i] == b'-' || bytes[i] == b'+' {
            i += 1;
        }
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
            i += 1;
        }
        let value: f64 = text[start..i]
            .parse()
            .map_err(|_| CalcError::UnexpectedToken {
                pos: start,
                found: text[start..i].to_string(),
            })?;
        let unit_start = i;
        while i < bytes.len() && ((bytes[i] as char).is_ascii_alphabetic() || bytes[i] == b'%') {
            i += 1;
        }
        Ok((Token::Number(value, text[unit_start..i].to_string()), i))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> CalcResult<()> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(CalcError::UnexpectedToken {
                pos: self.pos,
                found: format!("{:?}", self.tokens[self.pos]),
            })
        }
    }

    /// `expr := term (('+' | '-') term)*`
    fn parse_expr(&mut self) -> CalcResult<CalcAst> {
        let mut left = self.parse_term()?;
        while let Some(Token::Op(op @ (CalcOp::Add | CalcOp::Subtract))) = self.peek().cloned() {
            self.next();
            let right = self.parse_term()?;
            left = CalcAst::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `term := factor (('*' | '/') factor)*`
    fn parse_term(&mut self) -> CalcResult<CalcAst> {
        let mut left = self.parse_factor()?;
        while let Some(Token::Op(op @ (CalcOp::Multiply | CalcOp::Divide))) = self.peek().cloned() {
            self.next();
            let right = self.parse_factor()?;
            left = CalcAst::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> CalcResult<CalcAst> {
        match self.next() {
            Some(Token::Number(value, unit)) => Ok(CalcAst::Value { value, unit }),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(CalcError::UnexpectedToken {
                        pos: self.pos,
                        found: format!("{:?}", other),
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(other) => Err(CalcError::UnexpectedToken {
                pos: self.pos,
                found: format!("{:?}", other),
            }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}
