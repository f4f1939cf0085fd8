//! Tokenizer for the GRDECL keyword language.
//!
//! A line is split into raw tokens by [`split_line`], and each raw token is
//! turned into one or more [`Value`]s by [`interpret_token`].
//!
//! String literals are delimited by single quotes. They need no delimiting
//! space at the end, but a quote directly after other characters does not
//! start a new token: `3'A'` is a single token, not a repeat count.
//! `--` outside a string literal comments out the rest of the line.

use std::fmt;
use std::str::Chars;

use thiserror::Error;

/// Most values a single token may expand to through [`interpret_token`].
pub const MAX_TOKEN_VALUES: usize = 1 << 27;

/// A `COUNT*VALUE` token that expands to more values than allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("repeat count {count} expands past the limit of {limit} values")]
pub struct RepeatLimitExceeded {
    pub count: usize,
    pub limit: usize,
}

/// An interpreted GRDECL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Str(_) => None,
        }
    }

    /// Integer value, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// String value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl fmt::Display for Value {
    /// Formats the value so that [`interpret_token`] reads it back unchanged.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) if is_bare_word(s) => write!(f, "{}", s),
            Value::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// Words that read back as themselves without quoting.
fn is_bare_word(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_alphabetic())
        && !s.contains(|c: char| c.is_whitespace() || c == '\'' || c == '-')
}

/// Lazy iterator over the raw tokens of one line.
#[derive(Debug, Clone)]
pub struct SplitLine<'a> {
    chars: Chars<'a>,
    finished: bool,
}

/// Split a line into raw tokens.
///
/// ```
/// use grdecl_parser::lexer::split_line;
///
/// let tokens: Vec<_> = split_line("3 1.0 3*4 PORO 3*INC 'HELLO WORLD  ' 3*'NAME'").collect();
/// assert_eq!(
///     tokens,
///     ["3", "1.0", "3*4", "PORO", "3*INC", "'HELLO WORLD  '", "3*'NAME'"]
/// );
/// ```
pub fn split_line(line: &str) -> SplitLine<'_> {
    SplitLine {
        chars: line.chars(),
        finished: false,
    }
}

impl Iterator for SplitLine<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        let mut value = String::new();
        let mut inside_str = false;

        for ch in self.chars.by_ref() {
            if ch == '\'' {
                value.push(ch);
                if inside_str {
                    return Some(value);
                }
                inside_str = true;
            } else if inside_str {
                value.push(ch);
            } else if ch == '-' && value.ends_with('-') {
                // comment: drop the first dash and the rest of the line
                value.pop();
                break;
            } else if ch.is_whitespace() {
                if !value.is_empty() {
                    return Some(value);
                }
            } else {
                value.push(ch);
            }
        }

        self.finished = true;
        (!value.is_empty()).then_some(value)
    }
}

/// Interpret a number, trying integer before floating point.
pub fn interpret_number(token: &str) -> Option<Value> {
    if let Ok(v) = token.parse::<i64>() {
        return Some(Value::Int(v));
    }
    token.parse::<f64>().ok().map(Value::Float)
}

/// Interpret a raw token as one or more values.
///
/// In order: string literal, keyword, `COUNT*VALUE` repeat, number.
/// Anything else is returned as the uninterpreted token. Repeats may expand
/// to at most [`MAX_TOKEN_VALUES`] values.
///
/// ```
/// use grdecl_parser::lexer::{interpret_token, Value};
///
/// assert_eq!(interpret_token("3*PORO").unwrap(), vec![Value::from("PORO"); 3]);
/// assert_eq!(interpret_token("3'PORO '").unwrap(), vec![Value::from("3'PORO '")]);
/// ```
pub fn interpret_token(token: &str) -> Result<Vec<Value>, RepeatLimitExceeded> {
    interpret_token_within(token, MAX_TOKEN_VALUES)
}

/// Like [`interpret_token`], but a repeat may expand to at most `limit` values.
///
/// The limit is checked before anything is expanded.
pub fn interpret_token_within(token: &str, limit: usize) -> Result<Vec<Value>, RepeatLimitExceeded> {
    if let Some(literal) = string_literal(token) {
        return Ok(vec![Value::Str(literal.to_string())]);
    }

    if token.starts_with(|c: char| c.is_alphabetic()) {
        return Ok(vec![Value::Str(token.to_string())]);
    }

    if let Some((count, value)) = split_repeat(token) {
        if let Ok(count) = count.parse::<usize>() {
            if !value.is_empty() {
                let exceeded = RepeatLimitExceeded { count, limit };
                if count > limit {
                    return Err(exceeded);
                }
                let inner = interpret_token_within(value, limit)?;
                match count.checked_mul(inner.len()) {
                    Some(total) if total <= limit => {
                        return Ok((0..count).flat_map(|_| inner.iter().cloned()).collect());
                    }
                    _ => return Err(exceeded),
                }
            }
        }
        return Ok(vec![Value::Str(token.to_string())]);
    }

    Ok(match interpret_number(token) {
        Some(value) => vec![value],
        None => vec![Value::Str(token.to_string())],
    })
}

fn string_literal(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('\'')?;
    if inner.is_empty() {
        return Some(inner);
    }
    inner.strip_suffix('\'')
}

/// Split `COUNT*VALUE` at the first `*` that precedes any quote.
fn split_repeat(token: &str) -> Option<(&str, &str)> {
    let star = token.find('*')?;
    if token[..star].contains('\'') {
        return None;
    }
    Some((&token[..star], &token[star + 1..]))
}

/// The part of a keyword up to the first whitespace.
pub fn until_space(s: &str) -> &str {
    match s.find(char::is_whitespace) {
        Some(end) => &s[..end],
        None => s,
    }
}

/// Whether two keyword spellings denote the same keyword.
///
/// Trailing padding is insignificant, so `PORO`, `PORO ` and `PORO    `
/// are the same keyword.
pub fn match_keyword(kw1: &str, kw2: &str) -> bool {
    until_space(kw1) == until_space(kw2)
}
