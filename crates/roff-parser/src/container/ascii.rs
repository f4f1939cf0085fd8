//! ASCII ROFF (`roff-asc`).
//!
//! Tokens are separated by whitespace. Strings are enclosed in double
//! quotes, with `\"` and `\\` standing for a quote and a backslash inside
//! them. Text between two `#` characters is a comment.

use std::io::{self, Write};

use tracing::warn;

use super::{RoffTag, RoffValue, EOF_TAG};
use crate::error::{Result, RoffError};

/// First line of every ASCII ROFF file.
pub const HEADER: &str = "roff-asc";

const VALUES_PER_LINE: usize = 8;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(ch) = chars.next() {
        match ch {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '#' | '"' => {
                let start = line;
                let mut content = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == ch => break,
                        Some('\\') if ch == '"' && matches!(chars.peek(), Some('"' | '\\')) => {
                            content.extend(chars.next());
                        }
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            content.push(c);
                        }
                        None => {
                            let what = if ch == '#' { "comment" } else { "string" };
                            return Err(RoffError::malformed(
                                format!("line {}", start),
                                format!("unterminated {}", what),
                            ));
                        }
                    }
                }
                if ch == '"' {
                    tokens.push((Token::Quoted(content), start));
                }
            }
            c => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == '"' || next == '#' {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push((Token::Word(word), line));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: std::vec::IntoIter<(Token, usize)>,
    line: usize,
}

impl Parser {
    fn is_done(&self) -> bool {
        self.tokens.as_slice().is_empty()
    }

    fn next(&mut self, context: &str) -> Result<Token> {
        let (token, line) = self
            .tokens
            .next()
            .ok_or_else(|| RoffError::UnexpectedEof(context.to_string()))?;
        self.line = line;
        Ok(token)
    }

    fn malformed(&self, reason: impl Into<String>) -> RoffError {
        RoffError::malformed(format!("line {}", self.line), reason)
    }

    fn word(&mut self, context: &str) -> Result<String> {
        match self.next(context)? {
            Token::Word(word) => Ok(word),
            Token::Quoted(s) => Err(self.malformed(format!("expected {}, found string \"{}\"", context, s))),
        }
    }

    fn string(&mut self, context: &str) -> Result<String> {
        match self.next(context)? {
            Token::Word(s) | Token::Quoted(s) => Ok(s),
        }
    }

    fn parse<T: std::str::FromStr>(&mut self, type_name: &str, context: &str) -> Result<T> {
        let word = self.word(context)?;
        word.parse()
            .map_err(|_| self.malformed(format!("'{}' is not a valid {} for {}", word, type_name, context)))
    }

    fn bool(&mut self, context: &str) -> Result<bool> {
        let word = self.word(context)?;
        match word.as_str() {
            "1" | "T" | "true" => Ok(true),
            "0" | "F" | "false" => Ok(false),
            _ => Err(self.malformed(format!("'{}' is not a valid bool for {}", word, context))),
        }
    }

    fn scalar(&mut self, type_name: &str, context: &str) -> Result<RoffValue> {
        Ok(match type_name {
            "bool" => RoffValue::Bool(self.bool(context)?),
            "byte" => RoffValue::Byte(self.parse("byte", context)?),
            "int" => RoffValue::Int(self.parse("int", context)?),
            "float" => RoffValue::Float(self.parse("float", context)?),
            "double" => RoffValue::Double(self.parse("double", context)?),
            "char" => RoffValue::Char(self.string(context)?),
            other => return Err(self.malformed(format!("unknown type '{}' in {}", other, context))),
        })
    }

    fn array(&mut self, type_name: &str, count: usize, context: &str) -> Result<RoffValue> {
        // every element is at least one token
        if count > self.tokens.as_slice().len() {
            return Err(RoffError::UnexpectedEof(context.to_string()));
        }
        Ok(match type_name {
            "bool" => RoffValue::BoolArray((0..count).map(|_| self.bool(context)).collect::<Result<_>>()?),
            "byte" => RoffValue::ByteArray(
                (0..count)
                    .map(|_| self.parse("byte", context))
                    .collect::<Result<_>>()?,
            ),
            "int" => RoffValue::IntArray(
                (0..count)
                    .map(|_| self.parse("int", context))
                    .collect::<Result<_>>()?,
            ),
            "float" => RoffValue::FloatArray(
                (0..count)
                    .map(|_| self.parse("float", context))
                    .collect::<Result<_>>()?,
            ),
            "double" => RoffValue::DoubleArray(
                (0..count)
                    .map(|_| self.parse("double", context))
                    .collect::<Result<_>>()?,
            ),
            "char" => RoffValue::CharArray((0..count).map(|_| self.string(context)).collect::<Result<_>>()?),
            other => return Err(self.malformed(format!("unknown array type '{}' in {}", other, context))),
        })
    }

    fn tag_body(&mut self, name: String) -> Result<RoffTag> {
        let mut tag = RoffTag::new(name);
        loop {
            let context = format!("tag {}", tag.name);
            let token = self.word(&context)?;
            match token.as_str() {
                "endtag" => return Ok(tag),
                "array" => {
                    let type_name = self.word(&context)?;
                    let key = self.string(&context)?;
                    let context = format!("{}.{}", tag.name, key);
                    let count = self.parse("array length", &context)?;
                    let value = self.array(&type_name, count, &context)?;
                    tag.keys.push((key, value));
                }
                type_name => {
                    let type_name = type_name.to_string();
                    let key = self.string(&context)?;
                    let context = format!("{}.{}", tag.name, key);
                    let value = self.scalar(&type_name, &context)?;
                    tag.keys.push((key, value));
                }
            }
        }
    }
}

/// Decode an ASCII ROFF file into its tags, excluding `eof`.
pub fn decode(text: &str) -> Result<Vec<RoffTag>> {
    let mut parser = Parser {
        tokens: tokenize(text)?.into_iter(),
        line: 1,
    };
    match parser.next("header")? {
        Token::Word(header) if header == HEADER => {}
        _ => return Err(RoffError::InvalidHeader),
    }

    let mut tags = Vec::new();
    loop {
        if parser.is_done() {
            warn!("ROFF data ended without an eof tag");
            break;
        }
        let token = parser.word("tag")?;
        if token != "tag" {
            return Err(parser.malformed(format!("expected 'tag', found '{}'", token)));
        }
        let name = parser.string("tag name")?;
        if name == EOF_TAG {
            break;
        }
        tags.push(parser.tag_body(name)?);
    }
    Ok(tags)
}

fn write_values<W: Write, T: std::fmt::Display>(out: &mut W, values: &[T]) -> io::Result<()> {
    for chunk in values.chunks(VALUES_PER_LINE) {
        for value in chunk {
            write!(out, " {}", value)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Quote a string, escaping `"` and `\`.
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn write_tag<W: Write>(out: &mut W, tag: &RoffTag) -> io::Result<()> {
    writeln!(out, "tag {}", tag.name)?;
    for (key, value) in &tag.keys {
        let type_name = value.type_name();
        match value {
            RoffValue::Bool(v) => writeln!(out, "{} {} {}", type_name, key, u8::from(*v))?,
            RoffValue::Byte(v) => writeln!(out, "{} {} {}", type_name, key, v)?,
            RoffValue::Int(v) => writeln!(out, "{} {} {}", type_name, key, v)?,
            RoffValue::Float(v) => writeln!(out, "{} {} {}", type_name, key, v)?,
            RoffValue::Double(v) => writeln!(out, "{} {} {}", type_name, key, v)?,
            RoffValue::Char(v) => writeln!(out, "{} {} {}", type_name, key, quoted(v))?,
            RoffValue::BoolArray(values) => {
                writeln!(out, "array {} {} {}", type_name, key, values.len())?;
                let values: Vec<u8> = values.iter().map(|&v| u8::from(v)).collect();
                write_values(out, &values)?;
            }
            RoffValue::ByteArray(values) => {
                writeln!(out, "array {} {} {}", type_name, key, values.len())?;
                write_values(out, values)?;
            }
            RoffValue::IntArray(values) => {
                writeln!(out, "array {} {} {}", type_name, key, values.len())?;
                write_values(out, values)?;
            }
            RoffValue::FloatArray(values) => {
                writeln!(out, "array {} {} {}", type_name, key, values.len())?;
                write_values(out, values)?;
            }
            RoffValue::DoubleArray(values) => {
                writeln!(out, "array {} {} {}", type_name, key, values.len())?;
                write_values(out, values)?;
            }
            RoffValue::CharArray(values) => {
                writeln!(out, "array {} {} {}", type_name, key, values.len())?;
                for v in values {
                    writeln!(out, " {}", quoted(v))?;
                }
            }
        }
    }
    writeln!(out, "endtag")
}

/// Encode tags as an ASCII ROFF file, appending `eof`.
pub fn encode<W: Write>(out: &mut W, tags: &[RoffTag]) -> io::Result<()> {
    writeln!(out, "{}", HEADER)?;
    writeln!(out, "#ROFF file#")?;
    writeln!(out, "#Creator: {} {}#", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    for tag in tags {
        write_tag(out, tag)?;
    }
    write_tag(out, &RoffTag::new(EOF_TAG))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strings_and_comments() {
        let tokens = tokenize("roff-asc\n#ROFF file#\nchar filetype  \"grid file\"\n").unwrap();
        let tokens: Vec<Token> = tokens.into_iter().map(|(token, _)| token).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Word("roff-asc".to_string()),
                Token::Word("char".to_string()),
                Token::Word("filetype".to_string()),
                Token::Quoted("grid file".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_tracks_lines() {
        let tokens = tokenize("a\n#two\nlines#\nb").unwrap();
        assert_eq!(tokens[1], (Token::Word("b".to_string()), 4));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("roff-asc\nchar x \"open\n").unwrap_err();
        assert_eq!(err.to_string(), "Malformed ROFF data at line 2: unterminated string");
    }

    #[test]
    fn test_decode_scalars_and_arrays() {
        let text = "roff-asc\n\
                    tag t\n\
                    bool b T\n\
                    int n -4\n\
                    float f 2.5E+00\n\
                    array byte codes 3\n 1 4 8\n\
                    array char names 2\n \"x y\" z\n\
                    endtag\n\
                    tag eof\nendtag\n";
        let tags = decode(text).unwrap();
        assert_eq!(tags.len(), 1);
        let tag = &tags[0];
        assert_eq!(tag.get("b"), Some(&RoffValue::Bool(true)));
        assert_eq!(tag.get("n"), Some(&RoffValue::Int(-4)));
        assert_eq!(tag.get("f"), Some(&RoffValue::Float(2.5)));
        assert_eq!(tag.get("codes"), Some(&RoffValue::ByteArray(vec![1, 4, 8])));
        assert_eq!(
            tag.get("names"),
            Some(&RoffValue::CharArray(vec!["x y".to_string(), "z".to_string()]))
        );
    }

    #[test]
    fn test_bad_number_reports_line() {
        let text = "roff-asc\ntag dimensions\nint nX four\nendtag\n";
        let err = decode(text).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed ROFF data at line 3: 'four' is not a valid int for dimensions.nX"
        );
    }

    #[test]
    fn test_short_array() {
        let text = "roff-asc\ntag t\narray int data 5\n 1 2\n";
        assert!(matches!(decode(text), Err(RoffError::UnexpectedEof(ref c)) if c == "t.data"));
    }

    #[test]
    fn test_encode_layout() {
        let tags = vec![RoffTag::new("dimensions")
            .with_key("nX", RoffValue::Int(2))
            .with_key("data", RoffValue::FloatArray(vec![0.5; 9]))];
        let mut out = Vec::new();
        encode(&mut out, &tags).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("roff-asc\n#ROFF file#\n#Creator: roff-parser "));
        assert!(text.contains(
            "tag dimensions\nint nX 2\narray float data 9\n 0.5 0.5 0.5 0.5 0.5 0.5 0.5 0.5\n 0.5\nendtag\n"
        ));
        assert!(text.ends_with("tag eof\nendtag\n"));
    }

    #[test]
    fn test_strings_with_quotes_roundtrip() {
        let tags = vec![RoffTag::new("parameter")
            .with_key("name", RoffValue::Char("the \"best\" zone".to_string()))
            .with_key(
                "codeNames",
                RoffValue::CharArray(vec![r"C:\data".to_string(), "\"".to_string(), String::new()]),
            )];
        let mut out = Vec::new();
        encode(&mut out, &tags).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"char name "the \"best\" zone""#));
        assert!(text.contains(r#" "C:\\data""#));

        assert_eq!(decode(&text).unwrap(), tags);
    }

    #[test]
    fn test_lone_backslash_is_kept() {
        let tokens = tokenize(r#""a\b""#).unwrap();
        assert_eq!(tokens[0].0, Token::Quoted(r"a\b".to_string()));
    }
}
