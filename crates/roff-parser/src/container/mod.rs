//! ROFF tagged container codec.
//!
//! A ROFF file is a sequence of named tags, each holding named keys with
//! typed scalar or array values, ended by the `eof` tag:
//!
//! ```text
//! roff-asc
//! #ROFF file#
//! tag dimensions
//! int nX 4
//! endtag
//! tag eof
//! endtag
//! ```
//!
//! Both the binary (`roff-bin`) and ASCII (`roff-asc`) forms carry the same
//! structure. [`read_tags`] detects the form from the header.

pub mod ascii;
pub mod binary;

use std::io::{Read, Write};

use bytes::Bytes;
use grid_common::RoffFormat;
use tracing::debug;

use crate::error::{Result, RoffError};

/// Name of the tag that ends every ROFF file.
pub const EOF_TAG: &str = "eof";

/// A typed key value.
#[derive(Debug, Clone, PartialEq)]
pub enum RoffValue {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Float(f32),
    Double(f64),
    Char(String),
    BoolArray(Vec<bool>),
    ByteArray(Vec<u8>),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    CharArray(Vec<String>),
}

impl RoffValue {
    /// Element type name as written in files.
    pub fn type_name(&self) -> &'static str {
        match self {
            RoffValue::Bool(_) | RoffValue::BoolArray(_) => "bool",
            RoffValue::Byte(_) | RoffValue::ByteArray(_) => "byte",
            RoffValue::Int(_) | RoffValue::IntArray(_) => "int",
            RoffValue::Float(_) | RoffValue::FloatArray(_) => "float",
            RoffValue::Double(_) | RoffValue::DoubleArray(_) => "double",
            RoffValue::Char(_) | RoffValue::CharArray(_) => "char",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            RoffValue::BoolArray(_)
                | RoffValue::ByteArray(_)
                | RoffValue::IntArray(_)
                | RoffValue::FloatArray(_)
                | RoffValue::DoubleArray(_)
                | RoffValue::CharArray(_)
        )
    }

    /// Human readable kind, e.g. `float` or `array of float`.
    pub fn describe(&self) -> &'static str {
        match self {
            RoffValue::Bool(_) => "bool",
            RoffValue::Byte(_) => "byte",
            RoffValue::Int(_) => "int",
            RoffValue::Float(_) => "float",
            RoffValue::Double(_) => "double",
            RoffValue::Char(_) => "char",
            RoffValue::BoolArray(_) => "array of bool",
            RoffValue::ByteArray(_) => "array of byte",
            RoffValue::IntArray(_) => "array of int",
            RoffValue::FloatArray(_) => "array of float",
            RoffValue::DoubleArray(_) => "array of double",
            RoffValue::CharArray(_) => "array of char",
        }
    }
}

/// A named group of keys.
#[derive(Debug, Clone, PartialEq)]
pub struct RoffTag {
    pub name: String,
    pub keys: Vec<(String, RoffValue)>,
}

impl RoffTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
        }
    }

    /// Append a key.
    pub fn with_key(mut self, name: impl Into<String>, value: RoffValue) -> Self {
        self.keys.push((name.into(), value));
        self
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&RoffValue> {
        self.keys
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Read every tag up to `eof` from a ROFF stream of either form.
pub fn read_tags<R: Read>(mut reader: R) -> Result<Vec<RoffTag>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    decode_tags(Bytes::from(data))
}

/// Decode tags from an in-memory ROFF file of either form.
pub fn decode_tags(data: Bytes) -> Result<Vec<RoffTag>> {
    let format = detect_format(&data)?;
    debug!(format = format.as_str(), size = data.len(), "Decoding ROFF container");
    match format {
        RoffFormat::Binary => binary::decode(data),
        RoffFormat::Ascii => {
            let text = std::str::from_utf8(&data)
                .map_err(|e| RoffError::malformed(format!("byte {}", e.valid_up_to()), "invalid UTF-8"))?;
            ascii::decode(text)
        }
    }
}

/// Which form a ROFF file is in, from its header.
pub fn detect_format(data: &[u8]) -> Result<RoffFormat> {
    if data.starts_with(binary::HEADER) {
        Ok(RoffFormat::Binary)
    } else if data.starts_with(ascii::HEADER.as_bytes()) {
        Ok(RoffFormat::Ascii)
    } else {
        Err(RoffError::InvalidHeader)
    }
}

/// Write `tags` followed by the `eof` tag.
pub fn write_tags<W: Write>(writer: &mut W, tags: &[RoffTag], format: RoffFormat) -> Result<()> {
    match format {
        RoffFormat::Binary => writer.write_all(&binary::encode(tags))?,
        RoffFormat::Ascii => ascii::encode(writer, tags)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tags() -> Vec<RoffTag> {
        vec![
            RoffTag::new("filedata")
                .with_key("byteswaptest", RoffValue::Int(1))
                .with_key("filetype", RoffValue::Char("grid".to_string())),
            RoffTag::new("mixed")
                .with_key("flag", RoffValue::Bool(true))
                .with_key("code", RoffValue::Byte(7))
                .with_key("ratio", RoffValue::Double(0.1))
                .with_key("offset", RoffValue::Float(-2.5))
                .with_key("flags", RoffValue::BoolArray(vec![true, false, true]))
                .with_key("codes", RoffValue::ByteArray(vec![1, 2, 4, 8]))
                .with_key("counts", RoffValue::IntArray(vec![-1, 0, 70000]))
                .with_key("depths", RoffValue::FloatArray(vec![0.1, 1e30, -3.0]))
                .with_key("precise", RoffValue::DoubleArray(vec![1.0 / 3.0]))
                .with_key("names", RoffValue::CharArray(vec!["a b".to_string(), String::new()])),
            RoffTag::new("empty"),
        ]
    }

    #[test]
    fn test_binary_roundtrip() {
        let mut out = Vec::new();
        write_tags(&mut out, &sample_tags(), RoffFormat::Binary).unwrap();
        assert!(out.starts_with(b"roff-bin\0"));
        assert_eq!(read_tags(out.as_slice()).unwrap(), sample_tags());
    }

    #[test]
    fn test_ascii_roundtrip() {
        let mut out = Vec::new();
        write_tags(&mut out, &sample_tags(), RoffFormat::Ascii).unwrap();
        assert!(out.starts_with(b"roff-asc\n"));
        assert_eq!(read_tags(out.as_slice()).unwrap(), sample_tags());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"roff-bin\0#ROFF file#\0").unwrap(), RoffFormat::Binary);
        assert_eq!(detect_format(b"roff-asc\n").unwrap(), RoffFormat::Ascii);
        assert!(matches!(detect_format(b"SPECGRID"), Err(RoffError::InvalidHeader)));
        assert!(matches!(detect_format(b""), Err(RoffError::InvalidHeader)));
    }

    #[test]
    fn test_tag_get() {
        let tags = sample_tags();
        assert_eq!(tags[0].get("filetype"), Some(&RoffValue::Char("grid".to_string())));
        assert_eq!(tags[0].get("missing"), None);
    }

    #[test]
    fn test_value_descriptions() {
        assert_eq!(RoffValue::FloatArray(vec![]).type_name(), "float");
        assert_eq!(RoffValue::FloatArray(vec![]).describe(), "array of float");
        assert!(RoffValue::CharArray(vec![]).is_array());
        assert!(!RoffValue::Char(String::new()).is_array());
    }
}
