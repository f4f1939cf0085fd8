//! Binary ROFF (`roff-bin`).
//!
//! Every token is a null-terminated string. Scalar keys are written as
//! `type name value` and arrays as `array type name count values...`.
//! Numbers are stored in the byte order of the writer; the
//! `filedata.byteswaptest` key holds 1 so readers can detect it.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use super::{RoffTag, RoffValue, EOF_TAG};
use crate::error::{Result, RoffError};

/// Leading bytes of every binary ROFF file.
pub const HEADER: &[u8] = b"roff-bin\0";

const CREATOR: &str = concat!("#Creator: ", env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"), "#");

struct Decoder {
    data: Bytes,
    size: usize,
    little_endian: bool,
}

impl Decoder {
    fn new(data: Bytes) -> Self {
        Self {
            size: data.len(),
            data,
            little_endian: true,
        }
    }

    fn location(&self) -> String {
        format!("byte {}", self.size - self.data.remaining())
    }

    fn ensure(&self, needed: usize, context: &str) -> Result<()> {
        if self.data.remaining() < needed {
            return Err(RoffError::UnexpectedEof(context.to_string()));
        }
        Ok(())
    }

    fn read_string(&mut self, context: &str) -> Result<String> {
        let location = self.location();
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| RoffError::UnexpectedEof(context.to_string()))?;
        let raw = self.data.split_to(end);
        self.data.advance(1);
        String::from_utf8(raw.to_vec())
            .map_err(|_| RoffError::malformed(location, format!("{} is not valid UTF-8", context)))
    }

    fn read_u8(&mut self, context: &str) -> Result<u8> {
        self.ensure(1, context)?;
        Ok(self.data.get_u8())
    }

    fn read_i32(&mut self, context: &str) -> Result<i32> {
        self.ensure(4, context)?;
        Ok(if self.little_endian {
            self.data.get_i32_le()
        } else {
            self.data.get_i32()
        })
    }

    fn read_f32(&mut self, context: &str) -> Result<f32> {
        self.ensure(4, context)?;
        Ok(if self.little_endian {
            self.data.get_f32_le()
        } else {
            self.data.get_f32()
        })
    }

    fn read_f64(&mut self, context: &str) -> Result<f64> {
        self.ensure(8, context)?;
        Ok(if self.little_endian {
            self.data.get_f64_le()
        } else {
            self.data.get_f64()
        })
    }

    /// Read `filedata.byteswaptest` and switch byte order to match it.
    fn read_byteswaptest(&mut self) -> Result<RoffValue> {
        self.ensure(4, "byteswaptest")?;
        let location = self.location();
        let mut raw = [0u8; 4];
        self.data.copy_to_slice(&mut raw);
        if i32::from_le_bytes(raw) == 1 {
            self.little_endian = true;
        } else if i32::from_be_bytes(raw) == 1 {
            self.little_endian = false;
        } else {
            return Err(RoffError::malformed(location, "byteswaptest is not 1 in either byte order"));
        }
        Ok(RoffValue::Int(1))
    }

    fn read_scalar(&mut self, type_name: &str, context: &str) -> Result<RoffValue> {
        Ok(match type_name {
            "bool" => RoffValue::Bool(self.read_u8(context)? != 0),
            "byte" => RoffValue::Byte(self.read_u8(context)?),
            "int" => RoffValue::Int(self.read_i32(context)?),
            "float" => RoffValue::Float(self.read_f32(context)?),
            "double" => RoffValue::Double(self.read_f64(context)?),
            "char" => RoffValue::Char(self.read_string(context)?),
            other => {
                return Err(RoffError::malformed(
                    self.location(),
                    format!("unknown type '{}' in {}", other, context),
                ))
            }
        })
    }

    fn read_array(&mut self, type_name: &str, count: usize, context: &str) -> Result<RoffValue> {
        let element_size = match type_name {
            "bool" | "byte" => 1,
            "int" | "float" => 4,
            "double" => 8,
            // strings are at least their terminator
            "char" => 1,
            other => {
                return Err(RoffError::malformed(
                    self.location(),
                    format!("unknown array type '{}' in {}", other, context),
                ))
            }
        };
        self.ensure(count.saturating_mul(element_size), context)?;

        Ok(match type_name {
            "bool" => RoffValue::BoolArray((0..count).map(|_| self.data.get_u8() != 0).collect()),
            "byte" => {
                let raw = self.data.split_to(count);
                RoffValue::ByteArray(raw.to_vec())
            }
            "int" => RoffValue::IntArray(
                (0..count)
                    .map(|_| self.read_i32(context))
                    .collect::<Result<_>>()?,
            ),
            "float" => RoffValue::FloatArray(
                (0..count)
                    .map(|_| self.read_f32(context))
                    .collect::<Result<_>>()?,
            ),
            "double" => RoffValue::DoubleArray(
                (0..count)
                    .map(|_| self.read_f64(context))
                    .collect::<Result<_>>()?,
            ),
            _ => RoffValue::CharArray(
                (0..count)
                    .map(|_| self.read_string(context))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    fn read_tag_body(&mut self, name: String) -> Result<RoffTag> {
        let mut tag = RoffTag::new(name);
        loop {
            let context = format!("tag {}", tag.name);
            let token = self.read_string(&context)?;
            match token.as_str() {
                "endtag" => return Ok(tag),
                "array" => {
                    let type_name = self.read_string(&context)?;
                    let key = self.read_string(&context)?;
                    let context = format!("{}.{}", tag.name, key);
                    let location = self.location();
                    let count = usize::try_from(self.read_i32(&context)?).map_err(|_| {
                        RoffError::malformed(location, format!("negative array length for {}", context))
                    })?;
                    let value = self.read_array(&type_name, count, &context)?;
                    tag.keys.push((key, value));
                }
                type_name => {
                    let type_name = type_name.to_string();
                    let key = self.read_string(&context)?;
                    let context = format!("{}.{}", tag.name, key);
                    let value = if type_name == "int" && key == "byteswaptest" {
                        self.read_byteswaptest()?
                    } else {
                        self.read_scalar(&type_name, &context)?
                    };
                    tag.keys.push((key, value));
                }
            }
        }
    }
}

/// Decode a binary ROFF file into its tags, excluding `eof`.
pub fn decode(data: Bytes) -> Result<Vec<RoffTag>> {
    let mut decoder = Decoder::new(data);
    if decoder.read_string("header")? != "roff-bin" {
        return Err(RoffError::InvalidHeader);
    }

    let mut tags = Vec::new();
    loop {
        if !decoder.data.has_remaining() {
            warn!("ROFF data ended without an eof tag");
            break;
        }
        let location = decoder.location();
        let token = decoder.read_string("tag")?;
        if token.starts_with('#') {
            continue;
        }
        if token != "tag" {
            return Err(RoffError::malformed(
                location,
                format!("expected 'tag', found '{}'", token),
            ));
        }
        let name = decoder.read_string("tag name")?;
        if name == EOF_TAG {
            break;
        }
        tags.push(decoder.read_tag_body(name)?);
    }
    Ok(tags)
}

fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

fn put_len(buf: &mut BytesMut, len: usize) {
    buf.put_i32_le(len as i32);
}

fn put_tag(buf: &mut BytesMut, tag: &RoffTag) {
    put_str(buf, "tag");
    put_str(buf, &tag.name);
    for (key, value) in &tag.keys {
        if value.is_array() {
            put_str(buf, "array");
        }
        put_str(buf, value.type_name());
        put_str(buf, key);
        match value {
            RoffValue::Bool(v) => buf.put_u8(u8::from(*v)),
            RoffValue::Byte(v) => buf.put_u8(*v),
            RoffValue::Int(v) => buf.put_i32_le(*v),
            RoffValue::Float(v) => buf.put_f32_le(*v),
            RoffValue::Double(v) => buf.put_f64_le(*v),
            RoffValue::Char(v) => put_str(buf, v),
            RoffValue::BoolArray(values) => {
                put_len(buf, values.len());
                values.iter().for_each(|&v| buf.put_u8(u8::from(v)));
            }
            RoffValue::ByteArray(values) => {
                put_len(buf, values.len());
                buf.put_slice(values);
            }
            RoffValue::IntArray(values) => {
                put_len(buf, values.len());
                values.iter().for_each(|&v| buf.put_i32_le(v));
            }
            RoffValue::FloatArray(values) => {
                put_len(buf, values.len());
                values.iter().for_each(|&v| buf.put_f32_le(v));
            }
            RoffValue::DoubleArray(values) => {
                put_len(buf, values.len());
                values.iter().for_each(|&v| buf.put_f64_le(v));
            }
            RoffValue::CharArray(values) => {
                put_len(buf, values.len());
                values.iter().for_each(|v| put_str(buf, v));
            }
        }
    }
    put_str(buf, "endtag");
}

/// Encode tags as a little-endian binary ROFF file, appending `eof`.
pub fn encode(tags: &[RoffTag]) -> BytesMut {
    let mut buf = BytesMut::new();
    put_str(&mut buf, "roff-bin");
    put_str(&mut buf, "#ROFF file#");
    put_str(&mut buf, CREATOR);
    for tag in tags {
        put_tag(&mut buf, tag);
    }
    put_tag(&mut buf, &RoffTag::new(EOF_TAG));
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_str(data: &mut Vec<u8>, s: &str) {
        data.extend_from_slice(s.as_bytes());
        data.push(0);
    }

    fn big_endian_file() -> Vec<u8> {
        let mut data = Vec::new();
        push_str(&mut data, "roff-bin");
        push_str(&mut data, "#ROFF file#");
        push_str(&mut data, "tag");
        push_str(&mut data, "filedata");
        push_str(&mut data, "int");
        push_str(&mut data, "byteswaptest");
        data.extend_from_slice(&1i32.to_be_bytes());
        push_str(&mut data, "endtag");
        push_str(&mut data, "tag");
        push_str(&mut data, "dimensions");
        push_str(&mut data, "int");
        push_str(&mut data, "nX");
        data.extend_from_slice(&3i32.to_be_bytes());
        push_str(&mut data, "array");
        push_str(&mut data, "float");
        push_str(&mut data, "data");
        data.extend_from_slice(&2i32.to_be_bytes());
        data.extend_from_slice(&1.5f32.to_be_bytes());
        data.extend_from_slice(&(-2.0f32).to_be_bytes());
        push_str(&mut data, "endtag");
        push_str(&mut data, "tag");
        push_str(&mut data, "eof");
        push_str(&mut data, "endtag");
        data
    }

    #[test]
    fn test_decode_big_endian() {
        let tags = decode(Bytes::from(big_endian_file())).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].get("byteswaptest"), Some(&RoffValue::Int(1)));
        assert_eq!(tags[1].get("nX"), Some(&RoffValue::Int(3)));
        assert_eq!(tags[1].get("data"), Some(&RoffValue::FloatArray(vec![1.5, -2.0])));
    }

    #[test]
    fn test_encode_layout() {
        let tags = vec![RoffTag::new("dimensions").with_key("nX", RoffValue::Int(2))];
        let encoded = encode(&tags);

        let mut expected = Vec::new();
        push_str(&mut expected, "roff-bin");
        push_str(&mut expected, "#ROFF file#");
        push_str(&mut expected, CREATOR);
        push_str(&mut expected, "tag");
        push_str(&mut expected, "dimensions");
        push_str(&mut expected, "int");
        push_str(&mut expected, "nX");
        expected.extend_from_slice(&2i32.to_le_bytes());
        push_str(&mut expected, "endtag");
        push_str(&mut expected, "tag");
        push_str(&mut expected, "eof");
        push_str(&mut expected, "endtag");

        assert_eq!(encoded.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_truncated_array() {
        let mut data = big_endian_file();
        // drop the trailing endtag and eof tag (22 bytes) and half the floats
        let cut = data.len() - 26;
        data.truncate(cut);
        let err = decode(Bytes::from(data)).unwrap_err();
        assert!(matches!(err, RoffError::UnexpectedEof(ref context) if context == "dimensions.data"));
    }

    #[test]
    fn test_missing_eof_is_tolerated() {
        let mut data = big_endian_file();
        let eof_len = "tag\0eof\0endtag\0".len();
        data.truncate(data.len() - eof_len);
        assert_eq!(decode(Bytes::from(data)).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_type() {
        let mut data = Vec::new();
        push_str(&mut data, "roff-bin");
        push_str(&mut data, "tag");
        push_str(&mut data, "t");
        push_str(&mut data, "quad");
        push_str(&mut data, "k");
        data.extend_from_slice(&[0; 16]);
        let err = decode(Bytes::from(data)).unwrap_err();
        assert!(err.to_string().contains("unknown type 'quad'"));
    }

    #[test]
    fn test_bad_byteswaptest() {
        let mut data = Vec::new();
        push_str(&mut data, "roff-bin");
        push_str(&mut data, "tag");
        push_str(&mut data, "filedata");
        push_str(&mut data, "int");
        push_str(&mut data, "byteswaptest");
        data.extend_from_slice(&2i32.to_le_bytes());
        assert!(matches!(
            decode(Bytes::from(data)),
            Err(RoffError::Malformed { .. })
        ));
    }

    #[test]
    fn test_not_a_tag() {
        let mut data = Vec::new();
        push_str(&mut data, "roff-bin");
        push_str(&mut data, "endtag");
        match decode(Bytes::from(data)) {
            Err(RoffError::Malformed { location, reason }) => {
                assert_eq!(location, "byte 9");
                assert!(reason.contains("endtag"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
