//! JSON codec for the [`datalith`] value model.
//!
//! Both directions speak the stream protocol: [`JsonParser`] is a
//! pull-style [`StreamInput`](datalith::StreamInput) pushing events into
//! any handler, and [`JsonWriter`] is a
//! [`StreamHandler`](datalith::StreamHandler) any producer can drive.
//! The convenience functions wire them to [`ValueBuilder`] and
//! [`write_value`] for whole-tree conversions.
//!
//! ```
//! let v = datalith_json::from_str(r#"{"a":1,"b":[2,3.5,"x"]}"#).unwrap();
//! assert_eq!(v["a"].as_int(), 1);
//! assert_eq!(datalith_json::to_string(&v).unwrap(), r#"{"a":1,"b":[2,3.5,"x"]}"#);
//! ```

#![warn(missing_docs)]

mod error;
mod parser;
mod writer;

pub use error::{JsonError, JsonErrorKind, Result};
pub use parser::JsonParser;
pub use writer::{JsonWriter, WriteOptions};

use datalith::{Value, ValueBuilder, write_value};

/// Parse a JSON byte slice into a [`Value`] tree.
pub fn from_slice(input: &[u8]) -> Result<Value> {
    let mut parser = JsonParser::new(input);
    let mut builder = ValueBuilder::new();
    parser.write_all(&mut builder)?;
    builder
        .value()
        .ok_or_else(|| JsonError::without_offset(JsonErrorKind::UnexpectedEof { expected: "a value" }))
}

/// Parse a JSON string into a [`Value`] tree.
pub fn from_str(input: &str) -> Result<Value> {
    from_slice(input.as_bytes())
}

/// Serialize a tree as compact JSON bytes.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    to_vec_with_options(value, &WriteOptions::default())
}

/// Serialize a tree as JSON bytes with explicit options.
pub fn to_vec_with_options(value: &Value, options: &WriteOptions) -> Result<Vec<u8>> {
    let mut writer = JsonWriter::with_options(Vec::new(), options.clone());
    write_value(value, &mut writer)?;
    Ok(writer.into_inner())
}

/// Serialize a tree as a compact JSON string.
///
/// Fails on string payloads that are not valid UTF-8; use
/// [`to_vec`] for binary-tolerant output.
pub fn to_string(value: &Value) -> Result<String> {
    String::from_utf8(to_vec(value)?)
        .map_err(|_| JsonError::without_offset(JsonErrorKind::InvalidUtf8))
}

/// Serialize a tree as a pretty-printed JSON string.
pub fn to_string_pretty(value: &Value) -> Result<String> {
    let bytes = to_vec_with_options(value, &WriteOptions::default().pretty())?;
    String::from_utf8(bytes).map_err(|_| JsonError::without_offset(JsonErrorKind::InvalidUtf8))
}

/// Serialize a tree as compact JSON into an [`std::io::Write`] sink.
pub fn to_writer<W: std::io::Write>(value: &Value, out: W) -> Result<()> {
    let mut writer = JsonWriter::new(out);
    write_value(value, &mut writer)?;
    Ok(())
}
