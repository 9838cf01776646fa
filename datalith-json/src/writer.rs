//! Streaming JSON writer.
//!
//! [`JsonWriter`] is a [`StreamHandler`]: it can be fed by any stream
//! producer — a tree via [`datalith::write_value`], a parser for another
//! format, a network fetcher — and emits RFC 8259 text as events arrive.
//! Value-position strings stream chunk by chunk; object keys buffer until
//! complete because the quoting decision needs the whole key.

use std::io::Write;

use datalith::{Kind, NestingTracker, StreamError, StreamHandler, Value};

use crate::error::{JsonError, JsonErrorKind};

/// Options for JSON output.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to pretty-print with newlines and indentation.
    pub pretty: bool,
    /// Indentation unit for pretty-printing.
    pub indent: &'static str,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            pretty: false,
            indent: "  ",
        }
    }
}

impl WriteOptions {
    /// Compact output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty-printing with the default two-space indent.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Set a custom indentation unit (implies pretty-printing).
    #[must_use]
    pub fn indent(mut self, indent: &'static str) -> Self {
        self.indent = indent;
        self.pretty = true;
        self
    }
}

/// A [`StreamHandler`] writing JSON text to a byte sink.
pub struct JsonWriter<W: Write> {
    out: W,
    options: WriteOptions,
    nesting: NestingTracker,
    /// Buffered object key, while one is being streamed in.
    key_buf: Option<Vec<u8>>,
    /// Whether a value-position string is currently streaming.
    in_value_string: bool,
}

impl<W: Write> JsonWriter<W> {
    /// Write compact JSON into `out`.
    pub fn new(out: W) -> Self {
        Self::with_options(out, WriteOptions::default())
    }

    /// Write JSON into `out` with explicit options.
    pub fn with_options(out: W, options: WriteOptions) -> Self {
        JsonWriter {
            out,
            options,
            nesting: NestingTracker::new(),
            key_buf: None,
            in_value_string: false,
        }
    }

    /// Recover the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn io(err: std::io::Error) -> StreamError {
        StreamError::from(err)
    }

    fn newline_indent(&mut self, depth: usize) -> Result<(), StreamError> {
        self.out.write_all(b"\n").map_err(Self::io)?;
        for _ in 0..depth {
            self.out
                .write_all(self.options.indent.as_bytes())
                .map_err(Self::io)?;
        }
        Ok(())
    }

    /// Write the separator that belongs before the next item (comma,
    /// indentation, or a buffered key plus colon).
    fn before_item(&mut self) -> Result<(), StreamError> {
        if self.nesting.next_is_key() {
            // The item IS the key; separators for keys are handled when
            // the key is flushed.
            return Ok(());
        }
        if let Some(key) = self.key_buf.take() {
            // Key/value pair: separator, quoted key, colon.
            if self.nesting.item_count() > 1 {
                self.out.write_all(b",").map_err(Self::io)?;
            }
            if self.options.pretty {
                let depth = self.nesting.depth();
                self.newline_indent(depth)?;
            }
            self.write_quoted(&key)?;
            let colon: &[u8] = if self.options.pretty { b": " } else { b":" };
            self.out.write_all(colon).map_err(Self::io)?;
        } else if self.nesting.depth() > 0 {
            // Array element.
            if self.nesting.item_count() > 0 {
                self.out.write_all(b",").map_err(Self::io)?;
            }
            if self.options.pretty {
                let depth = self.nesting.depth();
                self.newline_indent(depth)?;
            }
        }
        Ok(())
    }

    fn write_quoted(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.out.write_all(b"\"").map_err(Self::io)?;
        self.write_escaped(bytes)?;
        self.out.write_all(b"\"").map_err(Self::io)
    }

    fn write_escaped(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        for &b in bytes {
            match b {
                b'"' => self.out.write_all(b"\\\"").map_err(Self::io)?,
                b'\\' => self.out.write_all(b"\\\\").map_err(Self::io)?,
                0x08 => self.out.write_all(b"\\b").map_err(Self::io)?,
                0x0c => self.out.write_all(b"\\f").map_err(Self::io)?,
                b'\n' => self.out.write_all(b"\\n").map_err(Self::io)?,
                b'\r' => self.out.write_all(b"\\r").map_err(Self::io)?,
                b'\t' => self.out.write_all(b"\\t").map_err(Self::io)?,
                b if b < 0x20 => {
                    write!(self.out, "\\u{b:04x}").map_err(Self::io)?;
                }
                b => self.out.write_all(&[b]).map_err(Self::io)?,
            }
        }
        Ok(())
    }

    /// Emit one scalar, routing keys into the key buffer.
    fn scalar(&mut self, v: &Value) -> Result<(), StreamError> {
        if self.nesting.next_is_key() {
            // JSON keys are strings; scalar keys are stringified through
            // the conversion matrix.
            self.key_buf = Some(v.as_string());
            self.nesting.note_item();
            return Ok(());
        }
        self.before_item()?;
        match v.kind() {
            Kind::Null => self.out.write_all(b"null").map_err(Self::io)?,
            Kind::Boolean => {
                let text: &[u8] = if v.get_bool_unchecked() { b"true" } else { b"false" };
                self.out.write_all(text).map_err(Self::io)?;
            }
            Kind::Integer => write!(self.out, "{}", v.get_int_unchecked()).map_err(Self::io)?,
            Kind::UInteger => write!(self.out, "{}", v.get_uint_unchecked()).map_err(Self::io)?,
            Kind::Real => {
                let r = v.get_real_unchecked();
                if !r.is_finite() {
                    return Err(JsonError::without_offset(JsonErrorKind::NonFiniteReal).into());
                }
                // Integral reals in the integer ranges get an explicit
                // fraction so they re-parse as reals; everything else uses
                // the shortest round-trip form.
                if r.fract() == 0.0 && r.abs() < 2e19 {
                    write!(self.out, "{r:.1}").map_err(Self::io)?;
                } else {
                    write!(self.out, "{r}").map_err(Self::io)?;
                }
            }
            _ => unreachable!("scalar event with container kind"),
        }
        self.nesting.note_item();
        Ok(())
    }
}

impl<W: Write> StreamHandler for JsonWriter<W> {
    fn begin_array(&mut self, _hint: &Value, _size: Option<usize>) -> Result<(), StreamError> {
        if self.nesting.next_is_key() {
            return Err(JsonError::without_offset(JsonErrorKind::UnsupportedKey("an array")).into());
        }
        self.before_item()?;
        self.out.write_all(b"[").map_err(Self::io)?;
        self.nesting.enter(Kind::Array);
        Ok(())
    }

    fn end_array(&mut self, _hint: &Value) -> Result<(), StreamError> {
        let had_items = self.nesting.item_count() > 0;
        self.nesting.leave();
        if self.options.pretty && had_items {
            let depth = self.nesting.depth();
            self.newline_indent(depth)?;
        }
        self.out.write_all(b"]").map_err(Self::io)
    }

    fn begin_object(&mut self, _hint: &Value, _size: Option<usize>) -> Result<(), StreamError> {
        if self.nesting.next_is_key() {
            return Err(
                JsonError::without_offset(JsonErrorKind::UnsupportedKey("an object")).into(),
            );
        }
        self.before_item()?;
        self.out.write_all(b"{").map_err(Self::io)?;
        self.nesting.enter(Kind::Object);
        Ok(())
    }

    fn end_object(&mut self, _hint: &Value) -> Result<(), StreamError> {
        let had_items = self.nesting.item_count() > 0;
        self.nesting.leave();
        if self.options.pretty && had_items {
            let depth = self.nesting.depth();
            self.newline_indent(depth)?;
        }
        self.out.write_all(b"}").map_err(Self::io)
    }

    fn begin_string(&mut self, _hint: &Value, size: Option<usize>) -> Result<(), StreamError> {
        if self.nesting.next_is_key() {
            self.key_buf = Some(Vec::with_capacity(size.unwrap_or(0)));
            return Ok(());
        }
        self.before_item()?;
        self.out.write_all(b"\"").map_err(Self::io)?;
        self.in_value_string = true;
        Ok(())
    }

    fn append_to_string(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        if let Some(key) = &mut self.key_buf {
            key.extend_from_slice(chunk);
            Ok(())
        } else if self.in_value_string {
            self.write_escaped(chunk)
        } else {
            Err(StreamError::malformed("append_to_string outside a string"))
        }
    }

    fn end_string(&mut self, _hint: &Value) -> Result<(), StreamError> {
        if self.in_value_string {
            self.in_value_string = false;
            self.out.write_all(b"\"").map_err(Self::io)?;
            self.nesting.note_item();
        } else if self.key_buf.is_some() {
            // Key complete; it is flushed by the following value's
            // separator.
            self.nesting.note_item();
        } else {
            return Err(StreamError::malformed("end_string without begin_string"));
        }
        Ok(())
    }

    fn null_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.scalar(v)
    }

    fn bool_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.scalar(v)
    }

    fn integer_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.scalar(v)
    }

    fn uinteger_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.scalar(v)
    }

    fn real_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.scalar(v)
    }
}
