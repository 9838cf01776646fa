//! Pull-style JSON parser.
//!
//! [`JsonParser`] consumes a byte slice one event at a time: each call to
//! [`write_one`](JsonParser::write_one) pushes one value's worth of
//! events into a [`StreamHandler`] and returns, so a caller can
//! interleave parsing with other work. Nesting is tracked on an explicit
//! scope stack; input depth is bounded by heap, not the call stack.
//!
//! Number policy: integers without sign parse as `UInteger`, with a
//! leading `-` as `Integer`; fractions, exponents, and out-of-range
//! integers parse as `Real`.

use log::trace;

use datalith::{StreamHandler, StreamInput, Value};

use crate::error::{JsonError, JsonErrorKind, Result};

enum Scope {
    Array,
    Object,
}

enum State {
    /// Expecting the top-level value.
    Start,
    /// After `[`: a value or `]`.
    ArrayFirst,
    /// After an array element: `,` or `]`.
    ArrayNext,
    /// After `{`: a key or `}`.
    ObjectFirst,
    /// After an object entry: `,` or `}`.
    ObjectNext,
    /// After a key: `:` then the value.
    ObjectColon,
    /// Top-level value complete.
    Done,
}

/// A resumable JSON parser over a borrowed byte slice.
pub struct JsonParser<'de> {
    input: &'de [u8],
    pos: usize,
    scopes: Vec<Scope>,
    state: State,
    started: bool,
    string_buf: Vec<u8>,
}

impl<'de> JsonParser<'de> {
    /// Parse from a byte slice.
    #[must_use]
    pub fn new(input: &'de [u8]) -> Self {
        JsonParser {
            input,
            pos: 0,
            scopes: Vec::new(),
            state: State::Start,
            started: false,
            string_buf: Vec::new(),
        }
    }

    /// Current byte offset into the input.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Whether the top-level value has been fully parsed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.input.get(self.pos) {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn eof(&self, expected: &'static str) -> JsonError {
        JsonError::new(JsonErrorKind::UnexpectedEof { expected }, self.pos)
    }

    fn unexpected(&self, got: u8, expected: &'static str) -> JsonError {
        JsonError::new(
            JsonErrorKind::UnexpectedChar {
                got: char::from(got),
                expected,
            },
            self.pos,
        )
    }

    fn expect_literal(&mut self, literal: &'static [u8], expected: &'static str) -> Result<()> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(JsonError::new(
                JsonErrorKind::UnexpectedChar {
                    got: char::from(self.peek().unwrap_or(0)),
                    expected,
                },
                self.pos,
            ))
        }
    }

    /// Decode one quoted string (cursor on the opening quote) into
    /// `string_buf`.
    fn parse_string(&mut self) -> Result<()> {
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.pos += 1;
        self.string_buf.clear();
        loop {
            let Some(b) = self.peek() else {
                return Err(self.eof("closing '\"'"));
            };
            match b {
                b'"' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'\\' => {
                    self.pos += 1;
                    self.parse_escape()?;
                }
                _ => {
                    self.string_buf.push(b);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_escape(&mut self) -> Result<()> {
        let Some(b) = self.peek() else {
            return Err(self.eof("escape character"));
        };
        self.pos += 1;
        match b {
            b'"' => self.string_buf.push(b'"'),
            b'\\' => self.string_buf.push(b'\\'),
            b'/' => self.string_buf.push(b'/'),
            b'b' => self.string_buf.push(0x08),
            b'f' => self.string_buf.push(0x0c),
            b'n' => self.string_buf.push(b'\n'),
            b'r' => self.string_buf.push(b'\r'),
            b't' => self.string_buf.push(b'\t'),
            b'u' => {
                let unit = self.parse_hex4()?;
                let scalar = if (0xd800..0xdc00).contains(&unit) {
                    // High surrogate: a low surrogate must follow.
                    self.expect_literal(b"\\u", "low surrogate escape")
                        .map_err(|_| {
                            JsonError::new(JsonErrorKind::InvalidEscape, self.pos)
                        })?;
                    let low = self.parse_hex4()?;
                    if !(0xdc00..0xe000).contains(&low) {
                        return Err(JsonError::new(JsonErrorKind::InvalidEscape, self.pos));
                    }
                    0x10000 + ((u32::from(unit) - 0xd800) << 10) + (u32::from(low) - 0xdc00)
                } else if (0xdc00..0xe000).contains(&unit) {
                    return Err(JsonError::new(JsonErrorKind::InvalidEscape, self.pos));
                } else {
                    u32::from(unit)
                };
                let c = char::from_u32(scalar)
                    .ok_or(JsonError::new(JsonErrorKind::InvalidEscape, self.pos))?;
                let mut utf8 = [0u8; 4];
                self.string_buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
            _ => return Err(JsonError::new(JsonErrorKind::InvalidEscape, self.pos - 1)),
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u16> {
        let end = self.pos + 4;
        let digits = self
            .input
            .get(self.pos..end)
            .ok_or_else(|| self.eof("four hex digits"))?;
        let text = core::str::from_utf8(digits)
            .map_err(|_| JsonError::new(JsonErrorKind::InvalidEscape, self.pos))?;
        let unit = u16::from_str_radix(text, 16)
            .map_err(|_| JsonError::new(JsonErrorKind::InvalidEscape, self.pos))?;
        self.pos = end;
        Ok(unit)
    }

    /// Parse one number literal (cursor on `-` or a digit) and emit the
    /// matching scalar event.
    fn parse_number(&mut self, out: &mut dyn StreamHandler) -> Result<()> {
        let start = self.pos;
        let mut real = false;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' | b'e' | b'E' | b'+' | b'-' => {
                    real = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = core::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| JsonError::new(JsonErrorKind::InvalidNumber, start))?;
        let negative = text.starts_with('-');

        if !real {
            if negative {
                if let Ok(i) = text.parse::<i64>() {
                    out.integer_value(&Value::int(i))?;
                    return Ok(());
                }
            } else if let Ok(u) = text.parse::<u64>() {
                out.uinteger_value(&Value::uint(u))?;
                return Ok(());
            }
            // Out-of-range integers fall through to the real domain.
        }
        let r: f64 = text
            .parse()
            .map_err(|_| JsonError::new(JsonErrorKind::InvalidNumber, start))?;
        out.real_value(&Value::real(r))?;
        Ok(())
    }

    fn emit_string(&mut self, out: &mut dyn StreamHandler) -> Result<()> {
        self.parse_string()?;
        let hint = Value::string("");
        out.begin_string(&hint, Some(self.string_buf.len()))?;
        if !self.string_buf.is_empty() {
            out.append_to_string(&self.string_buf)?;
        }
        out.end_string(&hint)?;
        Ok(())
    }

    /// Parse one value starting at the cursor, emitting its leading
    /// event(s).
    fn parse_value_event(&mut self, out: &mut dyn StreamHandler) -> Result<()> {
        let Some(b) = self.peek() else {
            return Err(self.eof("a value"));
        };
        match b {
            b'{' => {
                self.pos += 1;
                out.begin_object(&Value::object(datalith::Object::new()), None)?;
                self.scopes.push(Scope::Object);
                self.state = State::ObjectFirst;
            }
            b'[' => {
                self.pos += 1;
                out.begin_array(&Value::array(datalith::Array::new()), None)?;
                self.scopes.push(Scope::Array);
                self.state = State::ArrayFirst;
            }
            b'"' => {
                self.emit_string(out)?;
                self.finish_value(out)?;
            }
            b'n' => {
                self.expect_literal(b"null", "'null'")?;
                out.null_value(&Value::null())?;
                self.finish_value(out)?;
            }
            b't' => {
                self.expect_literal(b"true", "'true'")?;
                out.bool_value(&Value::boolean(true))?;
                self.finish_value(out)?;
            }
            b'f' => {
                self.expect_literal(b"false", "'false'")?;
                out.bool_value(&Value::boolean(false))?;
                self.finish_value(out)?;
            }
            b'-' | b'0'..=b'9' => {
                self.parse_number(out)?;
                self.finish_value(out)?;
            }
            other => return Err(self.unexpected(other, "a value")),
        }
        Ok(())
    }

    /// A value just completed: pick the follow-up state, closing the
    /// document when the scope stack is empty.
    fn finish_value(&mut self, out: &mut dyn StreamHandler) -> Result<()> {
        self.state = match self.scopes.last() {
            None => {
                trace!("json parser: document complete at byte {}", self.pos);
                out.end()?;
                State::Done
            }
            Some(Scope::Array) => State::ArrayNext,
            Some(Scope::Object) => State::ObjectNext,
        };
        Ok(())
    }

    fn parse_key_event(&mut self, out: &mut dyn StreamHandler) -> Result<()> {
        match self.peek() {
            Some(b'"') => {
                self.emit_string(out)?;
                self.state = State::ObjectColon;
                Ok(())
            }
            Some(other) => Err(self.unexpected(other, "an object key")),
            None => Err(self.eof("an object key")),
        }
    }

    /// Perform one value's worth of parsing, pushing events into `out`.
    ///
    /// Returns `false` once the top-level value (and any trailing
    /// whitespace) has been consumed.
    pub fn write_one(&mut self, out: &mut dyn StreamHandler) -> Result<bool> {
        if !self.started {
            trace!("json parser: document start ({} bytes)", self.input.len());
            out.begin()?;
            self.started = true;
        }
        self.skip_whitespace();

        match self.state {
            State::Done => {
                if self.pos < self.input.len() {
                    return Err(JsonError::new(JsonErrorKind::TrailingData, self.pos));
                }
                return Ok(false);
            }
            State::Start => self.parse_value_event(out)?,
            State::ArrayFirst => match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    self.scopes.pop();
                    out.end_array(&Value::null())?;
                    self.finish_value(out)?;
                }
                _ => self.parse_value_event(out)?,
            },
            State::ArrayNext => match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.parse_value_event(out)?;
                }
                Some(b']') => {
                    self.pos += 1;
                    self.scopes.pop();
                    out.end_array(&Value::null())?;
                    self.finish_value(out)?;
                }
                Some(other) => return Err(self.unexpected(other, "',' or ']'")),
                None => return Err(self.eof("',' or ']'")),
            },
            State::ObjectFirst => match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    self.scopes.pop();
                    out.end_object(&Value::null())?;
                    self.finish_value(out)?;
                }
                _ => self.parse_key_event(out)?,
            },
            State::ObjectNext => match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.parse_key_event(out)?;
                }
                Some(b'}') => {
                    self.pos += 1;
                    self.scopes.pop();
                    out.end_object(&Value::null())?;
                    self.finish_value(out)?;
                }
                Some(other) => return Err(self.unexpected(other, "',' or '}'")),
                None => return Err(self.eof("',' or '}'")),
            },
            State::ObjectColon => match self.peek() {
                Some(b':') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.parse_value_event(out)?;
                }
                Some(other) => return Err(self.unexpected(other, "':'")),
                None => return Err(self.eof("':'")),
            },
        }
        Ok(true)
    }

    /// Drive [`write_one`](Self::write_one) to completion.
    pub fn write_all(&mut self, out: &mut dyn StreamHandler) -> Result<()> {
        while self.write_one(out)? {}
        Ok(())
    }
}

impl StreamInput for JsonParser<'_> {
    fn write_one(
        &mut self,
        out: &mut dyn StreamHandler,
    ) -> core::result::Result<bool, datalith::StreamError> {
        JsonParser::write_one(self, out).map_err(Into::into)
    }
}
