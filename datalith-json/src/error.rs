//! Error types for the JSON codec.

use core::fmt::{self, Display};

use datalith::StreamError;

/// Error produced while parsing or emitting JSON.
#[derive(Debug)]
pub struct JsonError {
    /// The specific kind of error.
    pub kind: JsonErrorKind,
    /// Byte offset in the input where the error occurred, when known.
    pub offset: Option<usize>,
}

/// Specific error kinds for the JSON codec.
#[derive(Debug)]
pub enum JsonErrorKind {
    /// A byte that cannot start or continue the expected construct.
    UnexpectedChar {
        /// The offending byte, lossily decoded.
        got: char,
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// Input ended mid-construct.
    UnexpectedEof {
        /// What was expected before the end.
        expected: &'static str,
    },
    /// A number literal that does not parse.
    InvalidNumber,
    /// A malformed `\` escape or a bad `\u` sequence.
    InvalidEscape,
    /// Invalid UTF-8 where text was required.
    InvalidUtf8,
    /// Bytes after the end of the top-level value.
    TrailingData,
    /// A real with no JSON representation (NaN or infinity).
    NonFiniteReal,
    /// An object key the format cannot express.
    UnsupportedKey(&'static str),
    /// Error surfaced by the downstream stream handler.
    Stream(StreamError),
    /// An I/O failure in the byte sink.
    Io(String),
}

impl JsonError {
    /// Create an error at a byte offset.
    pub const fn new(kind: JsonErrorKind, offset: usize) -> Self {
        JsonError {
            kind,
            offset: Some(offset),
        }
    }

    /// Create an error without position information.
    pub const fn without_offset(kind: JsonErrorKind) -> Self {
        JsonError { kind, offset: None }
    }

    /// A stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            JsonErrorKind::UnexpectedChar { .. } => "json::unexpected_char",
            JsonErrorKind::UnexpectedEof { .. } => "json::unexpected_eof",
            JsonErrorKind::InvalidNumber => "json::invalid_number",
            JsonErrorKind::InvalidEscape => "json::invalid_escape",
            JsonErrorKind::InvalidUtf8 => "json::invalid_utf8",
            JsonErrorKind::TrailingData => "json::trailing_data",
            JsonErrorKind::NonFiniteReal => "json::non_finite_real",
            JsonErrorKind::UnsupportedKey(_) => "json::unsupported_key",
            JsonErrorKind::Stream(_) => "json::stream",
            JsonErrorKind::Io(_) => "json::io",
        }
    }
}

impl Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            JsonErrorKind::UnexpectedChar { got, expected } => {
                write!(f, "unexpected character {got:?}, expected {expected}")?;
            }
            JsonErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")?;
            }
            JsonErrorKind::InvalidNumber => write!(f, "invalid number literal")?,
            JsonErrorKind::InvalidEscape => write!(f, "invalid string escape")?,
            JsonErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8 sequence")?,
            JsonErrorKind::TrailingData => write!(f, "trailing data after top-level value")?,
            JsonErrorKind::NonFiniteReal => {
                write!(f, "NaN and infinite reals cannot be written as JSON")?;
            }
            JsonErrorKind::UnsupportedKey(what) => {
                write!(f, "cannot write {what} as a JSON object key")?;
            }
            JsonErrorKind::Stream(err) => write!(f, "{err}")?,
            JsonErrorKind::Io(msg) => write!(f, "I/O error: {msg}")?,
        }
        if let Some(offset) = self.offset {
            write!(f, " at byte {offset}")?;
        }
        Ok(())
    }
}

impl std::error::Error for JsonError {}

impl From<StreamError> for JsonError {
    fn from(err: StreamError) -> Self {
        JsonError::without_offset(JsonErrorKind::Stream(err))
    }
}

impl From<JsonError> for StreamError {
    fn from(err: JsonError) -> Self {
        StreamError::new(datalith::StreamErrorKind::InvalidDocument(err.to_string()))
    }
}

/// Result type for the JSON codec.
pub type Result<T> = core::result::Result<T, JsonError>;
