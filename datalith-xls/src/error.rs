//! Error types for the spreadsheet writer.

use core::fmt::{self, Display};

use datalith::StreamError;

/// Error produced while emitting an XML spreadsheet.
#[derive(Debug)]
pub struct XlsError {
    /// The specific kind of error.
    pub kind: XlsErrorKind,
}

/// Specific error kinds for the spreadsheet writer.
#[derive(Debug)]
pub enum XlsErrorKind {
    /// Objects have no spreadsheet representation.
    ObjectsUnsupported,
    /// Arrays nest at most two deep: the table and its rows.
    ArrayInRow,
    /// A worksheet name containing one of `\ / ? * [ ]`.
    InvalidWorksheetName,
    /// Output bytes were not valid UTF-8 (a binary-subtyped string leaked
    /// into a text document).
    InvalidUtf8,
    /// Error surfaced by the stream layer.
    Stream(StreamError),
    /// An I/O failure in the byte sink.
    Io(String),
}

impl XlsError {
    pub(crate) const fn new(kind: XlsErrorKind) -> Self {
        XlsError { kind }
    }

    /// A stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            XlsErrorKind::ObjectsUnsupported => "xls::objects_unsupported",
            XlsErrorKind::ArrayInRow => "xls::array_in_row",
            XlsErrorKind::InvalidWorksheetName => "xls::invalid_worksheet_name",
            XlsErrorKind::InvalidUtf8 => "xls::invalid_utf8",
            XlsErrorKind::Stream(_) => "xls::stream",
            XlsErrorKind::Io(_) => "xls::io",
        }
    }
}

impl Display for XlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            XlsErrorKind::ObjectsUnsupported => {
                write!(f, "'object' value not allowed in spreadsheet output")
            }
            XlsErrorKind::ArrayInRow => write!(f, "'array' value not allowed in row output"),
            XlsErrorKind::InvalidWorksheetName => {
                write!(f, "worksheet name cannot contain any of '\\/?*[]'")
            }
            XlsErrorKind::InvalidUtf8 => write!(f, "output is not valid UTF-8"),
            XlsErrorKind::Stream(err) => write!(f, "{err}"),
            XlsErrorKind::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for XlsError {}

impl From<StreamError> for XlsError {
    fn from(err: StreamError) -> Self {
        XlsError::new(XlsErrorKind::Stream(err))
    }
}

/// Result type for the spreadsheet writer.
pub type Result<T> = core::result::Result<T, XlsError>;
