//! Error types for HTTP body ingestion.

use core::fmt::{self, Display};

use datalith::StreamError;

/// Error produced while building requests or streaming bodies.
#[derive(Debug)]
pub struct HttpError {
    /// The specific kind of error.
    pub kind: HttpErrorKind,
}

/// Specific error kinds for HTTP body ingestion.
#[derive(Debug)]
pub enum HttpErrorKind {
    /// The URL value is not a usable URI.
    InvalidUrl,
    /// A header attribute could not become a header name/value pair.
    InvalidHeader,
    /// A transport failure while reading the body.
    Transport(String),
    /// Error surfaced by the downstream stream handler.
    Stream(StreamError),
}

impl HttpError {
    pub(crate) const fn new(kind: HttpErrorKind) -> Self {
        HttpError { kind }
    }

    /// A stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            HttpErrorKind::InvalidUrl => "http::invalid_url",
            HttpErrorKind::InvalidHeader => "http::invalid_header",
            HttpErrorKind::Transport(_) => "http::transport",
            HttpErrorKind::Stream(_) => "http::stream",
        }
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HttpErrorKind::InvalidUrl => write!(f, "URL value is not a valid URI"),
            HttpErrorKind::InvalidHeader => write!(f, "attribute is not a valid header"),
            HttpErrorKind::Transport(msg) => write!(f, "transport error: {msg}"),
            HttpErrorKind::Stream(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<StreamError> for HttpError {
    fn from(err: StreamError) -> Self {
        HttpError::new(HttpErrorKind::Stream(err))
    }
}

impl From<HttpError> for StreamError {
    fn from(err: HttpError) -> Self {
        StreamError::new(datalith::StreamErrorKind::InvalidDocument(err.to_string()))
    }
}

/// Result type for HTTP body ingestion.
pub type Result<T> = core::result::Result<T, HttpError>;
