//! Error types for the core crate.

use core::fmt::{self, Display};

use crate::value::Kind;

/// Error produced by the strict conversion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    /// The specific kind of error.
    pub kind: ConversionErrorKind,
}

/// Specific conversion failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionErrorKind {
    /// The coercion would discard information (e.g. a negative integer to
    /// an unsigned integer, or a non-numeric string to a number).
    Loss {
        /// Kind converted from.
        from: Kind,
        /// Kind converted to.
        to: Kind,
    },
    /// No coercion exists between the two kinds (container to scalar and
    /// scalar to container).
    Unsupported {
        /// Kind converted from.
        from: Kind,
        /// Kind converted to.
        to: Kind,
    },
    /// A numeric value does not fit the requested host type.
    OutOfRange {
        /// Name of the host type that could not hold the value.
        target: &'static str,
    },
    /// A string payload is not valid UTF-8 where text was required.
    InvalidUtf8,
    /// A host-type conversion found the wrong kind of value.
    WrongKind {
        /// What the conversion needed.
        expected: &'static str,
        /// The kind actually found.
        got: Kind,
    },
}

impl ConversionError {
    pub(crate) const fn new(kind: ConversionErrorKind) -> Self {
        ConversionError { kind }
    }

    /// A stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            ConversionErrorKind::Loss { .. } => "convert::loss",
            ConversionErrorKind::Unsupported { .. } => "convert::unsupported",
            ConversionErrorKind::OutOfRange { .. } => "convert::out_of_range",
            ConversionErrorKind::InvalidUtf8 => "convert::invalid_utf8",
            ConversionErrorKind::WrongKind { .. } => "convert::wrong_kind",
        }
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConversionErrorKind::Loss { from, to } => {
                write!(f, "converting {from:?} to {to:?} loses information")
            }
            ConversionErrorKind::Unsupported { from, to } => {
                write!(f, "no conversion from {from:?} to {to:?}")
            }
            ConversionErrorKind::OutOfRange { target } => {
                write!(f, "value out of range for {target}")
            }
            ConversionErrorKind::InvalidUtf8 => write!(f, "string payload is not valid UTF-8"),
            ConversionErrorKind::WrongKind { expected, got } => {
                write!(f, "expected {expected}, got {got:?} value")
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// Error produced by the link API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkError {
    /// The specific kind of error.
    pub kind: LinkErrorKind,
}

/// Specific link failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkErrorKind {
    /// A link chain loops back on itself.
    CycleDetected,
    /// A weak link's target no longer exists.
    DeadLink,
    /// The operation requires a link value.
    NotALink,
}

impl LinkError {
    pub(crate) const fn new(kind: LinkErrorKind) -> Self {
        LinkError { kind }
    }

    /// A stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            LinkErrorKind::CycleDetected => "link::cycle",
            LinkErrorKind::DeadLink => "link::dead",
            LinkErrorKind::NotALink => "link::not_a_link",
        }
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LinkErrorKind::CycleDetected => write!(f, "link chain contains a cycle"),
            LinkErrorKind::DeadLink => write!(f, "link target no longer exists"),
            LinkErrorKind::NotALink => write!(f, "value is not a link"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Error surfaced through the stream protocol.
///
/// Codec-specific errors (parse positions, format violations) live in the
/// codec crates; this type is the common currency handlers speak so a
/// producer can be driven into any consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    /// The specific kind of error.
    pub kind: StreamErrorKind,
}

/// Specific stream failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// The consumer cannot represent the event (e.g. an object pushed into
    /// a writer for a format without objects).
    Unsupported(&'static str),
    /// The event sequence violates the protocol (e.g. `end_array` without
    /// a matching `begin_array`).
    Malformed(&'static str),
    /// A document-level constraint was violated by otherwise well-formed
    /// events.
    InvalidDocument(String),
    /// An I/O failure in the byte sink or source.
    Io(String),
}

impl StreamError {
    /// Create an error of the given kind.
    pub const fn new(kind: StreamErrorKind) -> Self {
        StreamError { kind }
    }

    /// Shorthand for [`StreamErrorKind::Unsupported`].
    pub const fn unsupported(what: &'static str) -> Self {
        Self::new(StreamErrorKind::Unsupported(what))
    }

    /// Shorthand for [`StreamErrorKind::Malformed`].
    pub const fn malformed(what: &'static str) -> Self {
        Self::new(StreamErrorKind::Malformed(what))
    }

    /// A stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            StreamErrorKind::Unsupported(_) => "stream::unsupported",
            StreamErrorKind::Malformed(_) => "stream::malformed",
            StreamErrorKind::InvalidDocument(_) => "stream::invalid_document",
            StreamErrorKind::Io(_) => "stream::io",
        }
    }
}

impl Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StreamErrorKind::Unsupported(what) => write!(f, "unsupported event: {what}"),
            StreamErrorKind::Malformed(what) => write!(f, "malformed event sequence: {what}"),
            StreamErrorKind::InvalidDocument(msg) => write!(f, "invalid document: {msg}"),
            StreamErrorKind::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::new(StreamErrorKind::Io(err.to_string()))
    }
}
