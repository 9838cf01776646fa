//! HTTP body ingestion for the [`datalith`] value model.
//!
//! The transport is the caller's concern: bring any blocking client that
//! yields an [`http::Response`] over an [`std::io::Read`] body. This
//! crate supplies the two ends around it:
//!
//! - [`request_from_url`] assembles an [`http::Request`] from a URL
//!   value, reading request headers from the value's attributes (plus an
//!   explicit header map);
//! - [`BodyParser`] is a pull-style [`StreamInput`]: each
//!   [`write_one`](BodyParser::write_one) reads one chunk from the
//!   response body and pushes it as part of a single binary-string event
//!   sequence (`begin_string` tagged [`Subtype::BLOB`], one
//!   `append_to_string` per chunk, `end_string`), so a cooperative event
//!   loop can interleave network reads with other work.
//!
//! Response metadata stays available as a value:
//! [`response_metadata`] captures the status code with the headers as
//! attributes.

#![warn(missing_docs)]

mod error;

pub use error::{HttpError, HttpErrorKind, Result};

use std::io::Read;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Request, Response};
use log::trace;

use datalith::{StreamError, StreamHandler, StreamInput, Subtype, Value};

/// Build a request from a URL value.
///
/// The URL is the value's text; each attribute becomes a request header
/// (attribute keys and values are stringified through the conversion
/// matrix), and `extra_headers` are appended afterwards. The body is left
/// empty for the caller's transport to fill.
pub fn request_from_url(
    url: &Value,
    method: &str,
    extra_headers: &HeaderMap,
) -> Result<Request<()>> {
    let uri = url
        .as_str()
        .ok_or_else(|| HttpError::new(HttpErrorKind::InvalidUrl))?;
    let mut builder = Request::builder().method(method.as_bytes()).uri(uri);

    if let Some(attrs) = url.attributes() {
        for (key, value) in attrs.iter() {
            let name = HeaderName::from_bytes(&key.as_string())
                .map_err(|_| HttpError::new(HttpErrorKind::InvalidHeader))?;
            let val = HeaderValue::from_bytes(&value.as_string())
                .map_err(|_| HttpError::new(HttpErrorKind::InvalidHeader))?;
            builder = builder.header(name, val);
        }
    }
    for (name, val) in extra_headers {
        builder = builder.header(name, val);
    }
    builder
        .body(())
        .map_err(|_| HttpError::new(HttpErrorKind::InvalidUrl))
}

/// Capture a response's status and headers as a value.
///
/// The value is the status code (unsigned); each header becomes an
/// attribute keyed by the header name.
#[must_use]
pub fn response_metadata<T>(response: &Response<T>) -> Value {
    let mut meta = Value::uint(u64::from(response.status().as_u16()));
    for (name, value) in response.headers() {
        meta.insert_attribute(
            Value::string(name.as_str()),
            Value::string(value.as_bytes().to_vec()),
        );
    }
    meta
}

/// How many bytes each [`BodyParser::write_one`] call reads at most.
const CHUNK_SIZE: usize = 8 * 1024;

enum BodyState {
    /// Nothing emitted yet.
    Fresh,
    /// The string is open; chunks are flowing.
    Streaming,
    /// `end_string` and `end` have been emitted.
    Finished,
}

/// A pull parser that emits one response body as a streamed binary
/// string.
pub struct BodyParser<R: Read> {
    body: R,
    content_length: Option<usize>,
    state: BodyState,
    buf: Box<[u8; CHUNK_SIZE]>,
}

impl<R: Read> BodyParser<R> {
    /// Ingest the body of `response`.
    ///
    /// The content length, when the `Content-Length` header carries one,
    /// becomes the size hint of the string event.
    pub fn new(response: Response<R>) -> Self {
        let content_length = response
            .headers()
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        BodyParser {
            body: response.into_body(),
            content_length,
            state: BodyState::Fresh,
            buf: Box::new([0; CHUNK_SIZE]),
        }
    }

    /// Ingest a bare byte stream (no response envelope).
    pub fn from_reader(body: R) -> Self {
        BodyParser {
            body,
            content_length: None,
            state: BodyState::Fresh,
            buf: Box::new([0; CHUNK_SIZE]),
        }
    }

    fn blob_hint() -> Value {
        Value::string("").with_subtype(Subtype::BLOB)
    }

    /// Read one chunk and push it downstream.
    ///
    /// The first call opens the document and the binary string; the call
    /// that observes end-of-stream closes both. Returns `false` once the
    /// body is fully consumed.
    pub fn write_one(&mut self, out: &mut dyn StreamHandler) -> Result<bool> {
        match self.state {
            BodyState::Fresh => {
                trace!(
                    "http body: stream start (content length {:?})",
                    self.content_length
                );
                out.begin()?;
                out.begin_string(&Self::blob_hint(), self.content_length)?;
                self.state = BodyState::Streaming;
                Ok(true)
            }
            BodyState::Streaming => {
                let n = self
                    .body
                    .read(&mut self.buf[..])
                    .map_err(|e| HttpError::new(HttpErrorKind::Transport(e.to_string())))?;
                if n == 0 {
                    trace!("http body: stream end");
                    out.end_string(&Self::blob_hint())?;
                    out.end()?;
                    self.state = BodyState::Finished;
                    Ok(false)
                } else {
                    out.append_to_string(&self.buf[..n])?;
                    Ok(true)
                }
            }
            BodyState::Finished => Ok(false),
        }
    }

    /// Drive [`write_one`](Self::write_one) to completion.
    pub fn write_all(&mut self, out: &mut dyn StreamHandler) -> Result<()> {
        while self.write_one(out)? {}
        Ok(())
    }
}

impl<R: Read> StreamInput for BodyParser<R> {
    fn write_one(
        &mut self,
        out: &mut dyn StreamHandler,
    ) -> core::result::Result<bool, StreamError> {
        BodyParser::write_one(self, out).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalith::ValueBuilder;

    fn response_with_body(body: &[u8], content_length: Option<usize>) -> Response<&[u8]> {
        let mut builder = Response::builder().status(200);
        if let Some(len) = content_length {
            builder = builder.header(http::header::CONTENT_LENGTH, len);
        }
        builder.body(body).unwrap()
    }

    #[test]
    fn body_becomes_blob_string() {
        let response = response_with_body(b"hello body", Some(10));
        let mut parser = BodyParser::new(response);
        let mut builder = ValueBuilder::new();
        parser.write_all(&mut builder).unwrap();

        let v = builder.value().unwrap();
        assert!(v.is_string());
        assert_eq!(v.get_subtype(), Subtype::BLOB);
        assert_eq!(v.get_string_unchecked(), b"hello body");
    }

    #[test]
    fn large_bodies_arrive_in_chunks() {
        let body = vec![0xa5u8; CHUNK_SIZE * 3 + 17];
        let response = response_with_body(&body, None);
        let mut parser = BodyParser::new(response);
        let mut builder = ValueBuilder::new();

        let mut polls = 0usize;
        while parser.write_one(&mut builder).unwrap() {
            polls += 1;
        }
        // begin + one poll per chunk; the fetcher had suspension points.
        assert!(polls >= 4);

        let v = builder.value().unwrap();
        assert_eq!(v.string_size(), body.len());
        assert_eq!(v.get_string_unchecked(), &body[..]);
    }

    #[test]
    fn request_headers_come_from_url_attributes() {
        let mut url = Value::string("http://example.test/data");
        url.insert_attribute("accept", "application/json");
        url.insert_attribute("x-token", "secret");

        let request = request_from_url(&url, "GET", &HeaderMap::new()).unwrap();
        assert_eq!(*request.method(), http::Method::GET);
        assert_eq!(request.uri().to_string(), "http://example.test/data");
        assert_eq!(
            request.headers().get("accept").unwrap().to_str().unwrap(),
            "application/json"
        );
        assert_eq!(
            request.headers().get("x-token").unwrap().to_str().unwrap(),
            "secret"
        );
    }

    #[test]
    fn bad_urls_and_headers_error() {
        let err = request_from_url(&Value::int(3), "GET", &HeaderMap::new()).unwrap_err();
        assert!(matches!(err.kind, HttpErrorKind::InvalidUrl));

        let mut url = Value::string("http://example.test/");
        url.insert_attribute("bad header name", "v");
        let err = request_from_url(&url, "GET", &HeaderMap::new()).unwrap_err();
        assert!(matches!(err.kind, HttpErrorKind::InvalidHeader));
    }

    #[test]
    fn response_metadata_captures_status_and_headers() {
        let response = response_with_body(b"", None);
        let meta = response_metadata(&response);
        assert_eq!(meta.get_uint_unchecked(), 200);

        let response = Response::builder()
            .status(404)
            .header("content-type", "text/plain")
            .body(&b""[..])
            .unwrap();
        let meta = response_metadata(&response);
        assert_eq!(meta.get_uint_unchecked(), 404);
        assert_eq!(
            meta.const_attribute(&Value::string("content-type")).as_str(),
            Some("text/plain")
        );
    }
}
