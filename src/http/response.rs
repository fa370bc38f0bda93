use std::borrow::Cow;
use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::Error;
use crate::http::headers::Headers;
use crate::http::status::reason_phrase;

/// Lazily produced body chunks.
///
/// The stream is consumed once, in order. An `Err` item ends it.
pub type ChunkStream = Box<dyn Iterator<Item = Result<Bytes, Error>> + Send>;

/// What a handler hands back to the dispatch loop.
pub enum Reply {
    /// No body.
    Empty,
    /// A materialized body.
    Full(Bytes),
    /// A body produced chunk by chunk.
    Stream(ChunkStream),
}

impl Reply {
    /// Wraps any iterator of chunks as a streamed reply.
    pub fn stream<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Result<C, Error>>,
        I::IntoIter: Send + 'static,
        C: Into<Bytes> + 'static,
    {
        Reply::Stream(Box::new(chunks.into_iter().map(into_chunk::<C>)))
    }
}

fn into_chunk<C: Into<Bytes>>(chunk: Result<C, Error>) -> Result<Bytes, Error> {
    chunk.map(Into::into)
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

impl From<&'static str> for Reply {
    fn from(body: &'static str) -> Self {
        Reply::Full(Bytes::from_static(body.as_bytes()))
    }
}

impl From<String> for Reply {
    fn from(body: String) -> Self {
        Reply::Full(Bytes::from(body))
    }
}

impl From<Vec<u8>> for Reply {
    fn from(body: Vec<u8>) -> Self {
        Reply::Full(Bytes::from(body))
    }
}

impl From<Bytes> for Reply {
    fn from(body: Bytes) -> Self {
        Reply::Full(body)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Empty => f.write_str("Empty"),
            Reply::Full(body) => f.debug_tuple("Full").field(body).finish(),
            Reply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Response body handed to the gateway.
pub enum Body {
    Full(Bytes),
    /// `first` was pulled eagerly before the headers were finalized.
    Stream {
        first: Option<Bytes>,
        rest: ChunkStream,
    },
}

impl Body {
    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Stream { .. })
    }

    /// Drains the body into one buffer.
    ///
    /// Fails with the first error the stream yields.
    pub fn collect(self) -> Result<Bytes, Error> {
        match self {
            Body::Full(body) => Ok(body),
            Body::Stream { first, rest } => {
                let mut buf = BytesMut::new();
                if let Some(chunk) = first {
                    buf.extend_from_slice(&chunk);
                }
                for chunk in rest {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Full(body) => f.debug_tuple("Full").field(body).finish(),
            Body::Stream { first, .. } => f
                .debug_struct("Stream")
                .field("first", first)
                .finish_non_exhaustive(),
        }
    }
}

/// Header values a handler sets on its request before returning.
///
/// The dispatch loop copies them into the final response when the handler
/// succeeds; a raised status discards them.
#[derive(Debug, Default)]
pub struct ResponseHead {
    pub code: Option<u16>,
    pub headers: Headers,
    pub content_type: Option<String>,
    pub charset: Option<String>,
}

impl ResponseHead {
    /// Full `Content-Type` value, charset included when one is set.
    pub fn content_type_header(&self) -> Option<String> {
        let media = self.content_type.as_ref()?;
        match &self.charset {
            Some(charset) => Some(format!("{media}; charset={charset}")),
            None => Some(media.clone()),
        }
    }
}

/// A complete HTTP response ready for the gateway.
#[derive(Debug)]
pub struct Response {
    pub code: u16,
    pub reason: Cow<'static, str>,
    /// Ordered; duplicate names (e.g. `Set-Cookie`) are kept.
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    /// `"{code} {reason}"`.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.code, self.reason)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(200, "OK")
            .body(Body::Full(body.into()))
            .build()
    }

    /// Bare 500 used by the gateway when dispatch itself fails.
    pub fn internal_error() -> Self {
        ResponseBuilder::new(500, reason_phrase(500))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(Body::Full(Bytes::from_static(b"500 Internal Server Error")))
            .build()
    }
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use tinyweb::http::response::{Body, ResponseBuilder};
/// let response = ResponseBuilder::new(200, "OK")
///     .header("Content-Type", "application/json")
///     .body(Body::Full("{}".into()))
///     .build();
/// assert_eq!(response.header("content-length"), Some("2"));
/// ```
pub struct ResponseBuilder {
    code: u16,
    reason: Cow<'static, str>,
    headers: Headers,
    body: Body,
}

impl ResponseBuilder {
    pub fn new(code: u16, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            reason: reason.into(),
            headers: Headers::new(),
            body: Body::Full(Bytes::new()),
        }
    }

    /// Appends a header; earlier headers with the same name are kept.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        for (key, value) in headers {
            self.headers.append(key, value);
        }
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Full bodies get a `Content-Length` header unless one is present.
    /// Streamed bodies never do; their length is unknown up front.
    pub fn build(mut self) -> Response {
        if let Body::Full(body) = &self.body {
            if !self.headers.contains("Content-Length") {
                self.headers.append("Content-Length", body.len().to_string());
            }
        }

        Response {
            code: self.code,
            reason: self.reason,
            headers: self.headers,
            body: self.body,
        }
    }
}
