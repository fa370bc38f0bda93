use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read};

use bytes::Bytes;

use crate::error::DecodingError;
use crate::http::cookie::{parse_cookie_header, CookieJar};
use crate::http::decoder::{self, MediaType};
use crate::http::form::Form;
use crate::http::headers::Headers;
use crate::http::response::ResponseHead;
use crate::http::status::Status;

/// HTTP request methods.
///
/// Verbs are case-insensitive tokens. Anything that is not one of the
/// common methods is kept as an upper-cased extension, so an unknown verb
/// still reaches the router and is answered with 405.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// Any other token, upper-cased.
    Extension(String),
}

impl Method {
    /// Parses an HTTP method, ignoring case.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::request::Method;
    /// assert_eq!(Method::parse("get"), Method::GET);
    /// assert_eq!(Method::parse("Purge"), Method::Extension("PURGE".into()));
    /// ```
    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            _ => Method::Extension(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Extension(token) => token,
        }
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        Method::parse(s)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request metadata and body as delivered by the gateway.
pub struct Envelope {
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query_string: String,
    pub headers: Headers,
    pub body: Box<dyn Read + Send>,
}

impl Envelope {
    /// Starts an envelope with no query, no headers and an empty body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query_string: String::new(),
            headers: Headers::new(),
            body: Box::new(io::empty()),
        }
    }

    /// Splits `target` (`/path?query`) into path and query string.
    pub fn from_target(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self::new(method, path).query(query)
    }

    pub fn query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// In-memory body. Sets no headers; add `Content-Length` yourself.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Box::new(Cursor::new(body.into()));
        self
    }

    /// Streamed body, e.g. straight from a socket.
    pub fn reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = Box::new(reader);
        self
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_string", &self.query_string)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A request as seen by handlers.
///
/// Lives for one dispatch. The body is read at most once: either through
/// [`Request::form`], which caches the decoded fields, or raw through
/// [`Request::read_body`].
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Form,
    pub headers: Headers,
    /// Cookies sent by the client.
    pub cookies: HashMap<String, String>,
    /// Cookies to send back; merged into the response headers at dispatch.
    pub response_cookies: CookieJar,
    /// Status override, headers and content type for a successful reply.
    pub response: ResponseHead,
    body: Box<dyn Read + Send>,
    form: Option<Result<Form, DecodingError>>,
}

impl Request {
    pub fn new(envelope: Envelope) -> Self {
        let query = Form::from_pairs(url::form_urlencoded::parse(
            envelope.query_string.as_bytes(),
        ));
        let cookies = envelope
            .headers
            .get_all("Cookie")
            .flat_map(parse_cookie_header)
            .collect();

        Self {
            method: Method::parse(&envelope.method),
            path: envelope.path,
            query,
            headers: envelope.headers,
            cookies,
            response_cookies: CookieJar::new(),
            response: ResponseHead::default(),
            body: envelope.body,
            form: None,
        }
    }

    /// Retrieves a header value by case-insensitive name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Media type of the body, lower-cased and without parameters.
    pub fn content_type(&self) -> Option<String> {
        self.header("Content-Type")
            .map(|v| MediaType::parse(v).essence)
    }

    /// The `Content-Length` header, when present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// Decoded body fields; see [`decoder::decode`].
    ///
    /// Decoding runs on first call only. Later calls return the cached
    /// form, or the same 400 again if decoding failed.
    pub fn form(&mut self) -> Result<&Form, Status> {
        let content_type = self.header("Content-Type").map(str::to_owned);
        let content_length = self.content_length();
        let body = &mut self.body;
        let query = &self.query;

        let decoded = self.form.get_or_insert_with(|| {
            decoder::decode(
                content_type.as_deref(),
                content_length,
                &mut **body,
                query,
            )
        });

        decoded.as_ref().map_err(|err| Status::from(*err))
    }

    /// Reads the raw body, bounded by `Content-Length` when given.
    ///
    /// Returns whatever is left if the form was decoded first.
    pub fn read_body(&mut self) -> io::Result<Bytes> {
        let mut raw = Vec::new();
        match self.content_length() {
            Some(len) => {
                (&mut self.body).take(len).read_to_end(&mut raw)?;
            }
            None => {
                self.body.read_to_end(&mut raw)?;
            }
        }
        Ok(Bytes::from(raw))
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
