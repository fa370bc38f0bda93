use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::cell::Cell;
use std::fmt;

use bytes::Bytes;

use crate::http::response::{Body, Response, ResponseBuilder};

/// Standard reason phrase for a status code.
///
/// # Example
///
/// ```
/// # use tinyweb::http::status::reason_phrase;
/// assert_eq!(reason_phrase(200), "OK");
/// assert_eq!(reason_phrase(404), "Not Found");
/// ```
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown Status",
    }
}

thread_local! {
    static CAPTURE_TRACES: Cell<bool> = const { Cell::new(false) };
}

/// Makes statuses created on this thread record a stack trace until the
/// scope is dropped.
///
/// Dispatch enters one per request with the application's `debug` setting.
pub(crate) struct TraceScope {
    previous: bool,
}

impl TraceScope {
    pub(crate) fn enter(enabled: bool) -> Self {
        Self {
            previous: CAPTURE_TRACES.replace(enabled),
        }
    }
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        CAPTURE_TRACES.set(self.previous);
    }
}

/// A deliberate HTTP status raised from anywhere inside a request.
///
/// Routing and body decoding produce these, and handlers return them to
/// short-circuit. The dispatch loop turns a `Status` into a response exactly
/// once; nothing else in the crate inspects it.
pub struct Status {
    code: u16,
    reason: Cow<'static, str>,
    location: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    trace: Backtrace,
}

impl Status {
    /// Creates a status with a custom reason phrase.
    ///
    /// Codes outside `100..=599` become `500 Internal Server Error`, and an
    /// empty reason is replaced by the standard phrase, so every status can
    /// always be rendered as a valid status line.
    pub fn new(code: u16, reason: impl Into<Cow<'static, str>>) -> Self {
        let (code, reason) = if (100..=599).contains(&code) {
            let reason = reason.into();
            if reason.trim().is_empty() {
                (code, Cow::Borrowed(reason_phrase(code)))
            } else {
                (code, reason)
            }
        } else {
            (500, Cow::Borrowed(reason_phrase(500)))
        };

        Self {
            code,
            reason,
            location: None,
            headers: Vec::new(),
            body: None,
            trace: if CAPTURE_TRACES.get() {
                Backtrace::force_capture()
            } else {
                Backtrace::disabled()
            },
        }
    }

    /// Creates a status with the standard reason phrase.
    pub fn from_code(code: u16) -> Self {
        Self::new(code, reason_phrase(code))
    }

    fn redirect(code: u16, location: impl Into<String>) -> Self {
        let mut status = Self::from_code(code);
        status.location = Some(location.into());
        status
    }

    pub fn bad_request() -> Self {
        Self::from_code(400)
    }

    pub fn unauthorized() -> Self {
        Self::from_code(401)
    }

    pub fn forbidden() -> Self {
        Self::from_code(403)
    }

    pub fn not_found() -> Self {
        Self::from_code(404)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_code(405)
    }

    pub fn conflict() -> Self {
        Self::from_code(409)
    }

    pub fn gone() -> Self {
        Self::from_code(410)
    }

    pub fn precondition_failed() -> Self {
        Self::from_code(412)
    }

    pub fn internal_server_error() -> Self {
        Self::from_code(500)
    }

    pub fn bad_gateway() -> Self {
        Self::from_code(502)
    }

    pub fn service_unavailable() -> Self {
        Self::from_code(503)
    }

    pub fn moved_permanently(location: impl Into<String>) -> Self {
        Self::redirect(301, location)
    }

    pub fn found(location: impl Into<String>) -> Self {
        Self::redirect(302, location)
    }

    pub fn see_other(location: impl Into<String>) -> Self {
        Self::redirect(303, location)
    }

    pub fn not_modified() -> Self {
        Self::from_code(304)
    }

    pub fn temporary_redirect(location: impl Into<String>) -> Self {
        Self::redirect(307, location)
    }

    pub fn permanent_redirect(location: impl Into<String>) -> Self {
        Self::redirect(308, location)
    }

    /// Replaces the default body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a header to the eventual response.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// `"{code} {reason}"`, e.g. `"404 Not Found"`.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.code, self.reason)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.code)
    }

    pub fn is_error(&self) -> bool {
        self.code >= 400
    }

    /// Renders the status as a complete response.
    ///
    /// With `debug` set, error bodies carry the stack trace captured when
    /// the status was created, or one taken here if none was recorded.
    /// Headers added with [`Status::with_header`] take precedence over the
    /// default `Content-Type` and `Location`.
    pub fn into_response(self, debug: bool) -> Response {
        let mut builder = ResponseBuilder::new(self.code, self.reason.clone());

        let supplied = |name: &str| {
            self.headers
                .iter()
                .any(|(key, _)| key.eq_ignore_ascii_case(name))
        };
        let has_content_type = supplied("Content-Type");
        let has_location = supplied("Location");

        for (key, value) in &self.headers {
            builder = builder.header(key.clone(), value.clone());
        }

        if self.is_redirect() && !has_location {
            if let Some(location) = &self.location {
                builder = builder.header("Location", location.clone());
            }
        }

        let is_error = self.is_error();
        let line = self.status_line();

        let body = match self.body {
            Some(body) => body,
            None if is_error => {
                if !has_content_type {
                    builder = builder.header("Content-Type", "text/plain; charset=utf-8");
                }
                if debug {
                    let trace = match self.trace.status() {
                        BacktraceStatus::Captured => self.trace,
                        _ => Backtrace::force_capture(),
                    };
                    Bytes::from(format!("{line}\r\n{trace}"))
                } else {
                    Bytes::from(line)
                }
            }
            None => Bytes::new(),
        };

        builder.body(Body::Full(body)).build()
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Status")
            .field("code", &self.code)
            .field("reason", &self.reason)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

impl std::error::Error for Status {}
