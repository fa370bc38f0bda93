use crate::http::headers::Headers;
use crate::http::request::Envelope;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    InvalidContentLength,
    Incomplete,
}

/// A request read off the wire, body fully buffered.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: String,
    /// Request target as sent, query string included.
    pub target: String,
    pub version: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Whether the connection should stay open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive; HTTP/1.0 only keeps the connection
    /// when asked to.
    pub fn keep_alive(&self) -> bool {
        match self.headers.get("Connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version != "HTTP/1.0",
        }
    }

    pub fn into_envelope(self) -> Envelope {
        let mut envelope = Envelope::from_target(self.method, &self.target).body(self.body);
        envelope.headers = self.headers;
        envelope
    }
}

/// Parses one request from the front of `buf`.
///
/// Returns the request and the number of bytes it used, or
/// [`ParseError::Incomplete`] when more input is needed.
pub fn parse_http_request(buf: &[u8]) -> Result<(RawRequest, usize), ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str = std::str::from_utf8(header_bytes)
        .map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    if !is_token(method) {
        return Err(ParseError::InvalidMethod);
    }
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }

    // Headers
    let mut headers = Headers::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        headers.append(key.trim(), value.trim());
    }

    // Body
    let content_length = headers
        .get("Content-Length")
        .map(|v| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();

    let request = RawRequest {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
        headers,
        body,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
