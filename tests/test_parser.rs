use tinyweb::http::parser::{ParseError, parse_http_request};
use tinyweb::Request;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, "GET");
    assert_eq!(parsed.target, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, "POST");
    assert_eq!(parsed.target, "/api");
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_pipelined_requests() {
    let req = b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
    let (first, consumed) = parse_http_request(req).unwrap();
    let (second, _) = parse_http_request(&req[consumed..]).unwrap();

    assert_eq!(first.target, "/a");
    assert_eq!(second.target, "/b");
}

#[test]
fn test_parse_request_into_envelope_splits_query() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.target, "/search?q=rust");

    let request = Request::new(parsed.into_envelope());
    assert_eq!(request.path, "/search");
    assert_eq!(request.query["q"], "rust");
    assert_eq!(request.header("host"), Some("example.com"));
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_extension_method_is_accepted() {
    let req = b"PURGE /cache HTTP/1.1\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, "PURGE");
}

#[test]
fn test_parse_invalid_http_method() {
    let req = b"GE(T / HTTP/1.1\r\n\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::InvalidMethod)));
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::InvalidHeader)));
}

#[test]
fn test_parse_invalid_content_length() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::InvalidContentLength)));
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, vec![0, 1, 2, 3]);
}

#[test]
fn test_keep_alive() {
    let (http11, _) = parse_http_request(b"GET / HTTP/1.1\r\n\r\n").unwrap();
    let (close, _) = parse_http_request(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").unwrap();
    let (http10, _) = parse_http_request(b"GET / HTTP/1.0\r\n\r\n").unwrap();
    let (http10_ka, _) =
        parse_http_request(b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n").unwrap();

    assert!(http11.keep_alive());
    assert!(!close.keep_alive());
    assert!(!http10.keep_alive());
    assert!(http10_ka.keep_alive());
}
