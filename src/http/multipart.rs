//! Streaming `multipart/form-data` parser.
//!
//! The body is consumed straight from a [`BufRead`] without buffering the
//! whole payload first. Each part is read up to the next delimiter, so memory
//! use is bounded by the largest single part.

use std::io::{self, BufRead};

use bytes::Bytes;

use crate::error::DecodingError;
use crate::http::form::{FilePart, Form, FormValue};

/// Part headers larger than this are rejected.
const MAX_HEADER_LINE: usize = 8 * 1024;

/// Parses every part of the body into `Form` fields.
///
/// Parts without a filename become text fields; parts with one become
/// [`FilePart`]s. Parts without a `name` are skipped.
pub fn parse<R: BufRead>(mut reader: R, boundary: &str) -> Result<Form, DecodingError> {
    if boundary.is_empty() {
        return Err(DecodingError::MalformedBody);
    }

    let dash_boundary = format!("--{boundary}").into_bytes();
    let delimiter = format!("\r\n--{boundary}").into_bytes();
    let mut form = Form::new();

    // The first delimiter may start the body without a leading CRLF.
    let mut preamble = Vec::new();
    if !read_until_delimiter(&mut reader, &dash_boundary, &mut preamble).map_err(malformed)? {
        return Err(DecodingError::MalformedBody);
    }

    loop {
        let mut marker = [0u8; 2];
        reader.read_exact(&mut marker).map_err(malformed)?;

        match &marker {
            b"--" => break,
            b"\r\n" => {}
            _ => {
                // Transport padding after the delimiter, up to the line end.
                let mut padding = Vec::new();
                read_line(&mut reader, &mut padding)?;
                if marker.iter().chain(&padding).any(|b| !b" \t".contains(b)) {
                    return Err(DecodingError::MalformedBody);
                }
            }
        }

        let headers = read_part_headers(&mut reader)?;

        let mut data = Vec::new();
        if !read_until_delimiter(&mut reader, &delimiter, &mut data).map_err(malformed)? {
            return Err(DecodingError::MalformedBody);
        }

        let Some(disposition) = headers.disposition else {
            continue;
        };
        let Some(name) = disposition.name else {
            continue;
        };

        let value = match disposition.filename {
            Some(filename) => FormValue::File(FilePart {
                filename,
                content_type: headers.content_type,
                data: Bytes::from(data),
            }),
            None => FormValue::Text(String::from_utf8_lossy(&data).into_owned()),
        };
        form.append(name, value);
    }

    tracing::trace!(fields = form.len(), "multipart body parsed");
    Ok(form)
}

#[derive(Debug, Default)]
struct PartHeaders {
    disposition: Option<Disposition>,
    content_type: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Disposition {
    name: Option<String>,
    filename: Option<String>,
}

fn read_part_headers<R: BufRead>(reader: &mut R) -> Result<PartHeaders, DecodingError> {
    let mut headers = PartHeaders::default();

    loop {
        let mut line = Vec::new();
        read_line(reader, &mut line)?;
        if line.is_empty() {
            return Ok(headers);
        }

        let line = String::from_utf8_lossy(&line);
        let (key, value) = line.split_once(':').ok_or(DecodingError::MalformedBody)?;
        let key = key.trim();
        let value = value.trim();

        if key.eq_ignore_ascii_case("Content-Disposition") {
            headers.disposition = Some(parse_disposition(value));
        } else if key.eq_ignore_ascii_case("Content-Type") {
            headers.content_type = Some(value.to_string());
        }
    }
}

/// Reads one CRLF-terminated line into `line`, without the terminator.
fn read_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> Result<(), DecodingError> {
    let found = read_until_delimiter(reader, b"\r\n", line).map_err(malformed)?;
    if !found || line.len() > MAX_HEADER_LINE {
        return Err(DecodingError::MalformedBody);
    }
    Ok(())
}

/// Copies bytes into `out` until `delimiter` has been consumed.
///
/// The delimiter itself is not kept. Returns `false` when the input ends
/// first.
fn read_until_delimiter<R: BufRead>(
    reader: &mut R,
    delimiter: &[u8],
    out: &mut Vec<u8>,
) -> io::Result<bool> {
    let last = delimiter[delimiter.len() - 1];

    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(false);
        }

        let mut consumed = 0;
        let mut found = false;
        for &byte in available {
            consumed += 1;
            out.push(byte);
            if byte == last && out.ends_with(delimiter) {
                found = true;
                break;
            }
        }
        reader.consume(consumed);

        if found {
            out.truncate(out.len() - delimiter.len());
            return Ok(true);
        }
    }
}

/// Parses `form-data; name="field"; filename="a.txt"`.
fn parse_disposition(value: &str) -> Disposition {
    let mut disposition = Disposition::default();

    for (key, val) in split_params(value).into_iter().skip(1) {
        match key.to_ascii_lowercase().as_str() {
            "name" => disposition.name = Some(val),
            "filename" => disposition.filename = Some(val),
            _ => {}
        }
    }
    disposition
}

/// Splits a header value on `;` outside quotes into `key=value` pairs.
///
/// The leading token (the media or disposition type) comes back with an
/// empty value. Quoted values are unquoted and `\"` escapes resolved.
pub(crate) fn split_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut segments = Vec::new();

    for ch in value.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ';' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    segments.push(current);

    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, val)) => {
                let val = val.trim();
                let val = val
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(val);
                params.push((key.trim().to_string(), val.to_string()));
            }
            None => params.push((segment.to_string(), String::new())),
        }
    }
    params
}

fn malformed(_: io::Error) -> DecodingError {
    DecodingError::MalformedBody
}
