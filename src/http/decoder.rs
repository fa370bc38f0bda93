//! Request body decoding.
//!
//! Every supported wire encoding ends up as the same [`Form`]. Decoding
//! failures are reported as [`DecodingError`] and never as I/O or parser
//! errors, so a malformed body can only ever turn into a 400.

use std::io::{BufReader, Read};

use crate::error::DecodingError;
use crate::http::form::{Form, FormValue};
use crate::http::multipart;

pub const URLENCODED: &str = "application/x-www-form-urlencoded";
pub const JSON: &str = "application/json";
pub const MULTIPART_PREFIX: &str = "multipart/form";

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// Lower-cased `type/subtype`, parameters stripped.
    pub essence: String,
    pub params: Vec<(String, String)>,
}

impl MediaType {
    pub fn parse(value: &str) -> Self {
        let mut params = multipart::split_params(value).into_iter();
        let essence = params
            .next()
            .map(|(essence, _)| essence.to_ascii_lowercase())
            .unwrap_or_default();

        Self {
            essence,
            params: params.collect(),
        }
    }

    /// Parameter value by case-insensitive name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Decodes a request body according to its content type.
///
/// - no content type: the query mapping, unchanged;
/// - url-encoded: pairs from at most `content_length` bytes of the body,
///   repeated names collected in order; no length means no body;
/// - JSON: a top-level object of exactly `content_length` bytes;
/// - multipart: streamed parts split on the declared boundary;
/// - anything else: an empty form, leaving the raw body to the handler.
pub fn decode(
    content_type: Option<&str>,
    content_length: Option<u64>,
    body: &mut dyn Read,
    query: &Form,
) -> Result<Form, DecodingError> {
    let Some(content_type) = content_type else {
        return Ok(query.clone());
    };

    let media = MediaType::parse(content_type);

    if media.essence == URLENCODED {
        decode_urlencoded(content_length, body)
    } else if media.essence == JSON {
        decode_json(content_length, body)
    } else if media.essence.starts_with(MULTIPART_PREFIX) {
        decode_multipart(&media, content_length, body)
    } else {
        tracing::debug!(content_type = %media.essence, "no form decoder for content type");
        Ok(Form::new())
    }
}

fn decode_urlencoded(
    content_length: Option<u64>,
    body: &mut dyn Read,
) -> Result<Form, DecodingError> {
    // Without a length there is no safe place to stop; read nothing.
    let len = content_length.unwrap_or(0);

    let mut raw = Vec::new();
    body.take(len)
        .read_to_end(&mut raw)
        .map_err(|_| DecodingError::MalformedBody)?;

    Ok(Form::from_pairs(url::form_urlencoded::parse(&raw)))
}

fn decode_json(content_length: Option<u64>, body: &mut dyn Read) -> Result<Form, DecodingError> {
    let len = match content_length {
        Some(len) if len > 0 => len,
        _ => return Err(DecodingError::MissingContentLength),
    };

    let mut raw = Vec::new();
    let read = body
        .take(len)
        .read_to_end(&mut raw)
        .map_err(|_| DecodingError::MalformedBody)?;
    if read as u64 != len {
        return Err(DecodingError::MalformedBody);
    }

    let value: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|_| DecodingError::MalformedBody)?;
    let serde_json::Value::Object(members) = value else {
        return Err(DecodingError::MalformedBody);
    };

    let mut form = Form::new();
    for (name, value) in members {
        form.insert(name, json_field(value));
    }
    Ok(form)
}

fn json_field(value: serde_json::Value) -> FormValue {
    use serde_json::Value;

    match value {
        Value::String(s) => FormValue::Text(s),
        Value::Array(items) if items.iter().all(Value::is_string) => FormValue::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        other => FormValue::Json(other),
    }
}

fn decode_multipart(
    media: &MediaType,
    content_length: Option<u64>,
    body: &mut dyn Read,
) -> Result<Form, DecodingError> {
    let boundary = media
        .param("boundary")
        .filter(|b| !b.is_empty())
        .ok_or(DecodingError::MalformedBody)?;

    match content_length {
        Some(len) => multipart::parse(BufReader::new(body.take(len)), boundary),
        None => multipart::parse(BufReader::new(body), boundary),
    }
}
