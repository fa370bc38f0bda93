//! Content-type adapters.
//!
//! Each adapter wraps a handler that returns a plain value, encodes the
//! value and labels the response:
//!
//! ```
//! use tinyweb::http::content;
//! use tinyweb::{Application, Settings};
//!
//! let mut app = Application::new(Settings::builtin());
//! app.get("/", content::json(|_req, _args| Ok(serde_json::json!({"foo": "bar"}))))
//!     .unwrap();
//! ```

use bytes::Bytes;
use serde::Serialize;

use crate::error::Error;
use crate::http::request::Request;
use crate::http::response::Reply;
use crate::routing::Args;

/// Serializes the result as JSON, `application/json; charset=utf-8`.
pub fn json<F, T>(handler: F) -> impl Fn(&mut Request, &Args) -> Result<Reply, Error> + Send + Sync + 'static
where
    F: Fn(&mut Request, &Args) -> Result<T, Error> + Send + Sync + 'static,
    T: Serialize,
{
    move |req: &mut Request, args: &Args| {
        let value = handler(req, args)?;
        let body = serde_json::to_vec(&value)?;
        label(req, "application/json", Some("utf-8"));
        Ok(Reply::Full(Bytes::from(body)))
    }
}

/// Plain text, `text/plain; charset=utf-8`.
pub fn text<F, T>(handler: F) -> impl Fn(&mut Request, &Args) -> Result<Reply, Error> + Send + Sync + 'static
where
    F: Fn(&mut Request, &Args) -> Result<T, Error> + Send + Sync + 'static,
    T: Into<String>,
{
    move |req: &mut Request, args: &Args| {
        let body: String = handler(req, args)?.into();
        label(req, "text/plain", Some("utf-8"));
        Ok(Reply::Full(Bytes::from(body)))
    }
}

/// Raw bytes, `application/octet-stream`.
pub fn binary<F, T>(handler: F) -> impl Fn(&mut Request, &Args) -> Result<Reply, Error> + Send + Sync + 'static
where
    F: Fn(&mut Request, &Args) -> Result<T, Error> + Send + Sync + 'static,
    T: Into<Bytes>,
{
    move |req: &mut Request, args: &Args| {
        let body: Bytes = handler(req, args)?.into();
        label(req, "application/octet-stream", None);
        Ok(Reply::Full(body))
    }
}

fn label(req: &mut Request, media: &str, charset: Option<&str>) {
    req.response.content_type = Some(media.to_string());
    req.response.charset = charset.map(str::to_string);
}
