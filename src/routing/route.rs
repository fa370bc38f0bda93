use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::error::Error;
use crate::http::form::FormValue;
use crate::http::request::{Method, Request};
use crate::http::response::Reply;

/// Something that answers a request.
///
/// Implemented for every closure of the shape
/// `Fn(&mut Request, &Args) -> Result<impl Into<Reply>, Error>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &mut Request, args: &Args) -> Result<Reply, Error>;
}

impl<F, R> Handler for F
where
    F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
    R: Into<Reply>,
{
    fn call(&self, req: &mut Request, args: &Args) -> Result<Reply, Error> {
        self(req, args).map(Into::into)
    }
}

/// Arguments extracted for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    /// Capture groups that took part in the match, in pattern order.
    pub positional: Vec<String>,
    /// Declared query parameters present in the query string.
    pub keyword: HashMap<String, FormValue>,
}

impl Args {
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    pub fn keyword(&self, name: &str) -> Option<&FormValue> {
        self.keyword.get(name)
    }

    /// Keyword value as text, or `default` when the query omitted it.
    pub fn keyword_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.keyword(name)
            .and_then(FormValue::as_str)
            .unwrap_or(default)
    }
}

/// A verb and an anchored path pattern.
///
/// Query-bindable parameters are declared here, at registration, and are
/// the only query keys ever passed to the handler.
#[derive(Debug, Clone)]
pub struct Route {
    verb: Method,
    source: String,
    pattern: Regex,
    query_params: HashSet<String>,
}

impl Route {
    /// Compiles `pattern` anchored to the whole path.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::routing::Route;
    /// let route = Route::new("get", r"/(\d+)").unwrap();
    /// assert!(route.captures("/12").is_some());
    /// assert!(route.captures("/12/x").is_none());
    /// ```
    pub fn new(verb: impl Into<Method>, pattern: &str) -> Result<Self, regex::Error> {
        let pattern_regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            verb: verb.into(),
            source: pattern.to_string(),
            pattern: pattern_regex,
            query_params: HashSet::new(),
        })
    }

    /// Declares a query-bindable parameter.
    pub fn query(mut self, name: impl Into<String>) -> Self {
        self.query_params.insert(name.into());
        self
    }

    pub fn verb(&self) -> &Method {
        &self.verb
    }

    /// The pattern as registered, unanchored.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn query_params(&self) -> &HashSet<String> {
        &self.query_params
    }

    /// Capture groups of a full-path match.
    ///
    /// Groups that did not participate are left out rather than passed
    /// as empty values.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.pattern.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect(),
        )
    }
}
