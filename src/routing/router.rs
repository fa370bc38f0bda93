use std::collections::HashMap;
use std::fmt;

use crate::error::RoutingError;
use crate::http::form::Form;
use crate::http::request::Method;
use crate::routing::route::{Args, Handler, Route};

struct Entry {
    route: Route,
    handler: Box<dyn Handler>,
}

/// Per-verb route lists.
///
/// Built once before serving and only read afterwards; share it behind an
/// `Arc` and never mutate it while requests are in flight.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Entry>>,
}

/// Outcome of a successful resolution.
pub struct Resolved<'a> {
    pub route: &'a Route,
    pub handler: &'a dyn Handler,
    pub args: Args,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route to its verb's list.
    ///
    /// Duplicate verb/pattern pairs are accepted; the earlier one shadows
    /// the later at resolution.
    pub fn register(&mut self, route: Route, handler: impl Handler) {
        tracing::debug!(verb = %route.verb(), pattern = route.pattern(), "route registered");
        self.routes
            .entry(route.verb().clone())
            .or_default()
            .push(Entry {
                route,
                handler: Box::new(handler),
            });
    }

    /// Finds the handler for `verb` and `path`.
    ///
    /// Keyword arguments are taken from `query`, restricted to the names the
    /// route declared; other query keys are ignored.
    pub fn resolve(
        &self,
        verb: &Method,
        path: &str,
        query: &Form,
    ) -> Result<Resolved<'_>, RoutingError> {
        let entries = self
            .routes
            .get(verb)
            .filter(|entries| !entries.is_empty())
            .ok_or(RoutingError::MethodNotAllowed)?;

        for entry in entries {
            let Some(positional) = entry.route.captures(path) else {
                continue;
            };

            let keyword = query
                .iter()
                .filter(|(name, _)| entry.route.query_params().contains(*name))
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect();

            return Ok(Resolved {
                route: &entry.route,
                handler: entry.handler.as_ref(),
                args: Args {
                    positional,
                    keyword,
                },
            });
        }

        Err(RoutingError::NotFound)
    }

    /// Number of routes across all verbs.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (verb, entries) in &self.routes {
            let patterns: Vec<&str> = entries.iter().map(|e| e.route.pattern()).collect();
            map.entry(&verb.as_str(), &patterns);
        }
        map.finish()
    }
}
