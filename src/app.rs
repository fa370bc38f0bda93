//! The application context and its dispatch loop.

use std::fmt;

use bytes::Bytes;

use crate::config::Settings;
use crate::error::Error;
use crate::http::request::{Envelope, Method, Request};
use crate::http::response::{Body, Reply, Response, ResponseBuilder};
use crate::http::status::{reason_phrase, TraceScope};
use crate::routing::{Args, Route, Router};

type AppHook = Box<dyn Fn(&Application) + Send + Sync>;
type ResponseHook = Box<dyn Fn(&Response) + Send + Sync>;

#[derive(Default)]
struct Hooks {
    ready: Vec<AppHook>,
    shutdown: Vec<AppHook>,
    endresponse: Vec<ResponseHook>,
}

/// Settings, routes and hooks of one web application.
///
/// Build it once, register everything, then share it (e.g. in an `Arc`)
/// with whatever gateway drives [`Application::dispatch`]. Registration
/// takes `&mut self`, so the borrow checker keeps the table frozen while
/// requests are being served.
pub struct Application {
    pub settings: Settings,
    router: Router,
    hooks: Hooks,
}

impl Application {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            router: Router::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Registers `handler` for `verb` on `pattern`.
    ///
    /// The pattern is a regular expression matched against the whole path;
    /// its capture groups become positional arguments.
    pub fn route<F, R>(
        &mut self,
        verb: impl Into<Method>,
        pattern: &str,
        handler: F,
    ) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route_with(Route::new(verb, pattern)?, handler);
        Ok(())
    }

    /// Registers a prepared [`Route`], typically one declaring query
    /// parameters.
    pub fn route_with<F, R>(&mut self, route: Route, handler: F)
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.router.register(route, handler);
    }

    pub fn get<F, R>(&mut self, pattern: &str, handler: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(Method::GET, pattern, handler)
    }

    pub fn post<F, R>(&mut self, pattern: &str, handler: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put<F, R>(&mut self, pattern: &str, handler: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn patch<F, R>(&mut self, pattern: &str, handler: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn delete<F, R>(&mut self, pattern: &str, handler: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(Method::DELETE, pattern, handler)
    }

    pub fn head<F, R>(&mut self, pattern: &str, handler: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(Method::HEAD, pattern, handler)
    }

    pub fn options<F, R>(&mut self, pattern: &str, handler: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &Args) -> Result<R, Error> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.route(Method::OPTIONS, pattern, handler)
    }

    pub fn when_ready(&mut self, hook: impl Fn(&Application) + Send + Sync + 'static) {
        self.hooks.ready.push(Box::new(hook));
    }

    pub fn when_shutdown(&mut self, hook: impl Fn(&Application) + Send + Sync + 'static) {
        self.hooks.shutdown.push(Box::new(hook));
    }

    /// Runs after every dispatched response is assembled.
    pub fn when_endresponse(&mut self, hook: impl Fn(&Response) + Send + Sync + 'static) {
        self.hooks.endresponse.push(Box::new(hook));
    }

    /// Fires the `ready` hooks. Call once before serving.
    pub fn ready(&self) {
        for hook in &self.hooks.ready {
            hook(self);
        }
    }

    pub fn shutdown(&self) {
        for hook in &self.hooks.shutdown {
            hook(self);
        }
    }

    /// Handles one request from the gateway.
    ///
    /// Statuses raised by routing, body decoding or the handler are turned
    /// into responses here. Any other failure is returned as-is; it is the
    /// host's business, not an HTTP answer.
    pub fn dispatch(&self, envelope: Envelope) -> anyhow::Result<Response> {
        let _traces = TraceScope::enter(self.settings.debug);
        let mut request = Request::new(envelope);

        tracing::debug!(method = %request.method, path = %request.path, "dispatching");

        let mut response = match self.respond(&mut request) {
            Ok(response) => response,
            Err(Error::Status(status)) => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    status = status.code(),
                    "request short-circuited"
                );
                status.into_response(self.settings.debug)
            }
            Err(Error::Fault(err)) => return Err(err),
        };

        for cookie in request.response_cookies.output() {
            response.headers.append("Set-Cookie", cookie);
        }

        for hook in &self.hooks.endresponse {
            hook(&response);
        }

        Ok(response)
    }

    fn respond(&self, request: &mut Request) -> Result<Response, Error> {
        let resolved = self
            .router
            .resolve(&request.method, &request.path, &request.query)?;

        let body = match resolved.handler.call(request, &resolved.args)? {
            Reply::Empty => Body::Full(Bytes::new()),
            Reply::Full(body) => Body::Full(body),
            Reply::Stream(mut chunks) => {
                // Pull one chunk before the head is final, so a failing
                // generator still gets a proper status.
                let first = chunks.next().transpose()?;
                Body::Stream {
                    first,
                    rest: chunks,
                }
            }
        };

        let head = std::mem::take(&mut request.response);
        let code = head.code.unwrap_or(200);
        let mut builder = ResponseBuilder::new(code, reason_phrase(code));

        if let Some(content_type) = head.content_type_header() {
            builder = builder.header("Content-Type", content_type);
        }

        Ok(builder.headers(head.headers).body(body).build())
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(Settings::builtin())
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("settings", &self.settings)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
