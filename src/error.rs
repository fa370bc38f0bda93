//! Error taxonomy.
//!
//! Routing and decoding failures are typed and always become a [`Status`].
//! Anything else a handler fails with is a fault: it is carried as an
//! [`anyhow::Error`] and handed back to the caller of
//! [`Application::dispatch`](crate::app::Application::dispatch) untouched.

use thiserror::Error;

use crate::http::status::Status;

/// Resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No route is registered for the verb at all.
    #[error("method not allowed")]
    MethodNotAllowed,
    /// The verb has routes, but no pattern matches the path.
    #[error("not found")]
    NotFound,
}

/// Request body decoding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodingError {
    #[error("Content-Length required")]
    MissingContentLength,
    #[error("Cannot parse the request")]
    MalformedBody,
}

impl From<RoutingError> for Status {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::MethodNotAllowed => Status::method_not_allowed(),
            RoutingError::NotFound => Status::not_found(),
        }
    }
}

impl From<DecodingError> for Status {
    fn from(err: DecodingError) -> Self {
        match err {
            DecodingError::MissingContentLength => Status::new(400, "Content-Length required"),
            DecodingError::MalformedBody => Status::new(400, "Cannot parse the request"),
        }
    }
}

/// What a handler fails with.
#[derive(Debug, Error)]
pub enum Error {
    /// Deliberate short-circuit; rendered as a response at dispatch.
    #[error("{0}")]
    Status(Status),
    /// Anything else; never rendered, always propagated.
    #[error(transparent)]
    Fault(anyhow::Error),
}

impl Error {
    pub fn fault<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Fault(anyhow::Error::new(err))
    }

    pub fn as_status(&self) -> Option<&Status> {
        match self {
            Error::Status(status) => Some(status),
            Error::Fault(_) => None,
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Status(status)
    }
}

impl From<RoutingError> for Error {
    fn from(err: RoutingError) -> Self {
        Error::Status(err.into())
    }
}

impl From<DecodingError> for Error {
    fn from(err: DecodingError) -> Self {
        Error::Status(err.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Fault(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::fault(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::fault(err)
    }
}
