//! tinyweb - a small request-dispatch engine.
//!
//! Routes requests to handlers by verb and regular-expression path
//! pattern, decodes request bodies into a uniform form, and turns raised
//! HTTP statuses into responses.
//!
//! ```
//! use tinyweb::{Application, Envelope, Settings};
//!
//! let mut app = Application::new(Settings::builtin());
//! app.get(r"/books/(\d+)", |_req, args| Ok(format!("book {}", args.positional[0])))
//!     .unwrap();
//!
//! let response = app.dispatch(Envelope::new("GET", "/books/7")).unwrap();
//! assert_eq!(response.status_line(), "200 OK");
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod routing;
pub mod server;

pub use app::Application;
pub use config::Settings;
pub use error::{DecodingError, Error, RoutingError};
pub use http::form::{FilePart, Form, FormValue};
pub use http::request::{Envelope, Method, Request};
pub use http::response::{Body, Reply, Response};
pub use http::status::Status;
pub use routing::{Args, Route};
