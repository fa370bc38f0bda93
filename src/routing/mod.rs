//! Request routing.
//!
//! Routes are kept per verb in registration order. Resolution scans the
//! verb's list linearly and the first anchored pattern that matches the
//! whole path wins.
//!
//! ```text
//!   verb ──► [route 0, route 1, ...] ──► first match ──► handler + args
//!     │                                      │
//!     └─ no routes for verb: 405             └─ none match: 404
//! ```

pub mod route;
pub mod router;

pub use route::{Args, Handler, Route};
pub use router::{Resolved, Router};
