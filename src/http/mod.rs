//! HTTP request and response model.
//!
//! # Architecture
//!
//! - **`request`**: methods, the gateway envelope and the per-request view handlers get
//! - **`headers`**: ordered, case-insensitive header list
//! - **`form`** / **`decoder`** / **`multipart`**: body decoding into a uniform form
//! - **`status`**: HTTP statuses raised as control flow
//! - **`response`**: handler replies and the final response
//! - **`cookie`**: request cookies and the outbound jar
//! - **`content`**: content-type adapters for handlers
//! - **`parser`**, **`writer`**, **`connection`**: HTTP/1.1 wire handling for the bundled gateway
//!
//! # Connection State Machine
//!
//! Each client connection of the bundled gateway goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Application::dispatch
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod content;
pub mod cookie;
pub mod decoder;
pub mod form;
pub mod headers;
pub mod multipart;
pub mod parser;
pub mod request;
pub mod response;
pub mod status;
pub mod writer;
