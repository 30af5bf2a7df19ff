//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, static assets)
//!     → request.rs (request ID, query/header/body → RequestContext)
//!     → cascade (compose + resolve)
//!     → response.rs (Resolution → status, headers, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestError, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
