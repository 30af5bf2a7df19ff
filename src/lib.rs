//! Cascading content server library.
//!
//! Requests are answered by walking an ordered stack of content layers; each
//! layer may contribute code, markdown, templates or markup to one page.

pub mod cascade;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use cascade::{Composition, Compositor, Resolution};
pub use config::schema::ServerConfig;
pub use error::{CascadeError, ScriptError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
