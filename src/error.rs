//! Error types for the content cascade.
//!
//! # Design Decisions
//! - Template render failures never appear here; the template handler
//!   recovers them into an inline fragment
//! - A missing content root is only an error when the deployment marks the
//!   root as required
//! - Script failures surface to the HTTP layer as a 500

use std::path::PathBuf;

/// Failure of a code artifact (the `LoadError` family).
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The script did not parse.
    #[error("failed to compile {path}: {message}")]
    Compile { path: PathBuf, message: String },

    /// An entry point raised an error while running.
    #[error("entry point `{entry}` in {path} failed: {message}")]
    Runtime {
        path: PathBuf,
        entry: String,
        message: String,
    },

    /// The script left `this` in a shape that is not a page.
    #[error("{path} left the page in an unusable state: {message}")]
    Page { path: PathBuf, message: String },

    /// The blocking task running the script panicked or was cancelled.
    #[error("script task for {path} aborted: {message}")]
    Aborted { path: PathBuf, message: String },
}

/// Errors that abort a cascade run.
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    /// The content root is missing or unreadable and was marked required.
    #[error("content root {path} is unavailable: {source}")]
    ContentRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A matched artifact could not be read.
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A code artifact failed to load or run.
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl CascadeError {
    /// Create a read error for an artifact path.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
