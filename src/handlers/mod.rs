//! Artifact handlers.
//!
//! # Data Flow
//! ```text
//! Artifact (kind, file)
//!     → code.rs      (rhai entry point; mutates page, may write response, may stop)
//!     → markdown.rs  (front matter → page.data, body → page.html)
//!     → template.rs  (page/req/session → HTML fragment)
//!     → markup.rs    (file → HTML fragment)
//!     → Contribution, merged by the compositor
//! ```
//!
//! # Design Decisions
//! - One entry point, `dispatch`, keyed on the artifact kind
//! - Handlers never touch the accumulated HTML; they return fragments
//! - Every artifact is read from disk at dispatch time

pub mod code;
pub mod markdown;
pub mod markup;
pub mod template;

use crate::cascade::context::{RequestContext, ResponseDraft, SessionState};
use crate::cascade::page::PageState;
use crate::config::ScriptConfig;
use crate::error::CascadeError;
use crate::observability::metrics;
use crate::routing::{Artifact, ArtifactKind, Layer};

/// What a handler produced for the compositor to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contribution {
    /// The page was updated in place.
    PageUpdated,
    /// Markup to append to the accumulated HTML.
    Html(String),
    /// A code entry point ran and returned this stop signal.
    Code { stop: bool },
    /// A code artifact had no entry point for this request.
    NotHandled,
}

/// Read-only inputs shared by all handlers for one layer.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Layer the artifact was found in.
    pub layer: &'a Layer,
    /// Incoming request.
    pub request: &'a RequestContext,
    /// Session supplied by outer middleware.
    pub session: &'a SessionState,
    /// Interpreter limits for code artifacts.
    pub scripts: &'a ScriptConfig,
}

/// Run the handler for `artifact`'s kind.
pub async fn dispatch(
    artifact: &Artifact,
    cx: &HandlerContext<'_>,
    page: &mut PageState,
    response: &mut ResponseDraft,
) -> Result<Contribution, CascadeError> {
    metrics::record_dispatch(artifact.kind.as_str());

    match artifact.kind {
        ArtifactKind::Code => Ok(code::run(artifact, cx, page, response).await?),
        ArtifactKind::Markdown => markdown::apply(artifact, page).await,
        ArtifactKind::Template => template::render(artifact, cx, page)
            .await
            .map(Contribution::Html),
        ArtifactKind::Markup => markup::read(artifact).await.map(Contribution::Html),
    }
}
