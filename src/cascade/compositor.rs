//! The layer loop.
//!
//! # States
//! - Running: layers are still being consulted
//! - StoppedByLayer: a code artifact returned `true`
//! - Exhausted: every layer was consulted
//!
//! # State Transitions
//! ```text
//! Running → Running:        layer had no artifact, or contributed and continued
//! Running → StoppedByLayer: code entry point returned true
//! Running → Exhausted:      no layers left
//! ```
//!
//! # Design Decisions
//! - Strictly sequential: later layers read what earlier layers wrote
//! - Nothing survives the request; all state is created per call
//! - A missing content root means zero layers unless the root is required

use std::path::{Path, PathBuf};

use crate::cascade::context::{RequestContext, ResponseDraft, SessionState};
use crate::cascade::page::PageState;
use crate::config::{ContentConfig, ScriptConfig};
use crate::error::CascadeError;
use crate::handlers::{self, Contribution, HandlerContext};
use crate::observability::metrics;
use crate::routing::{self, enumerate_layers, ArtifactKind, Layer};

/// Where the layer loop ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    /// Still consulting layers.
    Running,
    /// A layer asked to stop; carries its ordering key.
    StoppedByLayer { layer: i64 },
    /// Every layer was consulted.
    Exhausted,
}

/// One dispatched artifact, in cascade order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// Ordering key of the contributing layer.
    pub layer: i64,
    /// Kind of artifact dispatched.
    pub kind: ArtifactKind,
    /// File that was dispatched.
    pub path: PathBuf,
}

/// Final state of one cascade run, handed to the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Page after every consulted layer.
    pub page: PageState,
    /// Accumulated HTML from templates and markup.
    pub html: String,
    /// Whatever code artifacts wrote to the response.
    pub response: ResponseDraft,
    /// Terminal state of the loop.
    pub state: CascadeState,
    /// Artifacts dispatched, in order.
    pub trail: Vec<Dispatched>,
}

/// Drives the cascade for one content root.
#[derive(Debug, Clone)]
pub struct Compositor {
    content: ContentConfig,
    scripts: ScriptConfig,
}

impl Compositor {
    /// Create a compositor for the configured content root.
    pub fn new(content: ContentConfig, scripts: ScriptConfig) -> Self {
        Self { content, scripts }
    }

    /// Content root this compositor reads.
    pub fn root(&self) -> &Path {
        &self.content.root
    }

    async fn layers(&self) -> Result<Vec<Layer>, CascadeError> {
        match enumerate_layers(&self.content.root).await {
            Ok(layers) => Ok(layers),
            Err(source) if self.content.require_root => Err(CascadeError::ContentRoot {
                path: self.content.root.clone(),
                source,
            }),
            Err(e) => {
                tracing::warn!(
                    root = %self.content.root.display(),
                    error = %e,
                    "Content root unavailable, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Run every layer for `request`, stopping early on a stop signal.
    pub async fn compose(
        &self,
        request: &RequestContext,
        session: &SessionState,
    ) -> Result<Composition, CascadeError> {
        let layers = self.layers().await?;

        let mut page = PageState::default();
        let mut html = String::new();
        let mut response = ResponseDraft::default();
        let mut trail = Vec::new();
        let mut state = CascadeState::Running;

        for layer in &layers {
            let Some(artifact) = routing::resolve(&request.path, &layer.path).await else {
                tracing::trace!(layer = layer.order, path = %request.path, "No artifact in layer");
                continue;
            };

            tracing::debug!(
                layer = layer.order,
                kind = %artifact.kind,
                file = %artifact.path.display(),
                "Dispatching artifact"
            );

            let cx = HandlerContext {
                layer,
                request,
                session,
                scripts: &self.scripts,
            };
            let contribution = handlers::dispatch(&artifact, &cx, &mut page, &mut response).await?;

            trail.push(Dispatched {
                layer: layer.order,
                kind: artifact.kind,
                path: artifact.path,
            });

            match contribution {
                Contribution::Html(fragment) => html.push_str(&fragment),
                Contribution::Code { stop: true } => {
                    state = CascadeState::StoppedByLayer { layer: layer.order };
                }
                Contribution::Code { stop: false }
                | Contribution::PageUpdated
                | Contribution::NotHandled => {}
            }

            if let CascadeState::StoppedByLayer { layer } = state {
                tracing::debug!(layer, "Cascade stopped by layer");
                metrics::record_stop();
                break;
            }
        }

        if state == CascadeState::Running {
            state = CascadeState::Exhausted;
        }

        Ok(Composition {
            page,
            html,
            response,
            state,
            trail,
        })
    }
}
