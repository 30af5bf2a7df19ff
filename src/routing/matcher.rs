//! Artifact matching within a single layer.
//!
//! # Responsibilities
//! - Map artifact kinds to file extensions and a fixed priority
//! - Produce candidate paths from most specific up to `/index`
//! - Probe a layer directory for the first existing artifact
//!
//! # Design Decisions
//! - Depth beats kind: a deeper match of any kind wins over a shallower one
//! - Within a depth: code, then markdown, then template, then markup
//! - The upward walk is an explicit iterator bounded by path depth
//! - `.`/`..` segments and backslashes never match, so requests stay inside
//!   the layer

use std::fmt;
use std::path::{Path, PathBuf};

/// Candidate used for the root and as the final fallback of every walk.
pub const INDEX: &str = "/index";

/// Kind of content artifact, determined by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Executable script with per-method entry points.
    Code,
    /// Markdown prose with optional front matter.
    Markdown,
    /// Template rendered against the page.
    Template,
    /// Markup copied through untouched.
    Markup,
}

impl ArtifactKind {
    /// All kinds, highest priority first.
    pub const PRIORITY: [ArtifactKind; 4] = [
        ArtifactKind::Code,
        ArtifactKind::Markdown,
        ArtifactKind::Template,
        ArtifactKind::Markup,
    ];

    /// File extensions recognised for this kind, in probe order.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ArtifactKind::Code => &["rhai"],
            ArtifactKind::Markdown => &["md"],
            ArtifactKind::Template => &["jinja"],
            ArtifactKind::Markup => &["html", "htm"],
        }
    }

    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Code => "code",
            ArtifactKind::Markdown => "markdown",
            ArtifactKind::Template => "template",
            ArtifactKind::Markup => "markup",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content file resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Kind derived from the extension.
    pub kind: ArtifactKind,
    /// File on disk.
    pub path: PathBuf,
    /// Candidate request path that matched (e.g. `/blog` for `/blog/post`).
    pub request_path: String,
}

/// Candidate request paths from most specific to `/index`.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    segments: Vec<&'a str>,
    depth: usize,
    finished: bool,
}

impl<'a> Iterator for Candidates<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        if self.depth == 0 {
            self.finished = true;
            return Some(INDEX.to_string());
        }

        let candidate = format!("/{}", self.segments[..self.depth].join("/"));
        self.depth -= 1;
        if candidate == INDEX {
            self.finished = true;
        }
        Some(candidate)
    }
}

/// Walk `request_path` upwards.
///
/// `""` and `"/"` start directly at `/index`; empty segments are ignored, so
/// trailing slashes do not add a level.
pub fn candidates(request_path: &str) -> Candidates<'_> {
    let segments: Vec<&str> = request_path.split('/').filter(|s| !s.is_empty()).collect();
    Candidates {
        depth: segments.len(),
        segments,
        finished: false,
    }
}

/// Returns false for paths that could escape the layer directory.
pub fn is_safe_path(request_path: &str) -> bool {
    !request_path.contains('\\')
        && request_path
            .split('/')
            .all(|segment| segment != "." && segment != "..")
}

fn artifact_file(layer_dir: &Path, candidate: &str, extension: &str) -> PathBuf {
    let relative = candidate.trim_start_matches('/');
    layer_dir.join(format!("{relative}.{extension}"))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Find the most specific artifact for `request_path` inside `layer_dir`.
pub async fn resolve(request_path: &str, layer_dir: &Path) -> Option<Artifact> {
    if !is_safe_path(request_path) {
        tracing::debug!(path = %request_path, "Refusing to resolve unsafe path");
        return None;
    }

    for candidate in candidates(request_path) {
        for kind in ArtifactKind::PRIORITY {
            for extension in kind.extensions() {
                let path = artifact_file(layer_dir, &candidate, extension);
                tracing::trace!(file = %path.display(), "Probing");
                if is_file(&path).await {
                    return Some(Artifact {
                        kind,
                        path,
                        request_path: candidate,
                    });
                }
            }
        }
    }
    None
}
