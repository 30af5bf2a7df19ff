//! Final response selection.
//!
//! # Responsibilities
//! - Reject asset-like paths before any layer is read
//! - Turn a finished composition into exactly one response shape
//!
//! # Design Decisions
//! - A response finalized by a script wins over everything else
//! - Nothing dispatched in any layer is a 404, even though the page would
//!   serialize to `{}`
//! - Empty accumulated HTML means the page is the response, as JSON

use std::sync::LazyLock;

use regex::Regex;

use crate::cascade::compositor::Composition;
use crate::cascade::context::ResponseDraft;

/// Body sent for asset-like paths.
pub const FILE_NOT_FOUND: &str = "404 - File Not Found";

/// Body sent when no layer resolves the path.
pub const PAGE_NOT_FOUND: &str = "404 - Page Not Found";

static ASSET_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9_]+$").expect("asset path pattern is valid"));

/// True for paths that end like a file name (`/report.pdf`).
pub fn is_asset_path(path: &str) -> bool {
    ASSET_PATH.is_match(path)
}

/// The one response a request produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A code artifact already wrote the response.
    Finalized(ResponseDraft),
    /// Nothing to serve; carries the body text.
    NotFound(&'static str),
    /// The page, pretty-printed.
    Json { body: String, draft: ResponseDraft },
    /// The accumulated HTML.
    Html { body: String, draft: ResponseDraft },
}

/// Choose the response for a finished composition.
pub fn resolve(composition: Composition) -> Resolution {
    let Composition {
        page,
        html,
        response,
        trail,
        ..
    } = composition;

    if response.finalized {
        return Resolution::Finalized(response);
    }
    if trail.is_empty() {
        return Resolution::NotFound(PAGE_NOT_FOUND);
    }
    if html.is_empty() {
        let body = serde_json::to_string_pretty(&page).unwrap_or_else(|_| "{}".to_string());
        return Resolution::Json {
            body,
            draft: response,
        };
    }
    Resolution::Html {
        body: html,
        draft: response,
    }
}
