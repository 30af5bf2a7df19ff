//! Content layer enumeration.
//!
//! # Responsibilities
//! - List numbered layer directories under the content root
//! - Order them by the integer value of their name
//!
//! # Design Decisions
//! - Read on every request; nothing is cached
//! - Names that do not parse as integers never participate
//! - Ties (`1` and `01`) fall back to the directory name for a stable order

use std::path::{Path, PathBuf};

/// A numbered content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Ordering key parsed from the directory name.
    pub order: i64,
    /// Directory base name as found on disk.
    pub name: String,
    /// Full path to the layer directory.
    pub path: PathBuf,
}

/// Parse a directory name into a layer ordering key.
pub fn layer_order(name: &str) -> Option<i64> {
    name.parse().ok()
}

/// List the layers under `root` in ascending order.
///
/// Fails if `root` does not exist or cannot be read.
pub async fn enumerate_layers(root: &Path) -> Result<Vec<Layer>, std::io::Error> {
    let mut entries = tokio::fs::read_dir(root).await?;
    let mut layers = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(order) = layer_order(&name) else {
            tracing::trace!(entry = %name, "Skipping non-numeric content entry");
            continue;
        };

        // Follow symlinks so a linked layer still counts as a directory.
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => layers.push(Layer { order, name, path }),
            Ok(_) => {}
            Err(e) => tracing::debug!(entry = %name, error = %e, "Unreadable content entry"),
        }
    }

    layers.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    Ok(layers)
}
