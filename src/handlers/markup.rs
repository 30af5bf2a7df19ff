//! Raw markup artifacts (`.html`, `.htm`): copied through untouched.

use crate::error::CascadeError;
use crate::routing::Artifact;

/// Read the artifact's bytes as an HTML fragment.
pub async fn read(artifact: &Artifact) -> Result<String, CascadeError> {
    let bytes = tokio::fs::read(&artifact.path)
        .await
        .map_err(|e| CascadeError::read(&artifact.path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
