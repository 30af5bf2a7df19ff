//! Content routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → layers.rs (numbered layer directories, ascending)
//!     → matcher.rs (per layer: candidate paths × artifact kinds)
//!     → Return: Artifact or no match for that layer
//! ```
//!
//! # Design Decisions
//! - No routing table: the content tree is the route table
//! - Re-read per request so edits show up without a restart
//! - Deterministic: same tree and path always resolve to the same artifact

pub mod layers;
pub mod matcher;

pub use layers::{enumerate_layers, Layer};
pub use matcher::{resolve, Artifact, ArtifactKind};
