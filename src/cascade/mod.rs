//! Content cascade subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext + SessionState
//!     → resolver.rs (asset-like path? → 404 before any layer)
//!     → compositor.rs (for each layer: match → dispatch → merge)
//!         page.rs    (data/html/fields, deep merge)
//!         context.rs (request, session, response draft)
//!     → resolver.rs (finalized | 404 | JSON page | HTML)
//! ```
//!
//! # Design Decisions
//! - All state is request-scoped and passed by parameter
//! - The page is frozen once handed to the resolver (moved by value)

pub mod compositor;
pub mod context;
pub mod page;
pub mod resolver;

pub use compositor::{CascadeState, Composition, Compositor, Dispatched};
pub use context::{RequestContext, ResponseDraft, SessionState, UploadedFile};
pub use page::PageState;
pub use resolver::{is_asset_path, resolve, Resolution};
