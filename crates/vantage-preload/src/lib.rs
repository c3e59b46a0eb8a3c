//! Critical Resource Preloading
//!
//! Eagerly request a fixed set of critical resources (fonts,
//! above-the-fold images) independent of viewport position, with the
//! correct load hint for each resource type.
//!
//! ```text
//! urls ──> classify by extension ──> PreloadDirective ──> HeadWriter
//!              font/image/style/script     rel=preload      (seam)
//!              or no hint                  as=.. crossorigin?
//! ```
//!
//! Scheduling is idempotent per URL, and a host that refuses head
//! mutation degrades the whole mechanism to a silent no-op.

mod error;
mod kind;
mod scheduler;

pub use error::{PreloadError, Result};
pub use kind::{classify, PreloadKind};
pub use scheduler::{
    DeniedHeadWriter, HeadWriter, PreloadDirective, PreloadScheduler, PreloadStats,
    RecordingHeadWriter,
};

/// Prelude for common imports
pub mod prelude {
    pub use super::{HeadWriter, PreloadDirective, PreloadKind, PreloadScheduler, Result};
}
