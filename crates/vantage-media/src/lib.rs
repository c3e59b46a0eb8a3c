//! Adaptive Media Loading
//!
//! Decide *at what fidelity* and *when* off-screen media is fetched,
//! decoded, and promoted into the rendered view.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Media Element                              │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ConnectionInfo ──> select_tier ──> tier_url                    │
//! │                                        │                        │
//! │  VisibilityObserver ──InView──> ResourceLoader ──LoadState──┐   │
//! │   (vantage-visibility)            │ generation guard        │   │
//! │                                   ↓                         ↓   │
//! │                             MediaFetcher            VisualState │
//! │                             (decode seam)      skeleton/blur/   │
//! │                                                 media layers    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A load begins only after the visibility signal; at most one decode
//! is in flight per element, and stale completions are rejected by a
//! generation counter captured at request time. Failures settle into
//! a terminal `Failed` phase that displays the configured fallback;
//! there is no retry and no timeout.

mod descriptor;
mod element;
mod error;
mod loader;
mod quality;

pub use descriptor::{ImageAspect, ResourceDescriptor};
pub use element::{
    AnimationPolicy, MediaContext, MediaElement, MotionPreference, VisualState,
    DEFAULT_TRANSITION_MS,
};
pub use error::{MediaError, Result};
pub use loader::{LoadPhase, LoadState, LoaderStats, MediaFetcher, ResourceLoader, StaticFetcher};
pub use quality::{
    select_tier, tier_url, ConnectionInfo, ConnectionSignal, QualityTier, StaticConnection,
};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        LoadPhase, MediaContext, MediaElement, QualityTier, ResourceDescriptor, ResourceLoader,
        Result, VisualState,
    };
}
