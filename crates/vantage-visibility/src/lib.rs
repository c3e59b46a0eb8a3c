//! Viewport Intersection Primitives
//!
//! Foundational visibility signals for the vantage media pipeline:
//! decide *when* an off-screen element is close enough to the viewport
//! that its resources should start loading.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Viewport Observation                     │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                           │
//! │  ViewportSource ──reports──> Observer ──state──> Consumer │
//! │   (host seam)                  │                          │
//! │                                ↓                          │
//! │        One-shot:  NotObserved → InView → Settled          │
//! │        Continuous: in/out + has_been_in_view latch        │
//! │                                                           │
//! │  Every subscription is owned by an ObservationHandle      │
//! │  released explicitly or on drop.                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! When the intersection capability is missing, observers fail open
//! and treat elements as immediately in view.

mod error;
mod handle;
mod observer;
mod source;
mod state;

pub use error::{Result, VisibilityError};
pub use handle::ObservationHandle;
pub use observer::{ContinuousObservation, ContinuousObserver, Observation, VisibilityObserver};
pub use source::{ElementId, IntersectionReport, ObserverConfig, StaticViewport, ViewportSource};
pub use state::VisibilityState;

/// Default visible fraction required to trigger
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Default proximity margin in pixels
pub const DEFAULT_ROOT_MARGIN_PX: u32 = 50;

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        ElementId, Observation, ObserverConfig, Result, StaticViewport, VisibilityObserver,
        VisibilityState,
    };
}
