//! Presentation adapter
//!
//! Composes the visibility observer, quality selector, and resource
//! loader into one renderable unit. The visual states are layered, not
//! exclusive: real media at full opacity once loaded, a skeleton
//! shimmer while not yet loaded, and a blurred placeholder background
//! whenever one was supplied and the media has not loaded.

use crate::{
    select_tier, tier_url, ConnectionInfo, ImageAspect, LoadPhase, LoadState, MediaFetcher,
    QualityTier, ResourceDescriptor, ResourceLoader,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use vantage_visibility::{
    ElementId, Observation, ObserverConfig, VisibilityObserver, VisibilityState, ViewportSource,
};

/// Base opacity transition duration in milliseconds
pub const DEFAULT_TRANSITION_MS: u64 = 300;

/// Animation-duration collaborator
///
/// Maps a base duration and the environment's reduced-motion
/// preference to an effective duration; the opacity transition is
/// parameterized by its result rather than hard-coded.
pub trait AnimationPolicy: Send + Sync {
    /// Effective duration for a base transition duration
    fn effective_duration(&self, base: Duration) -> Duration;
}

/// Reduced-motion-aware default policy
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionPreference {
    /// Whether the environment prefers reduced motion
    pub reduced_motion: bool,
}

impl AnimationPolicy for MotionPreference {
    fn effective_duration(&self, base: Duration) -> Duration {
        if self.reduced_motion {
            Duration::ZERO
        } else {
            base
        }
    }
}

/// Snapshot of the layered visual states of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualState {
    /// Real media rendered at full opacity
    pub show_media: bool,
    /// Skeleton shimmer layer
    pub show_skeleton: bool,
    /// Blurred placeholder background layer
    pub show_placeholder: bool,
    /// Effective display source, empty when nothing should render
    pub display_src: String,
    /// Opacity transition duration in milliseconds
    pub transition_ms: u64,
    /// Layout reservation
    pub aspect: ImageAspect,
}

/// Collaborators an element needs at mount time
#[derive(Clone)]
pub struct MediaContext {
    /// Viewport intersection capability
    pub viewport: Arc<dyn ViewportSource>,
    /// Decode collaborator
    pub fetcher: Arc<dyn MediaFetcher>,
    /// Connection probe, queried once per mount
    pub connection: Arc<dyn ConnectionInfo>,
    /// Animation-duration collaborator
    pub animation: Arc<dyn AnimationPolicy>,
    /// Observer configuration
    pub observer: ObserverConfig,
}

/// A mounted media element
///
/// Owns exactly one descriptor/load-state pair for its lifetime. The
/// fidelity tier is selected once at mount, so the effective URL never
/// changes under an in-flight decode.
pub struct MediaElement {
    id: ElementId,
    descriptor: ResourceDescriptor,
    tier: QualityTier,
    effective_url: String,
    loader: ResourceLoader,
    observation: Observation,
    transition: Duration,
}

impl MediaElement {
    /// Mount an element for a descriptor
    ///
    /// Begins observing immediately; the load begins only once the
    /// element enters the viewport proximity zone.
    pub fn mount(descriptor: ResourceDescriptor, ctx: &MediaContext) -> Self {
        let id = ElementId::next();

        // Tier selection happens once, before anything else sees the
        // resource.
        let tier = select_tier(ctx.connection.effective_type());
        let effective_url = tier_url(&descriptor.url, tier);

        let observer = VisibilityObserver::new(ctx.viewport.clone(), ctx.observer);
        let observation = observer.observe(id);

        let loader = ResourceLoader::new(ctx.fetcher.clone());
        let transition = ctx
            .animation
            .effective_duration(Duration::from_millis(DEFAULT_TRANSITION_MS));

        debug!("mounted {id} for {} at tier {tier:?}", descriptor.url);

        // Gate driver: wait for the visibility signal, then hand the
        // URL to the loader exactly once.
        let mut state_rx = observation.subscribe();
        let gate_loader = loader.clone();
        let gate_url = effective_url.clone();
        let gate_fallback = descriptor.fallback_url.clone();
        tokio::spawn(async move {
            loop {
                let state = *state_rx.borrow();
                if state.is_in_view() {
                    let fallback =
                        (!gate_fallback.is_empty()).then_some(gate_fallback.as_str());
                    gate_loader.begin(true, &gate_url, fallback);
                    break;
                }
                if state_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Self {
            id,
            descriptor,
            tier,
            effective_url,
            loader,
            observation,
            transition,
        }
    }

    /// Element identity
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Descriptor this element renders
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Fidelity tier selected at mount
    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    /// Variant URL the loader was given
    pub fn effective_url(&self) -> &str {
        &self.effective_url
    }

    /// Current visibility state
    pub fn visibility(&self) -> VisibilityState {
        self.observation.state()
    }

    /// Current load state
    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    /// Subscribe to load state transitions
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.loader.subscribe()
    }

    /// Compute the layered visual state for rendering
    pub fn visual_state(&self) -> VisualState {
        let state = self.loader.state();

        let show_media = state.phase == LoadPhase::Loaded;
        // Terminal states are mutually exclusive with the skeleton.
        let show_skeleton = !state.phase.is_terminal();
        let show_placeholder = self.descriptor.placeholder_url.is_some() && !show_media;

        let display_src = match state.phase {
            LoadPhase::Loaded | LoadPhase::Failed => state.current_src,
            LoadPhase::Idle | LoadPhase::Loading => self
                .descriptor
                .placeholder_url
                .clone()
                .unwrap_or_default(),
        };

        VisualState {
            show_media,
            show_skeleton,
            show_placeholder,
            display_src,
            transition_ms: self.transition.as_millis() as u64,
            aspect: self.descriptor.aspect,
        }
    }

    /// Unmount the element
    ///
    /// Synchronously detaches the observation and invalidates any
    /// pending decode completion.
    pub fn unmount(&self) {
        self.observation.release();
        self.loader.invalidate();
        debug!("unmounted {}", self.id);
    }
}

impl Drop for MediaElement {
    fn drop(&mut self) {
        self.unmount();
    }
}
