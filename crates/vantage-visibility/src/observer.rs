//! One-shot and continuous viewport observers
//!
//! The one-shot [`VisibilityObserver`] fires once and disengages: a
//! resource that started loading must not be torn down and restarted
//! on viewport exit. The [`ContinuousObserver`] keeps reporting
//! in/out transitions and latches `has_been_in_view`.

use crate::{ElementId, ObservationHandle, ObserverConfig, VisibilityState, ViewportSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// A live one-shot observation of a single element
#[derive(Debug)]
pub struct Observation {
    state_rx: watch::Receiver<VisibilityState>,
    handle: ObservationHandle,
}

impl Observation {
    /// Current visibility state
    pub fn state(&self) -> VisibilityState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<VisibilityState> {
        self.state_rx.clone()
    }

    /// Resolve once the element has entered the viewport proximity zone
    ///
    /// Returns the state observed at resolution. If the observation is
    /// released before any intersection, resolves with the last state.
    pub async fn entered(&mut self) -> VisibilityState {
        loop {
            let state = *self.state_rx.borrow();
            if state.is_in_view() {
                return state;
            }
            if self.state_rx.changed().await.is_err() {
                return *self.state_rx.borrow();
            }
        }
    }

    /// Handle owning the underlying subscription
    pub fn handle(&self) -> &ObservationHandle {
        &self.handle
    }

    /// Detach the observation
    pub fn release(&self) {
        self.handle.release();
    }
}

/// One-shot viewport observer
///
/// Produces a single `InView` signal per observation when the first
/// satisfying intersection arrives, then disengages permanently.
pub struct VisibilityObserver {
    source: Arc<dyn ViewportSource>,
    config: ObserverConfig,
}

impl VisibilityObserver {
    /// Create an observer over a viewport capability
    pub fn new(source: Arc<dyn ViewportSource>, config: ObserverConfig) -> Self {
        Self { source, config }
    }

    /// Observer configuration
    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Begin observing an element
    ///
    /// When the capability is unavailable the observer fails open: the
    /// element is treated as immediately in view so content still
    /// loads.
    pub fn observe(&self, element: ElementId) -> Observation {
        let (state_tx, state_rx) = watch::channel(VisibilityState::NotObserved);

        let mut report_rx = match self.source.subscribe(element, &self.config) {
            Ok(rx) => rx,
            // Fail open: content still loads when the capability is
            // missing or the subscription is refused.
            Err(err) => {
                warn!("observation unavailable ({err}), treating {element} as in view");
                let _ = state_tx.send(VisibilityState::InView);
                let _ = state_tx.send(VisibilityState::Settled);
                return Observation {
                    state_rx,
                    handle: ObservationHandle::released(self.source.clone(), element),
                };
            }
        };

        let handle = ObservationHandle::new(self.source.clone(), element);
        let threshold = self.config.threshold;
        let task_handle = handle.clone();

        tokio::spawn(async move {
            while let Some(report) = report_rx.recv().await {
                if report.ratio >= threshold {
                    let _ = state_tx.send(VisibilityState::InView);
                    // Disengage before settling so duplicate reports
                    // cannot re-trigger.
                    task_handle.release();
                    let _ = state_tx.send(VisibilityState::Settled);
                    debug!("{} entered view at ratio {:.2}", report.element, report.ratio);
                    break;
                }
            }
        });

        Observation { state_rx, handle }
    }
}

/// A live continuous observation of a single element
#[derive(Debug)]
pub struct ContinuousObservation {
    in_view_rx: watch::Receiver<bool>,
    has_been_in_view: Arc<AtomicBool>,
    handle: ObservationHandle,
}

impl ContinuousObservation {
    /// Whether the element is currently in view
    pub fn is_in_view(&self) -> bool {
        *self.in_view_rx.borrow()
    }

    /// Whether the element has ever been in view; once true, always true
    pub fn has_been_in_view(&self) -> bool {
        self.has_been_in_view.load(Ordering::SeqCst)
    }

    /// Subscribe to in/out transitions
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.in_view_rx.clone()
    }

    /// Handle owning the underlying subscription
    pub fn handle(&self) -> &ObservationHandle {
        &self.handle
    }

    /// Detach the observation
    pub fn release(&self) {
        self.handle.release();
    }
}

/// Continuous viewport observer
///
/// Keeps reporting `in view` / `not in view` indefinitely; used by
/// components that need repeated visibility awareness rather than
/// one-shot triggering.
pub struct ContinuousObserver {
    source: Arc<dyn ViewportSource>,
    config: ObserverConfig,
}

impl ContinuousObserver {
    /// Create an observer over a viewport capability
    pub fn new(source: Arc<dyn ViewportSource>, config: ObserverConfig) -> Self {
        Self { source, config }
    }

    /// Begin observing an element; fails open like the one-shot variant
    pub fn observe(&self, element: ElementId) -> ContinuousObservation {
        let (in_view_tx, in_view_rx) = watch::channel(false);
        let has_been_in_view = Arc::new(AtomicBool::new(false));

        let mut report_rx = match self.source.subscribe(element, &self.config) {
            Ok(rx) => rx,
            Err(err) => {
                warn!("observation failed ({err}), treating {element} as in view");
                has_been_in_view.store(true, Ordering::SeqCst);
                let _ = in_view_tx.send(true);
                return ContinuousObservation {
                    in_view_rx,
                    has_been_in_view,
                    handle: ObservationHandle::released(self.source.clone(), element),
                };
            }
        };

        let handle = ObservationHandle::new(self.source.clone(), element);
        let threshold = self.config.threshold;
        let latch = has_been_in_view.clone();

        tokio::spawn(async move {
            while let Some(report) = report_rx.recv().await {
                let in_view = report.ratio >= threshold;
                if in_view {
                    latch.store(true, Ordering::SeqCst);
                }
                if in_view_tx.send(in_view).is_err() {
                    break;
                }
            }
        });

        ContinuousObservation {
            in_view_rx,
            has_been_in_view,
            handle,
        }
    }
}
