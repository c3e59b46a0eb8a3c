//! Observation handles
//!
//! A subscription to the viewport capability is owned by an
//! [`ObservationHandle`]. Release is explicit and idempotent, and the
//! handle also releases on drop so every exit path detaches the
//! callback, including unmount before any intersection fires.

use crate::{ElementId, ViewportSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

struct HandleInner {
    source: Arc<dyn ViewportSource>,
    element: ElementId,
    released: AtomicBool,
}

impl HandleInner {
    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.source.unsubscribe(self.element);
            debug!("released observation for {}", self.element);
        }
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owned handle to an active observation
///
/// Clones share the same underlying subscription; releasing any clone
/// releases them all.
#[derive(Clone)]
pub struct ObservationHandle {
    inner: Arc<HandleInner>,
}

impl ObservationHandle {
    /// Acquire a handle for an already-subscribed element
    pub(crate) fn new(source: Arc<dyn ViewportSource>, element: ElementId) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                source,
                element,
                released: AtomicBool::new(false),
            }),
        }
    }

    /// Create a handle that is already released
    ///
    /// Used when observation degraded fail-open and there is no
    /// subscription to detach.
    pub(crate) fn released(source: Arc<dyn ViewportSource>, element: ElementId) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                source,
                element,
                released: AtomicBool::new(true),
            }),
        }
    }

    /// Element this handle observes
    pub fn element(&self) -> ElementId {
        self.inner.element
    }

    /// Detach the observation; idempotent
    pub fn release(&self) {
        self.inner.release();
    }

    /// Whether the observation has been released
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ObservationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationHandle")
            .field("element", &self.inner.element)
            .field("released", &self.is_released())
            .finish()
    }
}
