//! Viewport capability seam
//!
//! The host environment owns the actual intersection machinery; this
//! crate only consumes its reports through the [`ViewportSource`]
//! trait. Observers subscribe to an element, receive a stream of
//! [`IntersectionReport`]s, and unsubscribe when done.

use crate::{Result, VisibilityError};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Configuration for viewport observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Fraction of the element that must be visible (0.0 - 1.0)
    pub threshold: f32,
    /// Proximity margin around the viewport in pixels
    pub root_margin_px: u32,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            threshold: crate::DEFAULT_THRESHOLD,
            root_margin_px: crate::DEFAULT_ROOT_MARGIN_PX,
        }
    }
}

/// Opaque identity of an observed element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

impl ElementId {
    /// Allocate a fresh element identity
    pub fn next() -> Self {
        ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// A single intersection report from the viewport capability
#[derive(Debug, Clone, Copy)]
pub struct IntersectionReport {
    /// Element the report concerns
    pub element: ElementId,
    /// Visible fraction of the element (0.0 - 1.0)
    pub ratio: f32,
}

/// External intersection capability
///
/// Subscribing yields a report channel; dropping the subscription is
/// signalled through [`ViewportSource::unsubscribe`], after which the
/// sender side is released and no further reports arrive.
pub trait ViewportSource: Send + Sync {
    /// Begin delivering intersection reports for an element
    fn subscribe(
        &self,
        element: ElementId,
        config: &ObserverConfig,
    ) -> Result<mpsc::Receiver<IntersectionReport>>;

    /// Stop delivering reports for an element
    fn unsubscribe(&self, element: ElementId);
}

/// In-memory viewport source driven by hand
///
/// Hosts without a real intersection capability and tests both use
/// this implementation: reports are pushed explicitly via
/// [`StaticViewport::report`].
pub struct StaticViewport {
    senders: DashMap<ElementId, mpsc::Sender<IntersectionReport>>,
    available: bool,
}

impl StaticViewport {
    /// Create an available viewport source
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
            available: true,
        }
    }

    /// Create a source that reports the capability as missing
    pub fn unavailable() -> Self {
        Self {
            senders: DashMap::new(),
            available: false,
        }
    }

    /// Push an intersection report for an element
    ///
    /// Returns `false` if the element has no active subscription or
    /// the report buffer is full.
    pub fn report(&self, element: ElementId, ratio: f32) -> bool {
        match self.senders.get(&element) {
            Some(tx) => tx.try_send(IntersectionReport { element, ratio }).is_ok(),
            None => false,
        }
    }

    /// Whether an element currently has an active subscription
    pub fn is_observed(&self, element: ElementId) -> bool {
        self.senders.contains_key(&element)
    }

    /// Number of active subscriptions
    pub fn observed_count(&self) -> usize {
        self.senders.len()
    }
}

impl Default for StaticViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportSource for StaticViewport {
    fn subscribe(
        &self,
        element: ElementId,
        _config: &ObserverConfig,
    ) -> Result<mpsc::Receiver<IntersectionReport>> {
        if !self.available {
            return Err(VisibilityError::ObservationUnavailable(
                "intersection capability disabled".into(),
            ));
        }
        if self.senders.contains_key(&element) {
            return Err(VisibilityError::AlreadyObserved(element.0));
        }

        let (tx, rx) = mpsc::channel(8);
        self.senders.insert(element, tx);
        Ok(rx)
    }

    fn unsubscribe(&self, element: ElementId) {
        self.senders.remove(&element);
    }
}
