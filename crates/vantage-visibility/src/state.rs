//! Visibility state machine

use serde::{Deserialize, Serialize};

/// State of an observed element
///
/// Transitions are monotonic: `NotObserved -> InView -> Settled`.
/// `InView` is reached at most once per observation; `Settled` marks
/// that the observer has disengaged and no further transitions occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityState {
    /// No satisfying intersection yet
    NotObserved,
    /// First satisfying intersection received
    InView,
    /// Observer disengaged, terminal
    Settled,
}

impl VisibilityState {
    /// Whether the element has entered the viewport proximity zone
    pub fn is_in_view(&self) -> bool {
        matches!(self, VisibilityState::InView | VisibilityState::Settled)
    }

    /// Whether this state is terminal
    pub fn is_settled(&self) -> bool {
        matches!(self, VisibilityState::Settled)
    }

    /// Check whether a transition to `next` is legal
    pub fn can_advance(&self, next: VisibilityState) -> bool {
        matches!(
            (self, next),
            (VisibilityState::NotObserved, VisibilityState::InView)
                | (VisibilityState::InView, VisibilityState::Settled)
                | (VisibilityState::NotObserved, VisibilityState::Settled)
        )
    }
}

impl Default for VisibilityState {
    fn default() -> Self {
        VisibilityState::NotObserved
    }
}
