//! Error types for viewport observation

use thiserror::Error;

/// Errors that can occur during viewport observation
#[derive(Debug, Error)]
pub enum VisibilityError {
    /// Intersection capability missing or disallowed by the host
    #[error("Viewport observation unavailable: {0}")]
    ObservationUnavailable(String),

    /// Element already has an active subscription
    #[error("Element {0} is already observed")]
    AlreadyObserved(u64),
}

/// Result type for observation operations
pub type Result<T> = std::result::Result<T, VisibilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_error_display() {
        let err = VisibilityError::ObservationUnavailable("sandboxed host".to_string());
        assert!(err.to_string().contains("unavailable"));
        assert!(err.to_string().contains("sandboxed host"));
    }

    #[test]
    fn test_already_observed_error_display() {
        let err = VisibilityError::AlreadyObserved(7);
        assert!(err.to_string().contains("already observed"));
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VisibilityError>();
    }
}
