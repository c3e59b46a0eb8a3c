//! Error types for media loading

use thiserror::Error;

/// Errors that can occur while loading media
#[derive(Debug, Error)]
pub enum MediaError {
    /// Network or decode failure for the primary resource
    #[error("Decode failed for {url}: {reason}")]
    DecodeFailure { url: String, reason: String },
}

/// Result type for media operations
pub type Result<T> = std::result::Result<T, MediaError>;
