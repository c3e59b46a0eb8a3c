//! Error types for preload scheduling

use thiserror::Error;

/// Errors that can occur during preload injection
#[derive(Debug, Error)]
pub enum PreloadError {
    /// Head mutation blocked by host restrictions
    #[error("Head mutation denied: {0}")]
    HeadMutationDenied(String),
}

/// Result type for preload operations
pub type Result<T> = std::result::Result<T, PreloadError>;
