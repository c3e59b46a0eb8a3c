//! Resource descriptors

use serde::{Deserialize, Serialize};

/// Aspect ratio reservation for a media element
///
/// Reserving layout before load completes prevents layout shift;
/// `Auto` reserves no fixed ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageAspect {
    /// 1:1
    Square,
    /// 16:9
    Video,
    /// Natural dimensions, no reservation
    Auto,
}

impl ImageAspect {
    /// Width/height ratio to reserve, if any
    pub fn ratio(&self) -> Option<(u32, u32)> {
        match self {
            ImageAspect::Square => Some((1, 1)),
            ImageAspect::Video => Some((16, 9)),
            ImageAspect::Auto => None,
        }
    }
}

impl Default for ImageAspect {
    fn default() -> Self {
        ImageAspect::Auto
    }
}

/// Immutable description of a media resource
///
/// Supplied by the caller at mount time; a rendered element owns
/// exactly one descriptor for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Primary resource URL
    pub url: String,
    /// Low-fidelity placeholder shown blurred while loading
    pub placeholder_url: Option<String>,
    /// Display source when the primary resource fails
    pub fallback_url: String,
    /// Layout reservation
    pub aspect: ImageAspect,
}

impl ResourceDescriptor {
    /// Create a descriptor for a URL with no placeholder or fallback
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            placeholder_url: None,
            fallback_url: String::new(),
            aspect: ImageAspect::Auto,
        }
    }

    /// Set the placeholder URL
    pub fn with_placeholder(mut self, url: impl Into<String>) -> Self {
        self.placeholder_url = Some(url.into());
        self
    }

    /// Set the fallback URL
    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = url.into();
        self
    }

    /// Set the aspect reservation
    pub fn with_aspect(mut self, aspect: ImageAspect) -> Self {
        self.aspect = aspect;
        self
    }
}
