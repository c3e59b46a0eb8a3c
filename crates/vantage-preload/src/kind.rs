//! Resource-type classification by file extension

use serde::{Deserialize, Serialize};

/// Load hint for a preloaded resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreloadKind {
    /// Web font; fetched anonymously cross-origin
    Font,
    /// Raster or vector image
    Image,
    /// Stylesheet
    Style,
    /// Script
    Script,
}

impl PreloadKind {
    /// Value for the `as` attribute of the preload directive
    pub fn as_hint(&self) -> &'static str {
        match self {
            PreloadKind::Font => "font",
            PreloadKind::Image => "image",
            PreloadKind::Style => "style",
            PreloadKind::Script => "script",
        }
    }

    /// Whether this kind requires the cross-origin credential mode
    pub fn requires_cross_origin(&self) -> bool {
        matches!(self, PreloadKind::Font)
    }
}

/// Classify a URL by its file extension
///
/// Case-insensitive; query strings and fragments are ignored.
/// Unrecognized extensions return `None` and are still preloaded, just
/// without a type hint.
pub fn classify(url: &str) -> Option<PreloadKind> {
    let path = url
        .split_once(['?', '#'])
        .map_or(url, |(path, _)| path);
    let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();

    match extension.as_str() {
        "woff" | "woff2" | "ttf" | "eot" => Some(PreloadKind::Font),
        "jpg" | "jpeg" | "png" | "webp" | "svg" => Some(PreloadKind::Image),
        "css" => Some(PreloadKind::Style),
        "js" => Some(PreloadKind::Script),
        _ => None,
    }
}
