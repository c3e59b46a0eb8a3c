//! Preload scheduling and head injection
//!
//! A fixed set of critical resources (fonts, above-the-fold images) is
//! preloaded eagerly at page mount, independent of scroll position.
//! The document head is never touched directly: injection goes through
//! the [`HeadWriter`] seam, and a denied mutation degrades silently to
//! "no preload" rather than interrupting rendering.

use crate::{classify, PreloadKind, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, info};

/// A single preload directive for the document head
///
/// Rendered as `<link rel="preload" href=.. as=.. crossorigin?>`;
/// directives are append-only and never mutated after injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadDirective {
    /// Resource URL
    pub href: String,
    /// Type hint; absent for unrecognized extensions
    pub kind: Option<PreloadKind>,
    /// Cross-origin credential mode, required for fonts
    pub cross_origin: bool,
}

impl PreloadDirective {
    /// Build a directive for a URL, classifying by extension
    pub fn for_url(href: impl Into<String>) -> Self {
        let href = href.into();
        let kind = classify(&href);
        let cross_origin = kind.is_some_and(|k| k.requires_cross_origin());
        Self {
            href,
            kind,
            cross_origin,
        }
    }
}

/// Head mutation seam
///
/// The only write to shared document state in the pipeline. Appending
/// may fail on sandboxed hosts; callers treat that as a silent skip.
pub trait HeadWriter: Send + Sync {
    /// Append a preload directive to the document head
    fn append(&self, directive: &PreloadDirective) -> Result<()>;
}

/// Head writer that records appended directives
///
/// Stands in for a real document head in hosts and tests.
#[derive(Default)]
pub struct RecordingHeadWriter {
    appended: Mutex<Vec<PreloadDirective>>,
}

impl RecordingHeadWriter {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Directives appended so far, in order
    pub fn appended(&self) -> Vec<PreloadDirective> {
        self.appended.lock().unwrap().clone()
    }
}

impl HeadWriter for RecordingHeadWriter {
    fn append(&self, directive: &PreloadDirective) -> Result<()> {
        self.appended.lock().unwrap().push(directive.clone());
        Ok(())
    }
}

/// Head writer that refuses every append
///
/// Models a sandboxed document for tests.
pub struct DeniedHeadWriter;

impl HeadWriter for DeniedHeadWriter {
    fn append(&self, _directive: &PreloadDirective) -> Result<()> {
        Err(crate::PreloadError::HeadMutationDenied(
            "document is sandboxed".into(),
        ))
    }
}

/// Counters for a scheduler's lifetime
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PreloadStats {
    /// URLs handed to the scheduler
    pub requested: u64,
    /// Directives successfully appended
    pub injected: u64,
    /// URLs skipped because they were already registered
    pub skipped_duplicates: u64,
    /// Appends refused by the host
    pub denied: u64,
}

/// Idempotent preload scheduler
///
/// Each URL produces at most one head entry per scheduler lifetime,
/// no matter how often it is scheduled.
pub struct PreloadScheduler<W: HeadWriter> {
    writer: W,
    registered: Mutex<HashSet<String>>,
    stats: Mutex<PreloadStats>,
}

impl<W: HeadWriter> PreloadScheduler<W> {
    /// Create a scheduler over a head writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            registered: Mutex::new(HashSet::new()),
            stats: Mutex::new(PreloadStats::default()),
        }
    }

    /// Schedule preloads for a list of resource URLs
    ///
    /// Returns the number of directives injected by this call. Denied
    /// appends are skipped silently; they never interrupt the page.
    pub fn schedule<I, S>(&self, urls: I) -> u64
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut injected_now: SmallVec<[String; 8]> = SmallVec::new();

        for url in urls {
            let url = url.into();
            self.stats.lock().unwrap().requested += 1;

            // Registration happens once per URL regardless of outcome,
            // so a denied append stays "no preload" rather than being
            // retried on the next call.
            if !self.registered.lock().unwrap().insert(url.clone()) {
                self.stats.lock().unwrap().skipped_duplicates += 1;
                continue;
            }

            let directive = PreloadDirective::for_url(&url);
            match self.writer.append(&directive) {
                Ok(()) => {
                    self.stats.lock().unwrap().injected += 1;
                    injected_now.push(url);
                }
                Err(err) => {
                    self.stats.lock().unwrap().denied += 1;
                    debug!("preload skipped for {url}: {err}");
                }
            }
        }

        if !injected_now.is_empty() {
            info!("injected {} preload directives", injected_now.len());
        }
        injected_now.len() as u64
    }

    /// Whether a URL has been registered
    pub fn is_registered(&self, url: &str) -> bool {
        self.registered.lock().unwrap().contains(url)
    }

    /// Lifetime counters
    pub fn stats(&self) -> PreloadStats {
        *self.stats.lock().unwrap()
    }

    /// The underlying head writer
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_classification() {
        let font = PreloadDirective::for_url("/fonts/inter.woff2");
        assert_eq!(font.kind, Some(PreloadKind::Font));
        assert!(font.cross_origin);

        let image = PreloadDirective::for_url("hero.webp");
        assert_eq!(image.kind, Some(PreloadKind::Image));
        assert!(!image.cross_origin);

        let unknown = PreloadDirective::for_url("data.bin");
        assert_eq!(unknown.kind, None);
        assert!(!unknown.cross_origin);
    }

    #[test]
    fn test_schedule_injects_each_url_once() {
        let scheduler = PreloadScheduler::new(RecordingHeadWriter::new());
        let urls = ["/fonts/inter.woff2", "/img/hero.webp", "/main.css", "/app.js"];

        assert_eq!(scheduler.schedule(urls), 4);
        // Identical list again: idempotent, no second head entry.
        assert_eq!(scheduler.schedule(urls), 0);

        let appended = scheduler.writer().appended();
        assert_eq!(appended.len(), 4);
        assert_eq!(appended[0].kind, Some(PreloadKind::Font));
        assert_eq!(appended[2].kind, Some(PreloadKind::Style));
        assert_eq!(appended[3].kind, Some(PreloadKind::Script));

        let stats = scheduler.stats();
        assert_eq!(stats.requested, 8);
        assert_eq!(stats.injected, 4);
        assert_eq!(stats.skipped_duplicates, 4);
    }

    #[test]
    fn test_unknown_kind_still_preloaded() {
        let scheduler = PreloadScheduler::new(RecordingHeadWriter::new());
        scheduler.schedule(["data.bin"]);

        let appended = scheduler.writer().appended();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].kind, None);
    }

    #[test]
    fn test_duplicates_within_one_call() {
        let scheduler = PreloadScheduler::new(RecordingHeadWriter::new());
        scheduler.schedule(["/a.css", "/a.css", "/a.css"]);

        assert_eq!(scheduler.writer().appended().len(), 1);
        assert_eq!(scheduler.stats().skipped_duplicates, 2);
    }

    #[test]
    fn test_denied_append_degrades_silently() {
        let scheduler = PreloadScheduler::new(DeniedHeadWriter);

        assert_eq!(scheduler.schedule(["/img/hero.webp"]), 0);

        let stats = scheduler.stats();
        assert_eq!(stats.denied, 1);
        assert_eq!(stats.injected, 0);
        // Still registered: no retry on a later call either.
        assert!(scheduler.is_registered("/img/hero.webp"));
        assert_eq!(scheduler.schedule(["/img/hero.webp"]), 0);
        assert_eq!(scheduler.stats().denied, 1);
    }

    #[test]
    fn test_registration_lookup() {
        let scheduler = PreloadScheduler::new(RecordingHeadWriter::new());
        scheduler.schedule(["/app.js"]);

        assert!(scheduler.is_registered("/app.js"));
        assert!(!scheduler.is_registered("/other.js"));
    }
}
