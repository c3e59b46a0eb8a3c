//! Visibility-gated resource loading
//!
//! One loader per rendered element. The loader begins a decode only
//! when the visibility gate is satisfied, keeps at most one decode in
//! flight, and neutralizes stale completions with a generation counter
//! captured at request time and compared at completion time.

use crate::{MediaError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Phase of a resource load
///
/// Monotonic: `Idle -> Loading -> {Loaded | Failed}`. Never regresses
/// and never skips `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    /// No load started
    Idle,
    /// Decode in flight
    Loading,
    /// Decode succeeded, terminal
    Loaded,
    /// Decode failed, terminal
    Failed,
}

impl LoadPhase {
    /// Whether this phase is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadPhase::Loaded | LoadPhase::Failed)
    }
}

/// Observable state of a resource load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadState {
    /// Current phase
    pub phase: LoadPhase,
    /// Effective display source for this phase
    pub current_src: String,
}

impl LoadState {
    fn idle() -> Self {
        Self {
            phase: LoadPhase::Idle,
            current_src: String::new(),
        }
    }
}

/// Decode collaborator
///
/// Performs the actual fetch/decode of a resource URL. A failure is
/// terminal for that attempt; the loader never retries.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch and decode a resource
    async fn decode(&self, url: &str) -> Result<Bytes>;
}

/// Counters for a loader's lifetime
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoaderStats {
    /// Decode attempts started
    pub attempts: u64,
    /// Attempts that settled `Loaded`
    pub loaded: u64,
    /// Attempts that settled `Failed`
    pub failed: u64,
    /// Completions rejected as stale
    pub stale_rejections: u64,
    /// Bytes decoded across successful attempts
    pub bytes_decoded: u64,
}

struct LoaderInner {
    state: RwLock<LoadState>,
    state_tx: watch::Sender<LoadState>,
    /// Bumped for every new attempt and on invalidation; completions
    /// carrying an older value are rejected.
    generation: AtomicU64,
    unmounted: AtomicBool,
    stats: RwLock<LoaderStats>,
}

impl LoaderInner {
    /// Apply a terminal phase if `generation` is still current
    ///
    /// The generation comparison happens under the state lock so a
    /// concurrent `begin` cannot supersede between the check and the
    /// transition.
    fn settle(&self, generation: u64, phase: LoadPhase, src: String) -> bool {
        if self.unmounted.load(Ordering::SeqCst) {
            debug!("completion after unmount ignored");
            return false;
        }

        let mut state = self.state.write().unwrap();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("stale completion rejected at generation {generation}");
            drop(state);
            self.stats.write().unwrap().stale_rejections += 1;
            return false;
        }
        if state.phase.is_terminal() {
            return false;
        }
        state.phase = phase;
        state.current_src = src;
        let _ = self.state_tx.send(state.clone());
        drop(state);

        let mut stats = self.stats.write().unwrap();
        match phase {
            LoadPhase::Loaded => stats.loaded += 1,
            LoadPhase::Failed => stats.failed += 1,
            _ => {}
        }
        true
    }
}

/// Visibility-gated, generation-guarded resource loader
///
/// Cheap to clone; clones share the same load state.
#[derive(Clone)]
pub struct ResourceLoader {
    fetcher: Arc<dyn MediaFetcher>,
    inner: Arc<LoaderInner>,
    state_rx: watch::Receiver<LoadState>,
}

impl ResourceLoader {
    /// Create a loader over a decode collaborator
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        let (state_tx, state_rx) = watch::channel(LoadState::idle());
        Self {
            fetcher,
            inner: Arc::new(LoaderInner {
                state: RwLock::new(LoadState::idle()),
                state_tx,
                generation: AtomicU64::new(0),
                unmounted: AtomicBool::new(false),
                stats: RwLock::new(LoaderStats::default()),
            }),
            state_rx,
        }
    }

    /// Begin a decode for the current input triple
    ///
    /// The visibility gate is a precondition, not a trigger: nothing
    /// happens until `in_view` is true and `url` is non-empty. Calling
    /// again with a different URL before the current attempt settles
    /// supersedes it; the stale attempt's completion is discarded. A
    /// settled loader ignores further calls.
    pub fn begin(&self, in_view: bool, url: &str, fallback: Option<&str>) {
        if !in_view || url.is_empty() {
            return;
        }

        // The terminal check, generation bump, and Loading transition
        // happen under one write lock so a completion cannot land in
        // the window between them.
        let generation = {
            let mut state = self.inner.state.write().unwrap();
            if state.phase.is_terminal() {
                debug!("begin ignored, load already settled");
                return;
            }
            // Duplicate gate events for the same URL collapse into the
            // attempt already in flight.
            if state.phase == LoadPhase::Loading && state.current_src == url {
                return;
            }

            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.phase = LoadPhase::Loading;
            state.current_src = url.to_string();
            let _ = self.inner.state_tx.send(state.clone());
            generation
        };
        self.inner.stats.write().unwrap().attempts += 1;

        let fetcher = self.fetcher.clone();
        let inner = self.inner.clone();
        let url = url.to_string();
        let fallback = fallback.map(str::to_string);

        tokio::spawn(async move {
            match fetcher.decode(&url).await {
                Ok(data) => {
                    let size = data.len() as u64;
                    if inner.settle(generation, LoadPhase::Loaded, url.clone()) {
                        inner.stats.write().unwrap().bytes_decoded += size;
                        debug!("loaded {url} ({size} bytes)");
                    }
                }
                Err(err) => {
                    let src = fallback.unwrap_or_default();
                    if inner.settle(generation, LoadPhase::Failed, src) {
                        warn!("decode failed for {url}: {err}");
                    }
                }
            }
        });
    }

    /// Current load state
    pub fn state(&self) -> LoadState {
        self.inner.state.read().unwrap().clone()
    }

    /// Current phase
    pub fn phase(&self) -> LoadPhase {
        self.inner.state.read().unwrap().phase
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state_rx.clone()
    }

    /// Lifetime counters
    pub fn stats(&self) -> LoaderStats {
        *self.inner.stats.read().unwrap()
    }

    /// Invalidate any pending completion
    ///
    /// Called on unmount; a decode that finishes afterwards no-ops.
    pub fn invalidate(&self) {
        self.inner.unmounted.store(true, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory fetcher for hosts and tests
///
/// Maps URLs to canned outcomes; unknown URLs fail, and URLs marked
/// pending never settle.
#[derive(Default)]
pub struct StaticFetcher {
    responses: DashMap<String, Bytes>,
    pending: DashMap<String, ()>,
}

impl StaticFetcher {
    /// Create an empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a successful response for a URL
    pub fn insert(&self, url: impl Into<String>, data: Bytes) {
        self.responses.insert(url.into(), data);
    }

    /// Register a URL whose decode never settles
    pub fn insert_pending(&self, url: impl Into<String>) {
        self.pending.insert(url.into(), ());
    }
}

#[async_trait]
impl MediaFetcher for StaticFetcher {
    async fn decode(&self, url: &str) -> Result<Bytes> {
        if self.pending.contains_key(url) {
            std::future::pending::<()>().await;
        }
        match self.responses.get(url) {
            Some(data) => Ok(data.clone()),
            None => Err(MediaError::DecodeFailure {
                url: url.to_string(),
                reason: "not found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Notify;
    use tokio::time::{timeout, Duration};

    /// Fetcher whose gated URLs decode only once released
    #[derive(Default)]
    struct GatedFetcher {
        responses: DashMap<String, Bytes>,
        gates: DashMap<String, Arc<Notify>>,
    }

    impl GatedFetcher {
        fn new() -> Self {
            Self::default()
        }

        fn insert(&self, url: impl Into<String>, data: Bytes) {
            self.responses.insert(url.into(), data);
        }

        /// Hold decodes of a URL until the returned gate is notified
        fn gate(&self, url: impl Into<String>) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates.insert(url.into(), gate.clone());
            gate
        }
    }

    #[async_trait]
    impl MediaFetcher for GatedFetcher {
        async fn decode(&self, url: &str) -> Result<Bytes> {
            let gate = self.gates.get(url).map(|g| g.clone());
            if let Some(gate) = gate {
                gate.notified().await;
            }
            match self.responses.get(url) {
                Some(data) => Ok(data.clone()),
                None => Err(MediaError::DecodeFailure {
                    url: url.to_string(),
                    reason: "not found".to_string(),
                }),
            }
        }
    }

    async fn settled(loader: &ResourceLoader) -> LoadState {
        let mut rx = loader.subscribe();
        timeout(Duration::from_secs(1), async {
            loop {
                if rx.borrow().phase.is_terminal() {
                    return rx.borrow().clone();
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("load did not settle")
    }

    #[tokio::test]
    async fn test_load_success() {
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.insert("/img/a.jpg", Bytes::from_static(b"pixels"));

        let loader = ResourceLoader::new(fetcher);
        assert_eq!(loader.phase(), LoadPhase::Idle);

        loader.begin(true, "/img/a.jpg", None);
        assert_eq!(loader.phase(), LoadPhase::Loading);

        let state = settled(&loader).await;
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert_eq!(state.current_src, "/img/a.jpg");

        let stats = loader.stats();
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.bytes_decoded, 6);
    }

    #[tokio::test]
    async fn test_load_failure_uses_fallback() {
        let loader = ResourceLoader::new(Arc::new(StaticFetcher::new()));
        loader.begin(true, "/img/missing.jpg", Some("/img/fallback.png"));

        let state = settled(&loader).await;
        assert_eq!(state.phase, LoadPhase::Failed);
        assert_eq!(state.current_src, "/img/fallback.png");
        assert_eq!(loader.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_load_failure_without_fallback() {
        let loader = ResourceLoader::new(Arc::new(StaticFetcher::new()));
        loader.begin(true, "/img/missing.jpg", None);

        let state = settled(&loader).await;
        assert_eq!(state.phase, LoadPhase::Failed);
        assert!(state.current_src.is_empty());
    }

    #[tokio::test]
    async fn test_not_in_view_does_not_load() {
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.insert("/img/a.jpg", Bytes::from_static(b"pixels"));

        let loader = ResourceLoader::new(fetcher);
        loader.begin(false, "/img/a.jpg", None);

        tokio::task::yield_now().await;
        assert_eq!(loader.phase(), LoadPhase::Idle);
        assert_eq!(loader.stats().attempts, 0);
    }

    #[tokio::test]
    async fn test_empty_url_does_not_load() {
        let loader = ResourceLoader::new(Arc::new(StaticFetcher::new()));
        loader.begin(true, "", None);

        tokio::task::yield_now().await;
        assert_eq!(loader.phase(), LoadPhase::Idle);
    }

    #[tokio::test]
    async fn test_duplicate_begin_single_attempt() {
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.insert("/img/a.jpg", Bytes::from_static(b"pixels"));

        let loader = ResourceLoader::new(fetcher);
        loader.begin(true, "/img/a.jpg", None);
        loader.begin(true, "/img/a.jpg", None);

        settled(&loader).await;
        assert_eq!(loader.stats().attempts, 1);
    }

    #[tokio::test]
    async fn test_stale_completion_rejected() {
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.insert_pending("/img/slow.jpg");
        fetcher.insert("/img/fast.jpg", Bytes::from_static(b"pixels"));

        let loader = ResourceLoader::new(fetcher.clone());

        // First attempt hangs; second supersedes it.
        loader.begin(true, "/img/slow.jpg", None);
        loader.begin(true, "/img/fast.jpg", None);

        let state = settled(&loader).await;
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert_eq!(state.current_src, "/img/fast.jpg");

        // The slow attempt can no longer overwrite the settled state.
        assert_eq!(loader.state().current_src, "/img/fast.jpg");
        assert_eq!(loader.stats().attempts, 2);
    }

    #[tokio::test]
    async fn test_superseded_decode_resolving_late_is_rejected() {
        let fetcher = Arc::new(GatedFetcher::new());
        fetcher.insert("/img/slow.jpg", Bytes::from_static(b"stale"));
        fetcher.insert("/img/fast.jpg", Bytes::from_static(b"fresh"));
        let release = fetcher.gate("/img/slow.jpg");

        let loader = ResourceLoader::new(fetcher);

        // First attempt is held at the gate; second supersedes it and
        // settles.
        loader.begin(true, "/img/slow.jpg", None);
        loader.begin(true, "/img/fast.jpg", None);

        let state = settled(&loader).await;
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert_eq!(state.current_src, "/img/fast.jpg");

        // Now let the superseded decode actually resolve, out of order.
        release.notify_one();
        timeout(Duration::from_secs(1), async {
            while loader.stats().stale_rejections == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("stale completion was never rejected");

        // The late resolution produced no observable effect.
        let state = loader.state();
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert_eq!(state.current_src, "/img/fast.jpg");
        assert_eq!(loader.stats().stale_rejections, 1);
    }

    #[tokio::test]
    async fn test_settled_loader_ignores_begin() {
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.insert("/img/a.jpg", Bytes::from_static(b"pixels"));
        fetcher.insert("/img/b.jpg", Bytes::from_static(b"other"));

        let loader = ResourceLoader::new(fetcher);
        loader.begin(true, "/img/a.jpg", None);
        let first = settled(&loader).await;

        loader.begin(true, "/img/b.jpg", None);
        tokio::task::yield_now().await;

        assert_eq!(loader.state(), first);
        assert_eq!(loader.stats().attempts, 1);
    }

    #[tokio::test]
    async fn test_invalidate_neutralizes_pending() {
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.insert("/img/a.jpg", Bytes::from_static(b"pixels"));

        let loader = ResourceLoader::new(fetcher);
        loader.begin(true, "/img/a.jpg", None);
        loader.invalidate();

        // Give the decode task time to complete and be rejected.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(loader.phase(), LoadPhase::Loading);
    }

    #[tokio::test]
    async fn test_hung_decode_stays_loading() {
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.insert_pending("/img/hung.jpg");

        let loader = ResourceLoader::new(fetcher);
        loader.begin(true, "/img/hung.jpg", None);

        // No timeout policy: the load stays pending indefinitely.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(loader.phase(), LoadPhase::Loading);
    }

    #[test]
    fn test_phase_terminality() {
        assert!(!LoadPhase::Idle.is_terminal());
        assert!(!LoadPhase::Loading.is_terminal());
        assert!(LoadPhase::Loaded.is_terminal());
        assert!(LoadPhase::Failed.is_terminal());
    }
}
