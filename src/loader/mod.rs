//! Progressive image loader.
//!
//! Given an ordered list of variant URLs (one per slide), the loader
//! fetches them in three phases: the priority prefix first, then a
//! concurrent batch, then the remainder in small chunks after a settle
//! delay so the visible images win the bandwidth race. Per-slot state
//! ([`state::LoadState`]) makes loads idempotent, and a cancellation token
//! tears the whole schedule down mid-flight.
//!
//! The loader also owns the advance gate: automatic slide advance is
//! enabled only while the page is visible, the pointer is not hovering,
//! and the first image has arrived. Gate changes are published on a watch
//! channel.

pub mod probe;
pub mod state;

use crate::cache::CacheManager;
use crate::cache::fetch::{Fetcher, Request, ServedFrom};
use crate::config::LoaderConfig;
use crate::types::Dimensions;
use self::state::LoadState;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Hint forwarded to the transport: the priority prefix loads `High`,
/// everything else `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPriority {
    High,
    Auto,
}

#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// The cache layer degraded to a placeholder. A placeholder must never
    /// count as a loaded slide.
    #[error("{url}: served fallback placeholder")]
    Unavailable { url: String },
    #[error("{url}: http status {status}")]
    Status { url: String, status: u16 },
    #[error("{url}: undecodable image data ({reason})")]
    Decode { url: String, reason: String },
}

/// Where the loader gets image bytes from. The production impl routes
/// through the cache manager; tests script one.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, url: &str, priority: FetchPriority) -> Result<Dimensions, LoadError>;
}

/// [`ImageSource`] backed by the categorized cache.
pub struct CachedImageSource<F: Fetcher> {
    manager: Arc<CacheManager<F>>,
}

impl<F: Fetcher> CachedImageSource<F> {
    pub fn new(manager: Arc<CacheManager<F>>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl<F: Fetcher> ImageSource for CachedImageSource<F> {
    async fn load(&self, url: &str, priority: FetchPriority) -> Result<Dimensions, LoadError> {
        trace!(url, ?priority, "requesting image");
        let served = self.manager.handle_request(&Request::get(url)).await;
        if served.source == ServedFrom::Fallback {
            return Err(LoadError::Unavailable { url: url.into() });
        }
        if !served.response.is_ok() {
            return Err(LoadError::Status {
                url: url.into(),
                status: served.response.status,
            });
        }
        let decoded = image::load_from_memory(&served.response.body).map_err(|e| {
            LoadError::Decode {
                url: url.into(),
                reason: e.to_string(),
            }
        })?;
        Ok(Dimensions {
            width: decoded.width(),
            height: decoded.height(),
        })
    }
}

/// Phased loader plus the advance gate.
pub struct ProgressiveLoader<S: ImageSource> {
    source: Arc<S>,
    config: LoaderConfig,
    state: Arc<LoadState>,
    cancel: CancellationToken,
    page_visible: AtomicBool,
    pointer_over: AtomicBool,
    advance_tx: watch::Sender<bool>,
}

impl<S: ImageSource> ProgressiveLoader<S> {
    pub fn new(source: Arc<S>, config: LoaderConfig) -> Self {
        let (advance_tx, _) = watch::channel(false);
        Self {
            source,
            config,
            state: Arc::new(LoadState::new(0)),
            cancel: CancellationToken::new(),
            page_visible: AtomicBool::new(true),
            pointer_over: AtomicBool::new(false),
            advance_tx,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Load `urls` in phases: `priority_count` URLs at high priority, then
    /// one batch of `max_concurrent`, then (after the settle delay) the
    /// remainder in `max_concurrent`-sized chunks with a pause between
    /// chunks. Returns when every slot has settled or the loader is shut
    /// down.
    ///
    /// Settled slots are terminal: calling this again with the same list
    /// skips every `Loaded`/`Failed` index without a second load attempt.
    /// The state table is sized only when the URL count changes.
    pub async fn preload(&self, urls: &[String]) {
        if self.state.len() != urls.len() {
            self.state.reset(urls.len());
        }
        self.publish_gate();

        let priority_end = self.config.priority_count.min(urls.len());
        self.load_batch(&urls[..priority_end], 0, FetchPriority::High)
            .await;
        if self.cancel.is_cancelled() {
            return;
        }

        let batch_end = (priority_end + self.config.max_concurrent).min(urls.len());
        self.load_batch(&urls[priority_end..batch_end], priority_end, FetchPriority::Auto)
            .await;
        if self.cancel.is_cancelled() || batch_end == urls.len() {
            return;
        }

        if !self.pause(Duration::from_millis(self.config.settle_delay_ms)).await {
            return;
        }
        let mut index = batch_end;
        for chunk in urls[batch_end..].chunks(self.config.max_concurrent.max(1)) {
            if index > batch_end
                && !self
                    .pause(Duration::from_millis(self.config.inter_batch_delay_ms))
                    .await
            {
                return;
            }
            self.load_batch(chunk, index, FetchPriority::Auto).await;
            if self.cancel.is_cancelled() {
                return;
            }
            index += chunk.len();
        }
        debug!(total = urls.len(), loaded = self.state.loaded_count(), "preload complete");
    }

    /// All loads in a batch run concurrently; each settles its own slot,
    /// so one failure never blocks its neighbours.
    async fn load_batch(&self, urls: &[String], base_index: usize, priority: FetchPriority) {
        let loads = urls.iter().enumerate().map(|(offset, url)| {
            let index = base_index + offset;
            async move {
                if !self.state.begin(index) {
                    return;
                }
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    result = self.source.load(url, priority) => {
                        match result {
                            Ok(dimensions) => {
                                trace!(url, ?dimensions, "image loaded");
                                self.state.finish(index, true);
                            }
                            Err(error) => {
                                warn!(url, %error, "image load failed");
                                self.state.finish(index, false);
                            }
                        }
                        self.publish_gate();
                    }
                }
            }
        });
        join_all(loads).await;
    }

    /// Sleep that loses to shutdown. Returns `false` when cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    pub fn set_page_visible(&self, visible: bool) {
        self.page_visible.store(visible, Ordering::SeqCst);
        self.publish_gate();
    }

    pub fn set_pointer_over(&self, over: bool) {
        self.pointer_over.store(over, Ordering::SeqCst);
        self.publish_gate();
    }

    /// Current gate value.
    pub fn advance_allowed(&self) -> bool {
        *self.advance_tx.borrow()
    }

    /// Subscribe to gate changes.
    pub fn advance_enabled(&self) -> watch::Receiver<bool> {
        self.advance_tx.subscribe()
    }

    fn publish_gate(&self) {
        let allowed = self.page_visible.load(Ordering::SeqCst)
            && !self.pointer_over.load(Ordering::SeqCst)
            && self.state.is_first_loaded();
        self.advance_tx.send_if_modified(|current| {
            if *current != allowed {
                *current = allowed;
                true
            } else {
                false
            }
        });
    }

    /// Cancel every in-flight and future load. Settled slots keep their
    /// state; nothing transitions afterwards.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl<S: ImageSource> Drop for ProgressiveLoader<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
