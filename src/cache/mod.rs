//! Runtime request cache: categorized stores, per-category strategies,
//! and the control command protocol.
//!
//! Every request is classified into one of four categories
//! ([`category::classify`]) and served by that category's strategy:
//! cache-first for images and static assets, network-first for API calls
//! and navigations. Each category is an isolated FIFO store
//! ([`store::CategoryStore`]); a separate always-kept precache holds the
//! app shell and is consulted before any category store.
//!
//! Store names embed the deployment version, so a version bump starts from
//! cold stores and old entries are simply never seen again.

pub mod category;
pub mod fetch;
pub mod store;

use self::category::{CacheCategory, classify};
use self::fetch::{Fetcher, NetworkError, Request, Response, Served, ServedFrom};
use self::store::CategoryStore;
use crate::config::CacheConfig;
use bytes::Bytes;
use futures::future::join_all;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const STORE_PREFIX: &str = "respimg";

/// Placeholder responses served when the network is down and nothing is
/// cached. Each category degrades differently: a grey placeholder image,
/// a JSON error envelope, a plain 503, or the offline document.
#[derive(Debug, Clone)]
pub struct FallbackAssets {
    placeholder_image: Response,
    offline_document: Response,
}

impl FallbackAssets {
    pub fn new(placeholder_image: Bytes, image_content_type: &str, offline_html: Bytes) -> Self {
        Self {
            placeholder_image: Response::ok(image_content_type, placeholder_image),
            offline_document: Response::ok("text/html", offline_html),
        }
    }

    fn for_category(&self, category: CacheCategory) -> Response {
        match category {
            CacheCategory::Image => self.placeholder_image.clone(),
            CacheCategory::Api => Response::with_status(
                503,
                "application/json",
                r#"{"error":"offline","status":503}"#,
            ),
            CacheCategory::Static => {
                Response::with_status(503, "text/plain", "service unavailable")
            }
            CacheCategory::Navigation => self.offline_document.clone(),
        }
    }
}

impl Default for FallbackAssets {
    fn default() -> Self {
        Self::new(
            Bytes::from_static(
                br##"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"><rect width="1" height="1" fill="#ccc"/></svg>"##,
            ),
            "image/svg+xml",
            Bytes::from_static(b"<!doctype html><title>Offline</title><p>You are offline.</p>"),
        )
    }
}

/// Control messages accepted by [`CacheManager::handle_command`]. Wire form
/// is a tagged JSON object, e.g. `{"type":"CACHE_URLS","urls":[...]}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "CACHE_URLS")]
    CacheUrls { urls: Vec<String> },
    #[serde(rename = "CLEAR_CACHE")]
    ClearCache {
        #[serde(default)]
        category: Option<String>,
    },
}

/// The categorized cache front-end. Generic over the transport so tests run
/// against a scripted fetcher.
pub struct CacheManager<F: Fetcher> {
    fetcher: F,
    fallbacks: FallbackAssets,
    image: Mutex<CategoryStore>,
    api: Mutex<CategoryStore>,
    r#static: Mutex<CategoryStore>,
    navigation: Mutex<CategoryStore>,
    precache: Mutex<CategoryStore>,
    activated: AtomicBool,
}

impl<F: Fetcher> CacheManager<F> {
    pub fn new(fetcher: F, version: &str, config: &CacheConfig, fallbacks: FallbackAssets) -> Self {
        let named = |category: CacheCategory, max: usize| {
            let store = CategoryStore::bounded(
                format!("{STORE_PREFIX}-{category}-v{version}"),
                max,
            );
            match config.quota_bytes {
                Some(quota) => store.with_quota(quota),
                None => store,
            }
        };
        Self {
            fetcher,
            fallbacks,
            image: Mutex::new(named(CacheCategory::Image, config.image_max_entries)),
            api: Mutex::new(named(CacheCategory::Api, config.api_max_entries)),
            r#static: Mutex::new(named(CacheCategory::Static, config.static_max_entries)),
            navigation: Mutex::new(named(
                CacheCategory::Navigation,
                config.navigation_max_entries,
            )),
            precache: Mutex::new(CategoryStore::always_kept(format!(
                "{STORE_PREFIX}-precache-v{version}"
            ))),
            activated: AtomicBool::new(false),
        }
    }

    fn store(&self, category: CacheCategory) -> &Mutex<CategoryStore> {
        match category {
            CacheCategory::Image => &self.image,
            CacheCategory::Api => &self.api,
            CacheCategory::Static => &self.r#static,
            CacheCategory::Navigation => &self.navigation,
        }
    }

    /// Serve a request via its category's strategy.
    pub async fn handle_request(&self, request: &Request) -> Served {
        let category = classify(request);
        match category {
            CacheCategory::Image | CacheCategory::Static => {
                self.cache_first(category, request).await
            }
            CacheCategory::Api | CacheCategory::Navigation => {
                self.network_first(category, request).await
            }
        }
    }

    /// Precache, then category store, then network. The network result is
    /// cached only when 2xx; transport failure degrades to the fallback.
    async fn cache_first(&self, category: CacheCategory, request: &Request) -> Served {
        let key = request.key();
        if let Some(response) = self.precache.lock().await.get(&key).cloned() {
            return Served {
                response,
                source: ServedFrom::Cache,
            };
        }
        if let Some(response) = self.store(category).lock().await.get(&key).cloned() {
            return Served {
                response,
                source: ServedFrom::Cache,
            };
        }
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.insert(category, key, response.clone()).await;
                }
                Served {
                    response,
                    source: ServedFrom::Network,
                }
            }
            Err(error) => self.degrade(category, request, error).await,
        }
    }

    /// Network, then category store, then precache, then fallback. A fresh
    /// 2xx response replaces the cached entry (with a fresh insertion
    /// order, so a refreshed entry is as new as its content).
    async fn network_first(&self, category: CacheCategory, request: &Request) -> Served {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.insert(category, request.key(), response.clone()).await;
                }
                Served {
                    response,
                    source: ServedFrom::Network,
                }
            }
            Err(error) => {
                let key = request.key();
                if let Some(response) = self.store(category).lock().await.get(&key).cloned() {
                    debug!(url = %request.url, "network down, serving cached entry");
                    return Served {
                        response,
                        source: ServedFrom::Cache,
                    };
                }
                self.degrade(category, request, error).await
            }
        }
    }

    /// Last resorts once the network has failed: precache, then the
    /// category fallback asset.
    async fn degrade(&self, category: CacheCategory, request: &Request, error: NetworkError) -> Served {
        warn!(url = %request.url, %error, "network failure");
        let key = request.key();
        if let Some(response) = self.precache.lock().await.get(&key).cloned() {
            return Served {
                response,
                source: ServedFrom::Cache,
            };
        }
        Served {
            response: self.fallbacks.for_category(category),
            source: ServedFrom::Fallback,
        }
    }

    /// A full store must never fail the request being served.
    async fn insert(&self, category: CacheCategory, key: String, response: Response) {
        if let Err(error) = self.store(category).lock().await.insert(key, response) {
            warn!(%category, %error, "cache insert rejected, serving uncached");
        }
    }

    pub async fn handle_command(&self, command: Command) {
        match command {
            Command::SkipWaiting => {
                self.activated.store(true, Ordering::SeqCst);
                debug!("activation requested");
            }
            Command::CacheUrls { urls } => self.precache_urls(&urls).await,
            Command::ClearCache { category } => self.clear(category.as_deref()).await,
        }
    }

    /// Bulk-load the app shell into the precache. Every URL is attempted;
    /// individual failures are logged and skipped.
    pub async fn precache_urls(&self, urls: &[String]) {
        let requests: Vec<Request> = urls.iter().map(Request::get).collect();
        let results = join_all(requests.iter().map(|r| self.fetcher.fetch(r))).await;
        let mut precache = self.precache.lock().await;
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(response) if response.is_ok() => {
                    if let Err(error) = precache.insert(request.key(), response) {
                        warn!(url = %request.url, %error, "precache insert rejected");
                    }
                }
                Ok(response) => {
                    warn!(url = %request.url, status = response.status, "precache fetch not ok");
                }
                Err(error) => {
                    warn!(url = %request.url, %error, "precache fetch failed");
                }
            }
        }
    }

    /// Clear one category store by name, or the precache when no name is
    /// given. An unknown name is logged and ignored.
    pub async fn clear(&self, category: Option<&str>) {
        match category {
            None => self.precache.lock().await.clear(),
            Some(name) => match CacheCategory::from_name(name) {
                Some(category) => self.store(category).lock().await.clear(),
                None => warn!(name, "clear request for unknown cache category"),
            },
        }
    }

    /// The underlying transport.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Whether a `SKIP_WAITING` command has been received.
    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }

    /// Entry count of a category store.
    pub async fn entry_count(&self, category: CacheCategory) -> usize {
        self.store(category).lock().await.len()
    }

    /// Entry count of the precache.
    pub async fn precache_count(&self) -> usize {
        self.precache.lock().await.len()
    }
}
