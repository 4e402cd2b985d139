//! Request classification into cache categories.
//!
//! Every outbound request belongs to exactly one category; each category is
//! an isolated named store with its own strategy and eviction bound. The
//! category is a closed enum so the policy dispatch in
//! [`CacheManager`](super::CacheManager) is exhaustive — no implicit
//! fallthrough.

use super::fetch::Request;
use std::fmt;

/// The four isolated cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Encoded image assets. Content-addressed by name: cache-first.
    Image,
    /// Backend API calls. Freshness matters: network-first.
    Api,
    /// Build-hashed css/js/fonts: cache-first.
    Static,
    /// HTML documents: network-first with an offline-document fallback.
    Navigation,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 4] = [
        CacheCategory::Image,
        CacheCategory::Api,
        CacheCategory::Static,
        CacheCategory::Navigation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheCategory::Image => "image",
            CacheCategory::Api => "api",
            CacheCategory::Static => "static",
            CacheCategory::Navigation => "navigation",
        }
    }

    pub fn from_name(name: &str) -> Option<CacheCategory> {
        CacheCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png", "gif", "svg", "avif", "ico"];
const STATIC_EXTENSIONS: &[&str] = &["css", "js", "woff", "woff2", "ttf", "webmanifest"];
const API_PREFIX: &str = "/api/";

/// URL path without scheme, host, query, or fragment.
fn path_of(url: &str) -> &str {
    let after_host = match url.split_once("://") {
        Some((_, rest)) => match rest.find('/') {
            Some(i) => &rest[i..],
            None => "/",
        },
        None => url,
    };
    let end = after_host
        .find(['?', '#'])
        .unwrap_or(after_host.len());
    &after_host[..end]
}

fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

/// Classify a request into exactly one category.
///
/// Match order: image extension, API path prefix, static-asset extension,
/// else navigation.
pub fn classify(request: &Request) -> CacheCategory {
    let path = path_of(&request.url);
    let ext = extension_of(path);
    if ext.is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|i| i.eq_ignore_ascii_case(e))) {
        return CacheCategory::Image;
    }
    if path.starts_with(API_PREFIX) {
        return CacheCategory::Api;
    }
    if ext.is_some_and(|e| STATIC_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e))) {
        return CacheCategory::Static;
    }
    CacheCategory::Navigation
}
