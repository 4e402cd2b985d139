//! The network seam: request/response types and the [`Fetcher`] trait.
//!
//! The cache manager never talks to a transport directly. Everything goes
//! through [`Fetcher`], so tests swap in a recording mock and the manager's
//! strategy logic is exercised without any real network.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// An outbound request, keyed by method + URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Request {
        Request {
            method: "GET".into(),
            url: url.into(),
        }
    }

    /// Cache key. Method is part of the key so a GET never shadows a POST.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A response body with enough envelope to replay it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}

impl Response {
    pub fn ok(content_type: impl Into<String>, body: impl Into<Bytes>) -> Response {
        Response {
            status: 200,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, content_type: impl Into<String>, body: impl Into<Bytes>) -> Response {
        Response {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Only 2xx responses are cacheable.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Transport-level failure. Distinct from an HTTP error status: a 404 is a
/// [`Response`], this is "the network never answered".
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request timed out")]
    TimedOut,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Network,
    Fallback,
}

/// A response plus its provenance. Callers that must not accept a
/// placeholder (e.g. the image loader) check `source`.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ServedFrom,
}

/// Abstraction over the actual transport.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
