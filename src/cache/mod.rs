//! Cache collaborator.
//!
//! # Data Flow
//! ```text
//! PushPromiseHandler
//!     → Cache::put(RequestInfo, CachedResponse)
//!
//! Application lookup:
//!     → Cache::match_request(RequestInfo) → Some(CachedResponse) | None
//! ```
//!
//! # Design Decisions
//! - The cache is a trait so applications can plug in their own storage
//! - `memory.rs` is the default; eviction and Vary matching are out of its scope

pub mod memory;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

pub use memory::MemoryCache;

/// Identity of a cached request: method, absolute URL and request headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInfo {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

impl RequestInfo {
    pub fn new(method: Method, url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            url: url.into(),
            headers,
        }
    }

    /// GET request with no headers, the common lookup shape.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url, HeaderMap::new())
    }
}

/// A fully received response ready to be served from cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Cache submission failures.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache declined to store the entry.
    #[error("Cache rejected {url}: {reason}")]
    Rejected { url: String, reason: String },
}

/// Storage for pushed responses.
pub trait Cache: Send + Sync + 'static {
    fn put(&self, key: RequestInfo, response: CachedResponse) -> BoxFuture<'_, Result<(), CacheError>>;

    fn match_request<'a>(&'a self, key: &'a RequestInfo) -> BoxFuture<'a, Option<CachedResponse>>;
}
