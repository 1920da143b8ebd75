//! In-memory response cache.

use std::sync::Arc;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use http::Method;
use url::Url;

use crate::cache::{Cache, CacheError, CachedResponse, RequestInfo};
use crate::routing::origin::with_default_port;

/// Entry key: method plus URL normalized to an explicit port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    method: Method,
    url: String,
}

impl EntryKey {
    fn from_request(info: &RequestInfo) -> Result<Self, CacheError> {
        let url = Url::parse(&info.url).map_err(|e| CacheError::Rejected {
            url: info.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            method: info.method.clone(),
            url: with_default_port(&url),
        })
    }
}

/// A thread-safe cache of pushed responses, cloned cheaply.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<EntryKey, CachedResponse>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Cache for MemoryCache {
    fn put(&self, key: RequestInfo, response: CachedResponse) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move {
            let entry = EntryKey::from_request(&key)?;
            if !matches!(entry.method, Method::GET | Method::HEAD) {
                return Err(CacheError::Rejected {
                    url: key.url,
                    reason: format!("method {} is not cacheable", entry.method),
                });
            }
            tracing::debug!(url = %entry.url, bytes = response.body.len(), "Cached response");
            self.inner.insert(entry, response);
            Ok(())
        })
    }

    fn match_request<'a>(&'a self, key: &'a RequestInfo) -> BoxFuture<'a, Option<CachedResponse>> {
        Box::pin(async move {
            let entry = EntryKey::from_request(key).ok()?;
            self.inner.get(&entry).map(|r| r.value().clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_put_then_match() {
        let cache = MemoryCache::new();
        assert!(cache.match_request(&RequestInfo::get("http://a.com:80/x")).await.is_none());

        cache.put(RequestInfo::get("http://a.com:80/x"), response("hello")).await.unwrap();
        let hit = cache.match_request(&RequestInfo::get("http://a.com:80/x")).await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"hello"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_default_port_spellings_match() {
        let cache = MemoryCache::new();
        cache.put(RequestInfo::get("http://a.com/x"), response("v")).await.unwrap();
        assert!(cache.match_request(&RequestInfo::get("http://a.com:80/x")).await.is_some());
    }

    #[tokio::test]
    async fn test_rejects_uncacheable() {
        let cache = MemoryCache::new();
        let post = RequestInfo::new(Method::POST, "http://a.com/x", HeaderMap::new());
        assert!(cache.put(post, response("v")).await.is_err());
        assert!(cache.put(RequestInfo::get("not a url"), response("v")).await.is_err());
        assert!(cache.is_empty());
    }
}
