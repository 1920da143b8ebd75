//! Pushed resource accumulation and cache submission.
//!
//! # Responsibilities
//! - Resolve the absolute URL of a promised resource
//! - Concatenate body chunks in arrival order
//! - Submit (request info, response) to the cache once the body ends
//!
//! # Design Decisions
//! - Failures are logged and contained; they never reach the owning channel
//! - No body size limit is enforced at this layer
//! - No "already cached?" check before accepting a push: cache population
//!   can race with promise arrival, so a lookup here would be unreliable

use std::sync::Arc;
use bytes::BytesMut;
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::cache::{Cache, CachedResponse, RequestInfo};
use crate::observability::{metrics, DebugFlag};
use crate::push::types::PushedResource;
use crate::routing::origin::origin_from_request;

/// Final disposition of one pushed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Stored in the cache.
    Cached,
    /// Fully received but the cache declined it.
    CacheRejected,
    /// The pushed stream failed before completing.
    StreamFailed,
    /// No origin was supplied and none could be derived.
    NoOrigin,
}

/// Turns push promises into cache entries.
#[derive(Clone)]
pub struct PushPromiseHandler {
    cache: Arc<dyn Cache>,
    debug: DebugFlag,
}

impl PushPromiseHandler {
    pub fn new(cache: Arc<dyn Cache>, debug: DebugFlag) -> Self {
        Self { cache, debug }
    }

    /// Handle a push on its own task so the channel keeps reading events.
    pub fn dispatch(&self, resource: PushedResource, origin: Option<String>) -> JoinHandle<PushOutcome> {
        let handler = self.clone();
        tokio::spawn(async move { handler.handle(resource, origin.as_deref()).await })
    }

    /// Receive the pushed response and hand it to the cache.
    pub async fn handle(&self, resource: PushedResource, origin: Option<&str>) -> PushOutcome {
        metrics::record_push_promise();

        let PushedResource { request, response } = resource;
        let (parts, ()) = request.into_parts();

        let origin = match origin {
            Some(origin) => origin.to_string(),
            None => match origin_from_request(&parts.uri, &parts.headers) {
                Some(origin) => origin,
                None => {
                    tracing::warn!(uri = %parts.uri, "Push promise without a resolvable origin");
                    return PushOutcome::NoOrigin;
                }
            },
        };
        let path = parts.uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        let href = format!("{}{}", origin, path);

        if self.debug.is_enabled() {
            tracing::info!(href = %href, "Received push promise");
        }

        let response = match response.await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(href = %href, error = %e, "Server push stream error");
                return PushOutcome::StreamFailed;
            }
        };
        let (head, mut body) = response.into_parts();

        let mut data = BytesMut::new();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(chunk) => data.extend_from_slice(&chunk),
                Err(e) => {
                    tracing::warn!(href = %href, error = %e, "Server push stream error");
                    return PushOutcome::StreamFailed;
                }
            }
        }

        let key = RequestInfo::new(parts.method, href, parts.headers);
        let cached = CachedResponse {
            status: head.status,
            headers: head.headers,
            body: data.freeze(),
        };

        match self.cache.put(key, cached).await {
            Ok(()) => {
                metrics::record_cache_put("stored");
                PushOutcome::Cached
            }
            Err(e) => {
                tracing::debug!(error = %e, "Pushed resource not cached");
                metrics::record_cache_put("rejected");
                PushOutcome::CacheRejected
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::future::BoxFuture;
    use futures_util::{stream, FutureExt};
    use http::{Method, StatusCode};
    use std::sync::Mutex;

    use crate::cache::CacheError;
    use crate::push::types::PushError;

    /// Records every put; optionally refuses them.
    #[derive(Default)]
    pub(crate) struct RecordingCache {
        pub puts: Mutex<Vec<(RequestInfo, CachedResponse)>>,
        pub reject: bool,
    }

    impl Cache for RecordingCache {
        fn put(&self, key: RequestInfo, response: CachedResponse) -> BoxFuture<'_, Result<(), CacheError>> {
            Box::pin(async move {
                if self.reject {
                    return Err(CacheError::Rejected {
                        url: key.url,
                        reason: "full".into(),
                    });
                }
                self.puts.lock().unwrap().push((key, response));
                Ok(())
            })
        }

        fn match_request<'a>(&'a self, _key: &'a RequestInfo) -> BoxFuture<'a, Option<CachedResponse>> {
            Box::pin(async { None })
        }
    }

    pub(crate) fn pushed(uri: &str, chunks: Vec<Result<&'static str, &'static str>>) -> PushedResource {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("accept", "text/css")
            .body(())
            .unwrap();
        let body: Vec<Result<Bytes, PushError>> = chunks
            .into_iter()
            .map(|c| {
                c.map(|s| Bytes::from_static(s.as_bytes()))
                    .map_err(|e| PushError::Stream(e.into()))
            })
            .collect();
        let response = async move {
            Ok::<_, PushError>(http::Response::builder()
                .status(StatusCode::OK)
                .body(stream::iter(body).boxed())
                .unwrap())
        }
        .boxed();
        PushedResource { request, response }
    }

    #[tokio::test]
    async fn test_chunks_concatenated_into_one_put() {
        let cache = Arc::new(RecordingCache::default());
        let handler = PushPromiseHandler::new(cache.clone(), DebugFlag::new(true));

        let resource = pushed("/style.css", vec![Ok("ab"), Ok("cd"), Ok("ef")]);
        let outcome = handler.handle(resource, Some("http://localhost:8080")).await;

        assert_eq!(outcome, PushOutcome::Cached);
        let puts = cache.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        let (key, response) = &puts[0];
        assert_eq!(key.method, Method::GET);
        assert_eq!(key.url, "http://localhost:8080/style.css");
        assert_eq!(key.headers.get("accept").unwrap(), "text/css");
        assert_eq!(response.body, Bytes::from_static(b"abcdef"));
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_origin_derived_from_request_when_missing() {
        let cache = Arc::new(RecordingCache::default());
        let handler = PushPromiseHandler::new(cache.clone(), DebugFlag::default());

        let resource = pushed("http://localhost:7080/app.js?v=2", vec![Ok("x")]);
        assert_eq!(handler.handle(resource, None).await, PushOutcome::Cached);

        let puts = cache.puts.lock().unwrap();
        assert_eq!(puts[0].0.url, "http://localhost:7080/app.js?v=2");
    }

    #[tokio::test]
    async fn test_stream_error_is_contained() {
        let cache = Arc::new(RecordingCache::default());
        let handler = PushPromiseHandler::new(cache.clone(), DebugFlag::default());

        let resource = pushed("/broken", vec![Ok("ab"), Err("reset")]);
        let outcome = handler.handle(resource, Some("http://localhost:8080")).await;

        assert_eq!(outcome, PushOutcome::StreamFailed);
        assert!(cache.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_rejection_is_swallowed() {
        let cache = Arc::new(RecordingCache {
            reject: true,
            ..Default::default()
        });
        let handler = PushPromiseHandler::new(cache, DebugFlag::default());

        let resource = pushed("/a", vec![Ok("a")]);
        let outcome = handler.dispatch(resource, Some("http://localhost:8080".into())).await.unwrap();
        assert_eq!(outcome, PushOutcome::CacheRejected);
    }

    #[tokio::test]
    async fn test_no_origin_at_all() {
        let cache = Arc::new(RecordingCache::default());
        let handler = PushPromiseHandler::new(cache.clone(), DebugFlag::default());

        let resource = pushed("/orphan", vec![Ok("a")]);
        assert_eq!(handler.handle(resource, None).await, PushOutcome::NoOrigin);
        assert!(cache.puts.lock().unwrap().is_empty());
    }
}
