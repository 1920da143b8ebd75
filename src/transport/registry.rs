//! One shared connection per transport URL.
//!
//! # Responsibilities
//! - Reject unsupported schemes before any I/O
//! - Hand back the existing connection while it is writable
//! - Otherwise connect, run the HTTP/2 handshake and replace the entry
//!
//! # Design Decisions
//! - Each URL has its own slot lock: concurrent callers for one URL share a
//!   single connect, while a stalled connect never blocks other URLs
//! - Connect plus handshake is bounded by a timeout, reported as retryable
//! - No retries here; the caller (a push channel) owns recovery

use std::sync::Arc;
use std::time::Duration;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::observability::{metrics, DebugFlag};
use crate::transport::connection::TransportConnection;
use crate::transport::connector::{Connector, DefaultConnector};
use crate::transport::types::{parse_transport_url, TransportError};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Slot = Arc<Mutex<Option<Arc<TransportConnection>>>>;

/// Owns every open transport connection, keyed by transport URL.
pub struct TransportRegistry {
    connector: Arc<dyn Connector>,
    slots: DashMap<String, Slot>,
    connect_timeout: Duration,
    debug: DebugFlag,
}

impl TransportRegistry {
    /// Registry using the default ws/wss/tcp connector.
    pub fn new(debug: DebugFlag) -> Self {
        Self::with_connector(Arc::new(DefaultConnector), debug)
    }

    pub fn with_connector(connector: Arc<dyn Connector>, debug: DebugFlag) -> Self {
        Self {
            connector,
            slots: DashMap::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            debug,
        }
    }

    /// Bound on connect plus HTTP/2 handshake.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Get a writable connection for `url`, opening one if needed.
    pub async fn acquire(&self, url: &str) -> Result<Arc<TransportConnection>, TransportError> {
        let (parsed, scheme) = parse_transport_url(url)?;

        // Clone the slot out so no map shard lock is held across an await.
        let slot: Slot = Arc::clone(self.slots.entry(url.to_string()).or_default().value());
        let mut current = slot.lock().await;

        if let Some(existing) = current.as_ref() {
            if existing.is_writable() {
                return Ok(Arc::clone(existing));
            }
            tracing::debug!(url = %url, connection_id = %existing.id(), "Replacing closed transport");
        }

        if self.debug.is_enabled() {
            tracing::info!(url = %url, "Opening transport");
        }

        let handshake = async {
            let io = self.connector.connect(&parsed, scheme).await?;
            let parts = h2::client::Builder::new()
                .enable_push(true)
                .handshake::<_, Bytes>(io)
                .await?;
            Ok::<_, TransportError>(parts)
        };
        let (sender, connection) = tokio::time::timeout(self.connect_timeout, handshake)
            .await
            .map_err(|_| TransportError::Timeout {
                url: url.to_string(),
                after: self.connect_timeout,
            })??;

        let transport = TransportConnection::spawn(url, scheme, sender, connection);
        *current = Some(Arc::clone(&transport));
        metrics::record_transport_opened(scheme.as_str());

        tracing::debug!(url = %url, connection_id = %transport.id(), "Transport ready");
        Ok(transport)
    }

    /// Number of URLs that currently hold a connection, writable or not.
    pub async fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.iter().map(|s| Arc::clone(s.value())).collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }
}

impl std::fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("urls", &self.slots.len())
            .field("connect_timeout", &self.connect_timeout)
            .field("debug", &self.debug.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use futures_util::future::BoxFuture;
    use tokio::io::DuplexStream;
    use url::Url;

    use crate::transport::connector::BoxedIo;
    use crate::transport::types::TransportScheme;

    /// Hands out in-memory streams and keeps the far ends alive until told otherwise.
    /// Connects to `stalled_host` never complete.
    #[derive(Default)]
    struct DuplexConnector {
        connects: AtomicUsize,
        peers: std::sync::Mutex<Vec<DuplexStream>>,
        stalled_host: Option<&'static str>,
    }

    impl DuplexConnector {
        fn hang_up(&self) {
            self.peers.lock().unwrap().clear();
        }
    }

    impl Connector for DuplexConnector {
        fn connect<'a>(
            &'a self,
            url: &'a Url,
            _scheme: TransportScheme,
        ) -> BoxFuture<'a, Result<BoxedIo, TransportError>> {
            Box::pin(async move {
                self.connects.fetch_add(1, Ordering::SeqCst);
                if url.host_str().is_some() && url.host_str() == self.stalled_host {
                    return std::future::pending().await;
                }
                let (client, server) = tokio::io::duplex(64 * 1024);
                self.peers.lock().unwrap().push(server);
                Ok(Box::new(client) as BoxedIo)
            })
        }
    }

    #[tokio::test]
    async fn test_acquire_reuses_writable_connection() {
        let connector = Arc::new(DuplexConnector::default());
        let registry = TransportRegistry::with_connector(connector.clone(), DebugFlag::new(true));

        let first = registry.acquire("ws://localhost:8081/transport").await.unwrap();
        let second = registry.acquire("ws://localhost:8081/transport").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), second.id());
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_urls_get_distinct_connections() {
        let connector = Arc::new(DuplexConnector::default());
        let registry = TransportRegistry::with_connector(connector.clone(), DebugFlag::default());

        let a = registry.acquire("tcp://localhost:9001").await.unwrap();
        let b = registry.acquire("tcp://localhost:9002").await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsupported_scheme_never_connects() {
        let connector = Arc::new(DuplexConnector::default());
        let registry = TransportRegistry::with_connector(connector.clone(), DebugFlag::default());

        let err = registry.acquire("http://localhost:8080").await.unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme { .. }));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unwritable_connection_is_replaced() {
        let connector = Arc::new(DuplexConnector::default());
        let registry = TransportRegistry::with_connector(connector.clone(), DebugFlag::default());

        let first = registry.acquire("tcp://localhost:9003").await.unwrap();
        connector.hang_up();

        for _ in 0..100 {
            if !first.is_writable() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!first.is_writable());

        let second = registry.acquire("tcp://localhost:9003").await.unwrap();
        assert_ne!(first.id(), second.id());
        assert!(second.is_writable());
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stalled_url_does_not_block_others() {
        let connector = Arc::new(DuplexConnector {
            stalled_host: Some("stalled"),
            ..Default::default()
        });
        let registry = Arc::new(TransportRegistry::with_connector(connector.clone(), DebugFlag::default()));

        let stalled = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.acquire("tcp://stalled:1").await })
        };
        while connector.connects.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let other = tokio::time::timeout(Duration::from_secs(2), registry.acquire("tcp://healthy:2"))
            .await
            .expect("blocked behind the stalled URL")
            .unwrap();
        assert!(other.is_writable());
        assert!(!stalled.is_finished());
        stalled.abort();
    }

    #[tokio::test]
    async fn test_stalled_connect_times_out() {
        let connector = Arc::new(DuplexConnector {
            stalled_host: Some("stalled"),
            ..Default::default()
        });
        let registry = TransportRegistry::with_connector(connector, DebugFlag::default())
            .with_connect_timeout(Duration::from_millis(50));

        let err = registry.acquire("tcp://stalled:1").await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }));
        assert!(err.is_retryable());
        assert_eq!(registry.len().await, 0);
    }
}
