//! Live transport connection handle.
//!
//! # Responsibilities
//! - Give each opened transport a unique ID for tracing
//! - Drive the HTTP/2 connection in a background task
//! - Report writability: false once the driver task has ended

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use bytes::Bytes;
use h2::client::{Connection, SendRequest};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::transport::types::TransportScheme;

/// Only uniqueness matters here, so relaxed ordering is enough.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transport-{}", self.0)
    }
}

/// An open multiplexed connection to one transport URL.
///
/// Never mutated after creation; the registry replaces it once it stops
/// being writable.
#[derive(Debug)]
pub struct TransportConnection {
    id: ConnectionId,
    url: String,
    scheme: TransportScheme,
    sender: SendRequest<Bytes>,
    open: Arc<AtomicBool>,
}

impl TransportConnection {
    /// Wrap a completed HTTP/2 handshake and spawn its connection driver.
    pub fn spawn<T>(
        url: impl Into<String>,
        scheme: TransportScheme,
        sender: SendRequest<Bytes>,
        connection: Connection<T, Bytes>,
    ) -> Arc<Self>
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let id = ConnectionId::new();
        let url = url.into();
        let open = Arc::new(AtomicBool::new(true));

        let driver_open = Arc::clone(&open);
        let driver_url = url.clone();
        tokio::spawn(async move {
            match connection.await {
                Ok(()) => tracing::debug!(connection_id = %id, url = %driver_url, "Transport closed"),
                Err(e) => tracing::warn!(connection_id = %id, url = %driver_url, error = %e, "Transport failed"),
            }
            driver_open.store(false, Ordering::SeqCst);
        });

        Arc::new(Self {
            id,
            url,
            scheme,
            sender,
            open,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> TransportScheme {
        self.scheme
    }

    /// Whether new streams can still be opened on this connection.
    pub fn is_writable(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// A handle for opening a new request stream.
    pub fn send_request(&self) -> SendRequest<Bytes> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("transport-"));
    }
}
