//! Byte-stream establishment per transport scheme.

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use url::Url;

use crate::transport::types::{TransportError, TransportScheme};
use crate::transport::websocket;

/// An ordered, bidirectional byte stream a transport runs on.
pub trait TransportIo: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> TransportIo for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

pub type BoxedIo = Box<dyn TransportIo>;

/// Opens the raw byte stream for a transport URL.
pub trait Connector: Send + Sync + 'static {
    fn connect<'a>(
        &'a self,
        url: &'a Url,
        scheme: TransportScheme,
    ) -> BoxFuture<'a, Result<BoxedIo, TransportError>>;
}

/// Connector for `ws://`, `wss://` and `tcp://` transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConnector;

impl DefaultConnector {
    async fn connect_tcp(url: &Url) -> Result<BoxedIo, TransportError> {
        let host = url.host_str().ok_or_else(|| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        })?;
        let port = url.port().ok_or_else(|| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: "tcp transport requires an explicit port".to_string(),
        })?;

        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::Connect {
                url: url.to_string(),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        Ok(Box::new(stream))
    }
}

impl Connector for DefaultConnector {
    fn connect<'a>(
        &'a self,
        url: &'a Url,
        scheme: TransportScheme,
    ) -> BoxFuture<'a, Result<BoxedIo, TransportError>> {
        Box::pin(async move {
            match scheme {
                TransportScheme::Tcp => Self::connect_tcp(url).await,
                TransportScheme::WebSocket | TransportScheme::SecureWebSocket => {
                    let stream = websocket::connect(url).await?;
                    Ok(Box::new(stream) as BoxedIo)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_requires_port() {
        let url = Url::parse("tcp://localhost").unwrap();
        let err = DefaultConnector
            .connect(&url, TransportScheme::Tcp)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_tcp_connects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = Url::parse(&format!("tcp://{}", addr)).unwrap();

        let accept = tokio::spawn(async move { listener.accept().await.is_ok() });
        assert!(DefaultConnector.connect(&url, TransportScheme::Tcp).await.is_ok());
        assert!(accept.await.unwrap());
    }
}
