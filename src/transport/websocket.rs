//! WebSocket transport as an ordered byte stream.
//!
//! # Responsibilities
//! - Upgrade to a WebSocket negotiating the `h2` sub-protocol
//! - Expose binary frames as `AsyncRead` / `AsyncWrite` so HTTP/2 can run on top
//!
//! # Data Flow
//! ```text
//! h2 codec ←── bytes ──→ WsByteStream ←── binary frames ──→ transport endpoint
//! ```
//!
//! # Design Decisions
//! - One write call becomes one binary frame
//! - Text, ping and pong frames carry no stream bytes and are skipped
//! - A close frame reads as EOF

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Buf, Bytes};
use futures_util::{Sink, Stream};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::transport::types::TransportError;

/// Sub-protocol carried over the WebSocket.
pub const H2_SUBPROTOCOL: &str = "h2";

/// Byte-stream view of a WebSocket connection.
pub struct WsByteStream<S> {
    inner: WebSocketStream<S>,
    pending: Bytes,
}

impl<S> WsByteStream<S> {
    pub fn new(inner: WebSocketStream<S>) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
        }
    }
}

/// Open a WebSocket to `url` and wrap it as a byte stream.
pub async fn connect(url: &Url) -> Result<WsByteStream<MaybeTlsStream<TcpStream>>, TransportError> {
    let mut request = url.as_str().into_client_request()?;
    request
        .headers_mut()
        .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(H2_SUBPROTOCOL));

    let (stream, response) = tokio_tungstenite::connect_async(request).await?;
    tracing::debug!(url = %url, status = %response.status(), "WebSocket transport upgraded");

    Ok(WsByteStream::new(stream))
}

fn to_io_error(e: tokio_tungstenite::tungstenite::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

impl<S> AsyncRead for WsByteStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            if !self.pending.is_empty() {
                let n = self.pending.len().min(buf.remaining());
                buf.put_slice(&self.pending[..n]);
                self.pending.advance(n);
                return Poll::Ready(Ok(()));
            }

            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(Message::Binary(data))) => self.pending = data,
                Some(Ok(Message::Close(_))) | None => return Poll::Ready(Ok(())),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Poll::Ready(Err(to_io_error(e))),
            }
        }
    }
}

impl<S> AsyncWrite for WsByteStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        ready!(Pin::new(&mut self.inner).poll_ready(cx)).map_err(to_io_error)?;
        Pin::new(&mut self.inner)
            .start_send(Message::Binary(Bytes::copy_from_slice(buf)))
            .map_err(to_io_error)?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx).map_err(to_io_error)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_close(cx).map_err(to_io_error)
    }
}
