//! Transport scheme parsing and error definitions.

use thiserror::Error;
use url::Url;

/// Errors raised while acquiring a transport connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport URL could not be parsed or lacks a required part.
    #[error("Invalid transport URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The URL scheme is neither websocket-family nor raw stream.
    #[error("Unrecognized transport protocol: {scheme}, for transport: {url}")]
    UnsupportedScheme { scheme: String, url: String },

    /// Opening the underlying socket failed.
    #[error("Connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Connect plus handshake did not finish in time.
    #[error("Connection to {url} timed out after {after:?}")]
    Timeout { url: String, after: std::time::Duration },

    /// WebSocket upgrade failed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// HTTP/2 handshake or stream error.
    #[error("HTTP/2 error: {0}")]
    Http2(#[from] h2::Error),

    /// Building the pull request failed.
    #[error("Invalid request: {0}")]
    Request(#[from] http::Error),
}

impl TransportError {
    /// Whether retrying the same URL can ever succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TransportError::InvalidUrl { .. } | TransportError::UnsupportedScheme { .. }
        )
    }
}

/// Supported transport families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportScheme {
    /// `ws://`
    WebSocket,
    /// `wss://`
    SecureWebSocket,
    /// `tcp://`
    Tcp,
}

impl TransportScheme {
    /// Classify a parsed transport URL.
    pub fn from_url(url: &Url) -> Result<Self, TransportError> {
        match url.scheme() {
            "ws" => Ok(Self::WebSocket),
            "wss" => Ok(Self::SecureWebSocket),
            "tcp" => Ok(Self::Tcp),
            other => Err(TransportError::UnsupportedScheme {
                scheme: format!("{}:", other),
                url: url.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSocket => "ws",
            Self::SecureWebSocket => "wss",
            Self::Tcp => "tcp",
        }
    }

    pub fn is_websocket(&self) -> bool {
        matches!(self, Self::WebSocket | Self::SecureWebSocket)
    }
}

/// Parse a transport URL string and classify its scheme.
pub fn parse_transport_url(raw: &str) -> Result<(Url, TransportScheme), TransportError> {
    let url = Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    let scheme = TransportScheme::from_url(&url)?;
    if scheme == TransportScheme::Tcp && url.port().is_none() {
        return Err(TransportError::InvalidUrl {
            url: raw.to_string(),
            reason: "tcp transport requires an explicit port".to_string(),
        });
    }
    Ok((url, scheme))
}
