//! Push channel data types.

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::transport::TransportError;

/// Identity of one pull channel. Shared unchanged across every reopen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PushChannelDescriptor {
    /// Host of the configured origin.
    pub hostname: String,
    /// Resolved port of the configured origin.
    pub port: u16,
    /// Path of the pull request on the transport.
    pub path: String,
    /// Transport carrying the pull request.
    pub transport_url: String,
    /// Origin pushed resources are cached under.
    pub origin: String,
}

impl std::fmt::Display for PushChannelDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}{}", self.hostname, self.port, self.path)
    }
}

/// Errors on an individual pushed resource.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("push stream error: {0}")]
    Http2(#[from] h2::Error),

    #[error("push stream error: {0}")]
    Stream(String),
}

pub type PushBody = BoxStream<'static, Result<Bytes, PushError>>;

/// A promised resource: the promised request and its eventual response.
pub struct PushedResource {
    pub request: http::Request<()>,
    pub response: BoxFuture<'static, Result<http::Response<PushBody>, PushError>>,
}

impl std::fmt::Debug for PushedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushedResource")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .finish()
    }
}

/// Why a pull channel stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The pull response ended normally.
    Finished,
    /// The pull stream or its connection failed.
    Error(String),
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Finished => write!(f, "finished"),
            Termination::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// Events delivered by an open pull channel, in transport order.
#[derive(Debug)]
pub enum ChannelEvent {
    Push(PushedResource),
    Closed(Termination),
}

pub type ChannelEvents = BoxStream<'static, ChannelEvent>;

/// Pull channel lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not started, or stopped for good.
    Closed,
    /// Acquiring a transport and sending the pull request.
    Opening,
    /// The transport answered; listening for push promises.
    Open,
    /// Terminated; waiting out the backoff before reopening.
    Failed,
}

/// Issues the long-lived pull request for a descriptor.
pub trait PullOpener: Send + Sync + 'static {
    /// Resolves once the transport has answered the pull request.
    fn open<'a>(
        &'a self,
        descriptor: &'a PushChannelDescriptor,
    ) -> BoxFuture<'a, Result<ChannelEvents, TransportError>>;
}
