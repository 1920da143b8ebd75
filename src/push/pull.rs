//! HTTP/2 pull request over a registry transport.
//!
//! # Data Flow
//! ```text
//! descriptor
//!     → TransportRegistry::acquire(transport URL)
//!     → GET <path> (end of stream) on a new h2 stream
//!     → response headers received            ⇒ channel Open
//!     → PUSH_PROMISE frames                  ⇒ ChannelEvent::Push
//!     → pull response body ends / errors     ⇒ ChannelEvent::Closed
//! ```

use std::sync::Arc;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use h2::client::{PushPromise, PushPromises};
use h2::RecvStream;

use crate::push::types::{
    ChannelEvent, ChannelEvents, PullOpener, PushBody, PushChannelDescriptor, PushError,
    PushedResource, Termination,
};
use crate::routing::origin::resolve_port;
use crate::transport::{parse_transport_url, TransportError, TransportRegistry};

/// Opens pull channels as HTTP/2 requests on shared transports.
#[derive(Debug, Clone)]
pub struct H2PullOpener {
    registry: Arc<TransportRegistry>,
}

impl H2PullOpener {
    pub fn new(registry: Arc<TransportRegistry>) -> Self {
        Self { registry }
    }
}

impl PullOpener for H2PullOpener {
    fn open<'a>(
        &'a self,
        descriptor: &'a PushChannelDescriptor,
    ) -> BoxFuture<'a, Result<ChannelEvents, TransportError>> {
        Box::pin(async move {
            let (transport_url, _) = parse_transport_url(&descriptor.transport_url)?;
            let transport = self.registry.acquire(&descriptor.transport_url).await?;

            let uri = format!(
                "http://{}:{}{}",
                transport_url.host_str().unwrap_or("localhost"),
                resolve_port(&transport_url),
                descriptor.path
            );
            let request = http::Request::get(uri).body(())?;

            let mut sender = transport.send_request().ready().await?;
            let (mut response, _) = sender.send_request(request, true)?;
            let pushes = response.push_promises();
            let response = response.await?;

            tracing::debug!(
                channel = %descriptor,
                connection_id = %transport.id(),
                status = %response.status(),
                "Pull request answered"
            );

            Ok(pull_events(pushes, response.into_body()))
        })
    }
}

struct PullState {
    pushes: Option<PushPromises>,
    body: Option<RecvStream>,
}

async fn next_push(pushes: &mut Option<PushPromises>) -> Option<Result<PushPromise, h2::Error>> {
    match pushes {
        Some(pushes) => pushes.push_promise().await,
        None => std::future::pending().await,
    }
}

/// Next pull-body chunk length; the pull body itself carries nothing we keep.
async fn next_chunk(body: &mut Option<RecvStream>) -> Option<Result<usize, h2::Error>> {
    let Some(stream) = body else {
        return std::future::pending().await;
    };
    let chunk = stream.data().await?;
    Some(chunk.map(|data| {
        let _ = stream.flow_control().release_capacity(data.len());
        data.len()
    }))
}

fn pull_events(pushes: PushPromises, body: RecvStream) -> ChannelEvents {
    let state = PullState {
        pushes: Some(pushes),
        body: Some(body),
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            if state.pushes.is_none() && state.body.is_none() {
                return Some((ChannelEvent::Closed(Termination::Finished), None));
            }

            // Promises precede the end of the pull body on the wire, so they win ties.
            tokio::select! {
                biased;

                push = next_push(&mut state.pushes) => match push {
                    Some(Ok(promise)) => {
                        return Some((ChannelEvent::Push(pushed_resource(promise)), Some(state)));
                    }
                    Some(Err(e)) => {
                        return Some((ChannelEvent::Closed(Termination::Error(e.to_string())), None));
                    }
                    None => state.pushes = None,
                },
                chunk = next_chunk(&mut state.body) => match chunk {
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Some((ChannelEvent::Closed(Termination::Error(e.to_string())), None));
                    }
                    None => {
                        return Some((ChannelEvent::Closed(Termination::Finished), None));
                    }
                },
            }
        }
    })
    .boxed()
}

fn pushed_resource(promise: PushPromise) -> PushedResource {
    let (request, response) = promise.into_parts();
    let response = async move {
        let response = response.await?;
        let (head, body) = response.into_parts();
        Ok::<_, PushError>(http::Response::from_parts(head, recv_body(body)))
    }
    .boxed();

    PushedResource { request, response }
}

fn recv_body(body: RecvStream) -> PushBody {
    stream::unfold(body, |mut body| async move {
        let chunk = body.data().await?;
        let chunk: Result<Bytes, PushError> = match chunk {
            Ok(data) => {
                let _ = body.flow_control().release_capacity(data.len());
                Ok(data)
            }
            Err(e) => Err(e.into()),
        };
        Some((chunk, body))
    })
    .boxed()
}
