//! Supervised pull channel.
//!
//! # State Machine
//! ```text
//! Closed → Opening ──(transport answered)──→ Open
//!            ↑  │                              │
//!            │  └──(open failed)──┐            │ (finished / error / stream end)
//!            │                    ▼            ▼
//!            └───(after backoff)─── Failed ←───┘
//!
//! Shutdown from any state → Closed
//! Unsupported transport scheme → Closed (not retryable)
//! ```
//!
//! A successful open never triggers a reopen. Every reopen reuses the same
//! descriptor `Arc`, and starts only after the prior termination was observed.

use std::sync::Arc;
use arc_swap::ArcSwap;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::schema::PushSettings;
use crate::lifecycle::ShutdownSignal;
use crate::observability::{metrics, DebugFlag};
use crate::push::handler::PushPromiseHandler;
use crate::push::types::{
    ChannelEvent, ChannelEvents, ChannelState, PullOpener, PushChannelDescriptor, Termination,
};
use crate::resilience::ReconnectBackoff;

/// A pull channel that keeps itself open for the life of the process.
pub struct PushChannel {
    descriptor: Arc<PushChannelDescriptor>,
    opener: Arc<dyn PullOpener>,
    handler: PushPromiseHandler,
    settings: Arc<ArcSwap<PushSettings>>,
    debug: DebugFlag,
    state: watch::Sender<ChannelState>,
}

/// Observer side of a spawned [`PushChannel`].
#[derive(Debug)]
pub struct PushChannelHandle {
    descriptor: Arc<PushChannelDescriptor>,
    state: watch::Receiver<ChannelState>,
    task: JoinHandle<()>,
}

impl PushChannelHandle {
    pub fn descriptor(&self) -> &PushChannelDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Receiver for state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl PushChannel {
    pub fn new(
        descriptor: PushChannelDescriptor,
        opener: Arc<dyn PullOpener>,
        handler: PushPromiseHandler,
        settings: Arc<ArcSwap<PushSettings>>,
        debug: DebugFlag,
    ) -> Self {
        let (state, _) = watch::channel(ChannelState::Closed);
        Self {
            descriptor: Arc::new(descriptor),
            opener,
            handler,
            settings,
            debug,
            state,
        }
    }

    /// Start supervising on a background task.
    pub fn spawn(self, mut shutdown: ShutdownSignal) -> PushChannelHandle {
        let descriptor = Arc::clone(&self.descriptor);
        let state = self.state.subscribe();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = self.supervise() => {}
                _ = shutdown.recv() => {
                    tracing::debug!(channel = %self.descriptor, "Push channel stopping for shutdown");
                }
            }
            self.state.send_replace(ChannelState::Closed);
        });

        PushChannelHandle {
            descriptor,
            state,
            task,
        }
    }

    async fn supervise(&self) {
        let mut backoff = ReconnectBackoff::new();

        loop {
            self.state.send_replace(ChannelState::Opening);
            if self.debug.is_enabled() {
                tracing::info!(channel = %self.descriptor, "Opening h2 channel for pushing");
            }

            let termination = match self.opener.open(&self.descriptor).await {
                Ok(events) => {
                    self.state.send_replace(ChannelState::Open);
                    backoff.reset();
                    if self.debug.is_enabled() {
                        tracing::info!(channel = %self.descriptor, "Push channel opened");
                    }
                    self.listen(events).await
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!(channel = %self.descriptor, error = %e, "Push channel cannot be opened");
                    return;
                }
                Err(e) => Termination::Error(e.to_string()),
            };

            self.state.send_replace(ChannelState::Failed);

            let delay = {
                let settings = self.settings.load();
                backoff.next_delay(settings.base_delay_ms, settings.max_delay_ms)
            };
            tracing::warn!(
                channel = %self.descriptor,
                transport = %self.descriptor.transport_url,
                reason = %termination,
                delay = ?delay,
                "Pull stream closed, reopening"
            );
            metrics::record_channel_reopen();
            tokio::time::sleep(delay).await;
        }
    }

    /// Forward pushes until the channel terminates.
    async fn listen(&self, mut events: ChannelEvents) -> Termination {
        while let Some(event) = events.next().await {
            match event {
                ChannelEvent::Push(resource) => {
                    self.handler
                        .dispatch(resource, Some(self.descriptor.origin.clone()));
                }
                ChannelEvent::Closed(termination) => return termination,
            }
        }
        Termination::Finished
    }
}
