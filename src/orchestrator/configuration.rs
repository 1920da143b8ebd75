//! Configuration orchestrator.
//!
//! # Responsibilities
//! - Accept batches of descriptor URLs and inline descriptors
//! - Fetch remote descriptors concurrently
//! - Record origin → transport routes (last write wins)
//! - Start one push channel per descriptor that names a push path
//! - Report `Completed` each time all in-flight work has drained
//!
//! # Design Decisions
//! - A batch holds its own guard while elements are dispatched, so a batch
//!   signals `Completed` once even when every element finishes synchronously
//! - Failures of one element are broadcast as `ConfigEvent::Failed` and never
//!   abort sibling elements

use std::sync::{Arc, Mutex};
use std::time::Duration;
use arc_swap::ArcSwap;
use serde_json::Value;
use tokio::sync::broadcast;
use url::Url;

use crate::cache::{Cache, MemoryCache};
use crate::config::descriptor::ConfigurationDescriptor;
use crate::config::fetch::{ConfigFetcher, HttpFetcher};
use crate::config::schema::{PushSettings, RuntimeConfig};
use crate::lifecycle::Shutdown;
use crate::observability::DebugFlag;
use crate::orchestrator::tracker::ActivityTracker;
use crate::orchestrator::types::{ConfigError, ConfigEvent, ConfigSource};
use crate::push::{
    ChannelState, H2PullOpener, PullOpener, PushChannel, PushChannelDescriptor, PushChannelHandle,
    PushPromiseHandler,
};
use crate::routing::{get_origin, resolve_port, ProxyRoutingTable};
use crate::transport::{parse_transport_url, TransportConnection, TransportError, TransportRegistry};

const EVENT_CAPACITY: usize = 64;

/// Entry point for configuring transports, routes and push channels.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Configuration {
    inner: Arc<Inner>,
}

struct Inner {
    routes: ProxyRoutingTable,
    registry: Arc<TransportRegistry>,
    cache: Arc<dyn Cache>,
    fetcher: Arc<dyn ConfigFetcher>,
    opener: Arc<dyn PullOpener>,
    handler: PushPromiseHandler,
    settings: Arc<ArcSwap<PushSettings>>,
    tracker: ActivityTracker,
    events: broadcast::Sender<ConfigEvent>,
    debug: DebugFlag,
    shutdown: Shutdown,
    channels: Mutex<Vec<PushChannelHandle>>,
}

/// Builder for [`Configuration`]. Unset collaborators fall back to
/// [`MemoryCache`], [`HttpFetcher`] and [`H2PullOpener`].
pub struct ConfigurationBuilder {
    debug: bool,
    push: PushSettings,
    fetch_timeout: Duration,
    cache: Option<Arc<dyn Cache>>,
    fetcher: Option<Arc<dyn ConfigFetcher>>,
    opener: Option<Arc<dyn PullOpener>>,
    registry: Option<Arc<TransportRegistry>>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            debug: false,
            push: PushSettings::default(),
            fetch_timeout: Duration::from_secs(30),
            cache: None,
            fetcher: None,
            opener: None,
            registry: None,
        }
    }
}

impl ConfigurationBuilder {
    /// Take debug, backoff and fetch timeout from a loaded settings file.
    pub fn runtime(mut self, config: &RuntimeConfig) -> Self {
        self.debug = config.debug;
        self.push = config.push.clone();
        self.fetch_timeout = Duration::from_secs(config.fetch.timeout_secs);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn push_settings(mut self, settings: PushSettings) -> Self {
        self.push = settings;
        self
    }

    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ConfigFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn opener(mut self, opener: Arc<dyn PullOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn registry(mut self, registry: Arc<TransportRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Configuration {
        let debug = DebugFlag::new(self.debug);
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(TransportRegistry::new(debug.clone())));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()) as Arc<dyn Cache>);
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpFetcher::new(self.fetch_timeout)) as Arc<dyn ConfigFetcher>);
        let opener = self
            .opener
            .unwrap_or_else(|| Arc::new(H2PullOpener::new(Arc::clone(&registry))) as Arc<dyn PullOpener>);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Configuration {
            inner: Arc::new(Inner {
                routes: ProxyRoutingTable::new(),
                registry,
                handler: PushPromiseHandler::new(Arc::clone(&cache), debug.clone()),
                cache,
                fetcher,
                opener,
                settings: Arc::new(ArcSwap::from_pointee(self.push)),
                tracker: ActivityTracker::new(events.clone()),
                events,
                debug,
                shutdown: Shutdown::new(),
                channels: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Configuration with every default collaborator.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Subscribe to `Completed` and `Failed` notifications.
    ///
    /// Only events sent after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.inner.events.subscribe()
    }

    /// True while any configuration work is in flight.
    pub fn is_configuring(&self) -> bool {
        self.inner.tracker.is_configuring()
    }

    pub fn debug(&self) -> bool {
        self.inner.debug.is_enabled()
    }

    pub fn cache(&self) -> Arc<dyn Cache> {
        Arc::clone(&self.inner.cache)
    }

    pub fn routes(&self) -> &ProxyRoutingTable {
        &self.inner.routes
    }

    /// Transport URL configured for an origin.
    pub fn transport_url(&self, origin: &str) -> Option<String> {
        self.inner.routes.get_route(origin)
    }

    /// Shared connection for a transport URL, opened on first use.
    pub async fn transport(&self, url: &str) -> Result<Arc<TransportConnection>, TransportError> {
        self.inner.registry.acquire(url).await
    }

    /// Replace backoff settings. Running channels pick them up on their next delay.
    pub fn update_settings(&self, settings: PushSettings) {
        tracing::info!(
            base_delay_ms = settings.base_delay_ms,
            max_delay_ms = settings.max_delay_ms,
            "Push settings updated"
        );
        self.inner.settings.store(Arc::new(settings));
    }

    /// Current state of every push channel, in start order.
    pub fn channel_states(&self) -> Vec<(PushChannelDescriptor, ChannelState)> {
        match self.inner.channels.lock() {
            Ok(channels) => channels
                .iter()
                .map(|handle| (handle.descriptor().clone(), handle.state()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Stop every push channel.
    pub fn shutdown(&self) {
        tracing::info!("Stopping push channels");
        self.inner.shutdown.trigger();
    }

    /// Decode a descriptor from JSON text and apply it.
    pub fn parse_config(&self, payload: &str) -> Result<(), ConfigError> {
        let descriptor = ConfigurationDescriptor::from_json_str(payload)?;
        self.add_config(descriptor)
    }

    /// Apply one descriptor: record its route and start its push channel.
    pub fn add_config(&self, descriptor: ConfigurationDescriptor) -> Result<(), ConfigError> {
        if descriptor.options.debug == Some(true) {
            self.inner.debug.enable();
        }

        let url = Url::parse(&descriptor.url)
            .map_err(|e| ConfigError::Invalid(format!("url '{}': {}", descriptor.url, e)))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| ConfigError::Invalid(format!("url '{}' has no host", descriptor.url)))?
            .to_string();
        let origin = get_origin(&url);
        let transport = descriptor.options.transport;

        if descriptor.options.push_path.is_some() {
            parse_transport_url(&transport)?;
        }

        self.inner.routes.set_route(origin.clone(), transport.clone());
        if self.inner.debug.is_enabled() {
            tracing::info!(%origin, %transport, "Route configured");
        }

        if let Some(path) = descriptor.options.push_path {
            self.start_push_channel(PushChannelDescriptor {
                hostname,
                port: resolve_port(&url),
                path,
                transport_url: transport,
                origin,
            });
        }

        Ok(())
    }

    /// Configure a batch from a JSON array of URL strings and descriptor objects.
    ///
    /// Anything other than an array is rejected before any work starts.
    pub fn configure_value(&self, value: Value) -> Result<(), ConfigError> {
        match value {
            Value::Array(items) => self.configure(items.into_iter().map(ConfigSource::from)),
            other => Err(ConfigError::InvalidArgument(other.to_string())),
        }
    }

    /// Configure a batch of sources.
    ///
    /// URLs are fetched in the background. Inline descriptors are applied
    /// before this returns. An inline value that is not an object stops the
    /// batch with `InvalidArgument`; elements before it stay dispatched.
    pub fn configure<I>(&self, sources: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = ConfigSource>,
    {
        let _batch = self.inner.tracker.begin();

        for source in sources {
            match source {
                ConfigSource::Url(url) => self.fetch_config(url),
                ConfigSource::Inline(value) if value.is_object() => {
                    let _guard = self.inner.tracker.begin();
                    let label = ConfigSource::Inline(value.clone()).label();
                    if let Err(e) = ConfigurationDescriptor::from_value(value)
                        .and_then(|descriptor| self.add_config(descriptor))
                    {
                        self.report_failure(label, &e);
                    }
                }
                ConfigSource::Inline(other) => {
                    return Err(ConfigError::InvalidArgument(other.to_string()));
                }
                ConfigSource::Descriptor(descriptor) => {
                    let _guard = self.inner.tracker.begin();
                    let label = descriptor.url.clone();
                    if let Err(e) = self.add_config(descriptor) {
                        self.report_failure(label, &e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Fetch and apply a remote descriptor on a background task.
    pub fn fetch_config(&self, url: String) {
        let guard = self.inner.tracker.begin();
        let this = self.clone();

        tokio::spawn(async move {
            let _guard = guard;
            if this.debug() {
                tracing::info!(%url, "Fetching config");
            }
            let result = match this.inner.fetcher.fetch(&url).await {
                Ok(payload) => this.parse_config(&payload),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                this.report_failure(url, &e);
            }
        });
    }

    fn start_push_channel(&self, descriptor: PushChannelDescriptor) {
        let channel = PushChannel::new(
            descriptor,
            Arc::clone(&self.inner.opener),
            self.inner.handler.clone(),
            Arc::clone(&self.inner.settings),
            self.inner.debug.clone(),
        );
        let handle = channel.spawn(self.inner.shutdown.subscribe());
        tracing::debug!(channel = %handle.descriptor(), "Push channel started");

        match self.inner.channels.lock() {
            Ok(mut channels) => channels.push(handle),
            Err(poisoned) => poisoned.into_inner().push(handle),
        }
    }

    fn report_failure(&self, source: String, error: &ConfigError) {
        tracing::warn!(%source, error = %error, "Configuration source failed");
        let _ = self.inner.events.send(ConfigEvent::Failed {
            source,
            reason: error.to_string(),
        });
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("routes", &self.inner.routes.len())
            .field("in_flight", &self.inner.tracker.active_count())
            .field("debug", &self.inner.debug.is_enabled())
            .finish()
    }
}
