//! Client-side transport and HTTP/2 push-channel manager.
//!
//! Routes origins to multiplexed transports, keeps long-lived pull channels
//! open over them and stores every pushed resource in a cache.

// Core subsystems
pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod push;
pub mod routing;
pub mod transport;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use cache::{Cache, CachedResponse, MemoryCache, RequestInfo};
pub use config::{ConfigurationDescriptor, RuntimeConfig};
pub use lifecycle::Shutdown;
pub use orchestrator::{ConfigError, ConfigEvent, ConfigSource, Configuration, ConfigurationBuilder};
pub use push::{PushChannel, PushPromiseHandler};
pub use routing::ProxyRoutingTable;
pub use transport::{TransportError, TransportRegistry};
