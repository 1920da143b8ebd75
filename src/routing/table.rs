//! Origin → transport URL routing table.
//!
//! # Responsibilities
//! - Upsert routes as configuration descriptors are ingested
//! - Answer "which transport serves this origin?"
//!
//! # Design Decisions
//! - Last write wins; there is no removal path
//! - A missing route is a normal answer, not an error

use dashmap::DashMap;

/// Maps an origin (`scheme://host:port`) to the transport URL responsible for it.
#[derive(Debug, Default)]
pub struct ProxyRoutingTable {
    routes: DashMap<String, String>,
}

impl ProxyRoutingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the transport for `origin`.
    pub fn set_route(&self, origin: impl Into<String>, transport_url: impl Into<String>) {
        let origin = origin.into();
        let transport_url = transport_url.into();
        tracing::debug!(origin = %origin, transport = %transport_url, "Route updated");
        self.routes.insert(origin, transport_url);
    }

    /// Transport URL configured for `origin`, if any.
    pub fn get_route(&self, origin: &str) -> Option<String> {
        self.routes.get(origin).map(|r| r.value().clone())
    }

    /// Number of configured origins.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Snapshot of configured origins, sorted.
    pub fn origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = self.routes.iter().map(|r| r.key().clone()).collect();
        origins.sort();
        origins
    }
}
