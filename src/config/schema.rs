//! Runtime settings schema.
//!
//! Loaded from a TOML file. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

use crate::config::descriptor::ConfigurationDescriptor;

/// Root runtime settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Verbose logging of transports, channels and pushes.
    pub debug: bool,

    /// Descriptor URLs to fetch and ingest at startup.
    pub sources: Vec<String>,

    /// Inline descriptors to ingest at startup.
    pub descriptors: Vec<ConfigurationDescriptor>,

    /// Pull channel reconnect settings.
    pub push: PushSettings,

    /// Remote descriptor fetch settings.
    pub fetch: FetchSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Pull channel reconnect settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PushSettings {
    /// First reconnect delay in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound on the reconnect delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: 250,
            max_delay_ms: 30_000,
        }
    }
}

/// Remote descriptor fetch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
