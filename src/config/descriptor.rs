//! Configuration descriptor wire format.
//!
//! ```json
//! { "url": "http://localhost:8080/path",
//!   "options": { "transport": "ws://localhost:8081/ws",
//!                "h2PushPath": "/push",
//!                "debug": true } }
//! ```
//!
//! Unknown fields are ignored. `url` and `options.transport` are required.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::orchestrator::types::ConfigError;

/// One proxy configuration: an origin-bearing URL and its transport options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigurationDescriptor {
    pub url: String,
    pub options: ProxyOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyOptions {
    /// Transport URL (`ws:`, `wss:` or `tcp:`).
    pub transport: String,

    /// Path of the pull request used to receive pushes.
    #[serde(rename = "h2PushPath", default, skip_serializing_if = "Option::is_none")]
    pub push_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl ConfigurationDescriptor {
    pub fn new(url: impl Into<String>, transport: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: ProxyOptions {
                transport: transport.into(),
                push_path: None,
                debug: None,
            },
        }
    }

    pub fn with_push_path(mut self, path: impl Into<String>) -> Self {
        self.options.push_path = Some(path.into());
        self
    }

    /// Decode a descriptor from JSON text.
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(payload)
            .map_err(|e| ConfigError::Unparsable(format!("{}: {}", e, payload)))
    }

    /// Decode a descriptor from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let shown = value.to_string();
        serde_json::from_value(value)
            .map_err(|e| ConfigError::Unparsable(format!("{}: {}", e, shown)))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
