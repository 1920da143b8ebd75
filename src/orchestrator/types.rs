//! Orchestrator inputs, events and errors.

use serde_json::Value;
use thiserror::Error;

use crate::config::descriptor::ConfigurationDescriptor;
use crate::transport::TransportError;

/// Errors while ingesting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Payload is not valid JSON or lacks required fields.
    #[error("Unable to parse config: {0}")]
    Unparsable(String),

    /// Payload decoded but its values are unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Remote descriptor answered with a non-200 status.
    #[error("Failed to load configuration {url}, status code: {status}")]
    FetchStatus { url: String, status: u16 },

    /// Remote descriptor could not be retrieved at all.
    #[error("Failed to load configuration {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// `configure` was given something other than URLs and descriptor objects.
    #[error("Invalid arg: {0}")]
    InvalidArgument(String),

    /// The descriptor names a transport that can never be opened.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Notifications emitted by a [`crate::Configuration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// The in-flight count returned to zero.
    Completed,
    /// One source failed; the rest of its batch is unaffected.
    Failed { source: String, reason: String },
}

/// One element of a `configure` batch.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Descriptor to fetch over HTTP.
    Url(String),
    /// Inline descriptor as raw JSON; must be an object.
    Inline(Value),
    /// Already decoded descriptor.
    Descriptor(ConfigurationDescriptor),
}

impl ConfigSource {
    /// Short label for logs and failure events.
    pub fn label(&self) -> String {
        match self {
            ConfigSource::Url(url) => url.clone(),
            ConfigSource::Inline(value) => value
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or("<inline>")
                .to_string(),
            ConfigSource::Descriptor(descriptor) => descriptor.url.clone(),
        }
    }
}

impl From<&str> for ConfigSource {
    fn from(url: &str) -> Self {
        ConfigSource::Url(url.to_string())
    }
}

impl From<String> for ConfigSource {
    fn from(url: String) -> Self {
        ConfigSource::Url(url)
    }
}

impl From<ConfigurationDescriptor> for ConfigSource {
    fn from(descriptor: ConfigurationDescriptor) -> Self {
        ConfigSource::Descriptor(descriptor)
    }
}

impl From<Value> for ConfigSource {
    /// Strings become URLs; everything else is treated as an inline descriptor.
    fn from(value: Value) -> Self {
        match value {
            Value::String(url) => ConfigSource::Url(url),
            other => ConfigSource::Inline(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_from_value() {
        assert!(matches!(ConfigSource::from(json!("http://a/c.json")), ConfigSource::Url(_)));
        assert!(matches!(ConfigSource::from(json!({"url": "x"})), ConfigSource::Inline(_)));
        assert!(matches!(ConfigSource::from(json!(42)), ConfigSource::Inline(_)));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConfigSource::from("http://a/c.json").label(), "http://a/c.json");
        assert_eq!(ConfigSource::Inline(json!({"url": "http://b/"})).label(), "http://b/");
        assert_eq!(ConfigSource::Inline(json!(1)).label(), "<inline>");
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::FetchStatus {
            url: "http://a/c.json".into(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "Failed to load configuration http://a/c.json, status code: 404"
        );
    }
}
