//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (delays ordered, timeouts > 0)
//! - Check that URLs and addresses parse
//! - Reject descriptors whose push transport can never be opened
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RuntimeConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::RuntimeConfig;
use crate::transport::parse_transport_url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("push.max_delay_ms must be greater than zero")]
    ZeroMaxDelay,

    #[error("push.base_delay_ms ({base}) exceeds push.max_delay_ms ({max})")]
    DelayOrder { base: u64, max: u64 },

    #[error("fetch.timeout_secs must be greater than zero")]
    ZeroFetchTimeout,

    #[error("source '{0}' is not a valid URL")]
    InvalidSource(String),

    #[error("descriptor '{url}': {reason}")]
    InvalidDescriptor { url: String, reason: String },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &RuntimeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.push.max_delay_ms == 0 {
        errors.push(ValidationError::ZeroMaxDelay);
    } else if config.push.base_delay_ms > config.push.max_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base: config.push.base_delay_ms,
            max: config.push.max_delay_ms,
        });
    }

    if config.fetch.timeout_secs == 0 {
        errors.push(ValidationError::ZeroFetchTimeout);
    }

    for source in &config.sources {
        if Url::parse(source).is_err() {
            errors.push(ValidationError::InvalidSource(source.clone()));
        }
    }

    for descriptor in &config.descriptors {
        if let Err(e) = Url::parse(&descriptor.url) {
            errors.push(ValidationError::InvalidDescriptor {
                url: descriptor.url.clone(),
                reason: e.to_string(),
            });
            continue;
        }
        if descriptor.options.push_path.is_some() {
            if let Err(e) = parse_transport_url(&descriptor.options.transport) {
                errors.push(ValidationError::InvalidDescriptor {
                    url: descriptor.url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
