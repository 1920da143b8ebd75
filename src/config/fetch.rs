//! Remote descriptor retrieval.

use std::time::Duration;
use futures_util::future::BoxFuture;

use crate::orchestrator::types::ConfigError;

/// Retrieves descriptor payloads by URL.
pub trait ConfigFetcher: Send + Sync + 'static {
    /// GET `url`; anything but a 200 is an error.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ConfigError>>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ConfigFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ConfigError>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(|e| ConfigError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

            let status = response.status();
            if status != reqwest::StatusCode::OK {
                return Err(ConfigError::FetchStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(|e| ConfigError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2));
        // Port 9 (discard) on localhost is almost never listening.
        let err = fetcher.fetch("http://127.0.0.1:9/config.json").await.unwrap_err();
        assert!(matches!(err, ConfigError::Fetch { .. }));
    }
}
