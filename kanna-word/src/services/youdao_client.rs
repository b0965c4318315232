//! Youdao dictionary API client
//!
//! One GET per uncached word. The response body is kept verbatim; its
//! structure is only interpreted when a record is rendered.

use async_trait::async_trait;
use kanna_common::config::YoudaoConfig;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("kanna/", env!("CARGO_PKG_VERSION"));
const IDLE_TIMEOUT_SECS: u64 = 90;
const TCP_KEEPALIVE_SECS: u64 = 30;

/// Translation provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with anything but 200
    #[error("Provider returned HTTP {0}")]
    Status(u16),

    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Source of translations for words missing from the cache
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Fetch the raw payload for `word`
    async fn translate(&self, word: &str) -> Result<String, ProviderError>;
}

/// Build the shared, connection-pooled HTTP client
///
/// Used by the provider client and the speech downloader alike.
pub fn build_http_client(config: &YoudaoConfig) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS))
        .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE_SECS))
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

/// Youdao open API client
pub struct YoudaoClient {
    http_client: reqwest::Client,
    base_url: String,
    keyfrom: String,
    key: String,
}

impl YoudaoClient {
    pub fn new(http_client: reqwest::Client, config: &YoudaoConfig, key: String) -> Self {
        Self {
            http_client,
            base_url: config.base_url.clone(),
            keyfrom: config.keyfrom.clone(),
            key,
        }
    }
}

#[async_trait]
impl TranslationProvider for YoudaoClient {
    fn name(&self) -> &'static str {
        "youdao"
    }

    async fn translate(&self, word: &str) -> Result<String, ProviderError> {
        tracing::debug!(word = %word, url = %self.base_url, "Querying Youdao API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("keyfrom", self.keyfrom.as_str()),
                ("key", self.key.as_str()),
                ("type", "data"),
                ("doctype", "json"),
                ("version", "1.2"),
                ("q", word),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(word = %word, status = %status, "Youdao API call failed");
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Body(e.to_string()))?;

        tracing::info!(word = %word, bytes = body.len(), "Retrieved translation from Youdao");

        Ok(body)
    }
}
