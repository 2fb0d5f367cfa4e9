//! Lookup service client.
//!
//! The lookup service does the actual DNS and WHOIS probing and answers
//! `GET {base_url}{lookup_path}?domain={domain}` with one JSON object. This
//! module defines the [`LookupService`] seam the controller talks to and the
//! reqwest-backed implementation used in production.

use crate::config::ClientConfig;
use crate::error::MailsecError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Anything that can fetch a raw lookup payload for a domain.
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Fetch the raw JSON payload for `domain`.
    ///
    /// # Errors
    ///
    /// Implementations return transport-category errors: network failures,
    /// non-success statuses, timeouts, or bodies that are not JSON.
    async fn lookup(&self, domain: &str) -> Result<serde_json::Value, MailsecError>;
}

/// HTTP client for the lookup service.
#[derive(Clone)]
pub struct HttpLookupClient {
    /// HTTP client for making lookup requests
    http_client: reqwest::Client,
    /// Scheme, host and port of the service, without trailing slash
    base_url: String,
    /// Path of the lookup endpoint, starting with a slash
    lookup_path: String,
    /// Overall deadline per lookup; `None` waits indefinitely
    timeout: Option<Duration>,
}

impl HttpLookupClient {
    /// Create a client pointing at the default local service.
    pub fn new() -> Result<Self, MailsecError> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a client from resolved configuration.
    pub fn with_config(config: &ClientConfig) -> Result<Self, MailsecError> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            MailsecError::network_with_source("Failed to create lookup HTTP client", e.to_string())
        })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            lookup_path: normalize_path(&config.lookup_path),
            timeout: config.timeout,
        })
    }

    /// Build the request URL for a domain.
    ///
    /// The domain is interpolated as-is; callers are expected to pass a
    /// clean identifier.
    pub fn lookup_url(&self, domain: &str) -> String {
        format!("{}{}?domain={}", self.base_url, self.lookup_path, domain)
    }

    async fn fetch(&self, url: &str) -> Result<serde_json::Value, MailsecError> {
        let response = self.http_client.get(url).send().await?;

        debug!(url = %url, status = %response.status(), "lookup response");

        let status: StatusCode = response.status();
        if !status.is_success() {
            return Err(MailsecError::http_status(url, status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| MailsecError::ParseError {
            message: format!("Lookup response is not valid JSON: {}", e),
            content: Some(body.chars().take(200).collect()),
        })
    }
}

#[async_trait]
impl LookupService for HttpLookupClient {
    async fn lookup(&self, domain: &str) -> Result<serde_json::Value, MailsecError> {
        let url = self.lookup_url(domain);
        debug!(url = %url, "requesting lookup");

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.fetch(&url))
                .await
                .map_err(|_| MailsecError::timeout("lookup request", timeout))?,
            None => self.fetch(&url).await,
        }
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
