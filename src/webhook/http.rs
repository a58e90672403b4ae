//! reqwest-backed webhook transport

use std::time::Duration;

use serde_json::Value;

use crate::config::WebhookConfig;
use crate::error::{DomassistError, Result};
use crate::webhook::transport::{Transport, TransportResponse};

/// POSTs JSON to the configured webhook URL
///
/// # Examples
///
/// ```
/// use domassist::webhook::http::ReqwestTransport;
///
/// let endpoint = url::Url::parse("http://localhost:5678/webhook/test").unwrap();
/// let transport = ReqwestTransport::new(endpoint, None).unwrap();
/// assert_eq!(transport.endpoint().path(), "/webhook/test");
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl ReqwestTransport {
    /// Build a transport for `endpoint`
    ///
    /// Without a `timeout` the reqwest default applies.
    pub fn new(endpoint: url::Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(format!("domassist/{}", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(DomassistError::from)?;

        Ok(Self { client, endpoint })
    }

    /// Build a transport from the `webhook` config section
    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&config.url).map_err(|e| {
            DomassistError::Config(format!("Invalid webhook.url {}: {}", config.url, e))
        })?;
        Self::new(endpoint, config.timeout_seconds.map(Duration::from_secs))
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, body: &Value) -> Result<TransportResponse> {
        tracing::debug!(endpoint = %self.endpoint, "POST webhook");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| DomassistError::Network(format!("webhook request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DomassistError::Network(format!("failed to read webhook body: {}", e)))?;

        tracing::debug!(status, bytes = body.len(), "Webhook answered");
        Ok(TransportResponse { status, body })
    }
}
