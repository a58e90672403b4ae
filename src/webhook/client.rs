//! Webhook client
//!
//! One POST per turn. A transport failure, a non-2xx status and a body that
//! is not JSON all surface as a network error; nothing is retried.

use std::sync::Arc;

use crate::config::WebhookConfig;
use crate::error::{DomassistError, Result};
use crate::webhook::http::ReqwestTransport;
use crate::webhook::payload::{LeadNotification, OutboundPayload};
use crate::webhook::response::InboundResponse;
use crate::webhook::transport::Transport;

/// Sends turns and lead notifications to the webhook
#[derive(Debug, Clone)]
pub struct WebhookClient {
    transport: Arc<dyn Transport>,
}

impl WebhookClient {
    /// Wrap an existing transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client over the reqwest transport for the configured URL
    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::from_config(config)?)))
    }

    /// Send one conversation turn and classify the answer
    pub async fn send(
        &self,
        payload: &OutboundPayload,
    ) -> std::result::Result<InboundResponse, DomassistError> {
        let body = serde_json::to_value(payload)?;
        tracing::debug!(payload = %body, "Sending turn to webhook");

        let response = self
            .transport
            .post_json(&body)
            .await
            .map_err(into_network_error)?;

        if !response.is_success() {
            tracing::error!(status = response.status, body = %response.body, "Webhook returned error status");
            return Err(DomassistError::HttpStatus {
                status: response.status,
            });
        }

        InboundResponse::classify(&response.body)
    }

    /// Announce a qualified lead
    ///
    /// The answer body is ignored; only delivery and status are checked.
    pub async fn send_lead_notification(
        &self,
        notification: &LeadNotification,
    ) -> std::result::Result<(), DomassistError> {
        let body = serde_json::to_value(notification)?;
        let response = self
            .transport
            .post_json(&body)
            .await
            .map_err(into_network_error)?;

        if !response.is_success() {
            return Err(DomassistError::HttpStatus {
                status: response.status,
            });
        }
        tracing::info!(session_id = %notification.session_id, "Qualified lead reported");
        Ok(())
    }
}

fn into_network_error(error: anyhow::Error) -> DomassistError {
    match error.downcast::<DomassistError>() {
        Ok(e) => e,
        Err(e) => DomassistError::Network(e.to_string()),
    }
}
