//! HTTP seam between the webhook client and the network

use crate::error::Result;
use serde_json::Value;

/// Status and raw body of a webhook answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers one JSON document to the webhook.
///
/// Implementations perform exactly one attempt; retries are not part of the
/// contract.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// POST `body` and return the answer, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error when no HTTP answer was received at all.
    async fn post_json(&self, body: &Value) -> Result<TransportResponse>;
}
