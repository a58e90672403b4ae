//! Webhook relay
//!
//! Every conversation turn is POSTed as one JSON document to a single
//! webhook and the reply is classified into text, audio or an action
//! directive.
//!
//! - [`payload`] -- outbound wire types
//! - [`response`] -- inbound classification
//! - [`transport::Transport`] -- the HTTP seam; [`http::ReqwestTransport`]
//!   is the production implementation and `fake::FakeTransport` replaces it
//!   in unit tests
//! - [`client::WebhookClient`] -- one attempt per turn, typed failures

pub mod client;
pub mod http;
pub mod payload;
pub mod response;
pub mod transport;

#[cfg(test)]
pub mod fake;

pub use client::WebhookClient;
pub use payload::{HistoryEntry, IntentRequest, LeadNotification, Meta, OutboundPayload};
pub use response::{ActionDirective, BotReply, InboundResponse};
pub use transport::{Transport, TransportResponse};

/// Shown in the chat when a turn fails on the network
pub const CONNECTION_ERROR: &str = "⚠️ Verbindungsfehler. Bitte versuchen Sie es später erneut.";

/// Bot text used when a reply carries no usable text field
pub const FALLBACK_REPLY: &str = "Entschuldigung, ich konnte keine Antwort generieren.";
