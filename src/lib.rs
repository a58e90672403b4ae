//! DomAssist - chat assistant widget core
//!
//! This library implements everything behind the DomAssist chat widget
//! except the rendering: privacy consent, contact extraction, lead scoring,
//! history persistence and the webhook exchange.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `widget`: Conversation orchestration tying all other modules together
//! - `consent`: Consent state machine with a persisted, expiring record
//! - `contact`: Contact extraction from free text and the merged profile
//! - `lead`: Engagement tracking and lead qualification
//! - `history`: Message log and its session-scoped persistence
//! - `webhook`: Outbound payload, transport abstraction and reply parsing
//! - `storage`: Key-value stores (SQLite for durable state, in-memory)
//! - `gate`: Optional page-level PIN gate
//! - `voice`: Audio capture and encoding for voice messages
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use domassist::storage::{KeyValueStore, MemoryStorage, SqliteStorage};
//! use domassist::webhook::WebhookClient;
//! use domassist::{ChatWidget, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = WebhookClient::from_config(&config.webhook)?;
//!     let durable: Arc<dyn KeyValueStore> = Arc::new(SqliteStorage::open(&config.storage)?);
//!     let mut widget = ChatWidget::new(config, client, durable, Arc::new(MemoryStorage::new()));
//!
//!     widget.accept_consent();
//!     if let Ok(reply) = widget.send_message("Was kostet das Business Paket?").await {
//!         println!("{}", reply.reply.content());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod consent;
pub mod contact;
pub mod error;
pub mod gate;
pub mod history;
pub mod lead;
pub mod session;
pub mod storage;
pub mod voice;
pub mod webhook;
pub mod widget;

// Re-export commonly used types
pub use config::Config;
pub use contact::ContactProfile;
pub use error::{DomassistError, Result};
pub use session::ChatMode;
pub use widget::ChatWidget;

#[cfg(test)]
pub mod test_utils;
