//! Message log and history persistence
//!
//! The message log is append-only; insertion order is display order and
//! transmission order. Persistence is a whole-state overwrite of the log and
//! the contact profile into session-scoped storage, and only happens while
//! consent is granted and history saving is enabled.

use crate::config::Config;
use crate::contact::ContactProfile;
use crate::error::Result;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "type")]
    pub role: Role,
    pub content: String,
    /// Content is an audio URL rather than text
    #[serde(default)]
    pub is_audio: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Text message from the visitor
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    /// Text message from the assistant
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content.into(), false)
    }

    /// Audio reply from the assistant; `url` points at the audio
    pub fn bot_audio(url: impl Into<String>) -> Self {
        Self::new(Role::Bot, url.into(), true)
    }

    fn new(role: Role, content: String, is_audio: bool) -> Self {
        Self {
            role,
            content,
            is_audio,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered, append-only sequence of messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `n` messages in insertion order
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl From<Vec<Message>> for MessageLog {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// State restored by [`HistoryStore::load`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub messages: MessageLog,
    pub contacts: ContactProfile,
}

/// Reads and writes the message log and contact profile
#[derive(Debug, Clone)]
pub struct HistoryStore {
    enabled: bool,
    messages_key: String,
    contacts_key: String,
}

impl HistoryStore {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.widget.save_history,
            messages_key: config.history.messages_key.clone(),
            contacts_key: config.history.contacts_key.clone(),
        }
    }

    /// Whether history saving is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Storage keys owned by the history
    pub fn keys(&self) -> [&str; 2] {
        [&self.messages_key, &self.contacts_key]
    }

    /// Overwrite the stored state
    ///
    /// Returns `Ok(false)` without touching the store when saving is
    /// disabled or consent is not granted.
    pub fn save(
        &self,
        consent_granted: bool,
        store: &dyn KeyValueStore,
        messages: &MessageLog,
        contacts: &ContactProfile,
    ) -> Result<bool> {
        if !self.enabled || !consent_granted {
            return Ok(false);
        }

        let messages_json = serde_json::to_string(messages)?;
        let contacts_json = serde_json::to_string(contacts)?;
        store.set_all(&[
            (self.messages_key.as_str(), messages_json.as_str()),
            (self.contacts_key.as_str(), contacts_json.as_str()),
        ])?;
        tracing::debug!(messages = messages.len(), "History saved");
        Ok(true)
    }

    /// Restore the stored state
    ///
    /// Never fails: without consent, on read errors or on corrupt data the
    /// affected part comes back empty. Corrupt entries are removed.
    pub fn load(&self, consent_granted: bool, store: &dyn KeyValueStore) -> HistorySnapshot {
        if !self.enabled || !consent_granted {
            return HistorySnapshot::default();
        }

        let messages: MessageLog = self.read_entry(store, &self.messages_key).unwrap_or_default();
        let contacts: ContactProfile = self
            .read_entry::<ContactProfile>(store, &self.contacts_key)
            .map(ContactProfile::normalized)
            .unwrap_or_default();

        tracing::debug!(messages = messages.len(), "History loaded");
        HistorySnapshot { messages, contacts }
    }

    /// Delete the stored state
    pub fn clear(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.remove_all(&self.keys())
    }

    fn read_entry<T: serde::de::DeserializeOwned>(
        &self,
        store: &dyn KeyValueStore,
        key: &str,
    ) -> Option<T> {
        let raw = match store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, "Failed to read history entry: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, "Discarding corrupt history entry: {}", e);
                if let Err(e) = store.remove(key) {
                    tracing::warn!(key, "Failed to remove corrupt entry: {}", e);
                }
                None
            }
        }
    }
}
