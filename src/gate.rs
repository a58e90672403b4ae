//! Page-level PIN gate
//!
//! Locks the front end until one of a few shared PINs is entered. PINs are
//! configured as base64 literals and compared after encoding the input, so
//! this is an obstacle for casual visitors and nothing more. Paths matching
//! an allow-list entry bypass the gate.

use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::error::{DomassistError, Result};
use crate::storage::KeyValueStore;

/// Result of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    /// The gate is switched off
    Disabled,
    /// Path is on the allow-list
    Allowlisted,
    /// A valid session exists
    Unlocked { expires_at: DateTime<Utc> },
    /// A PIN is required
    Locked,
}

impl GateStatus {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Locked)
    }
}

/// Persisted unlock session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSession {
    pub expiry: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

/// PIN gate over durable storage
#[derive(Debug, Clone)]
pub struct PageGate {
    config: GateConfig,
}

impl PageGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Check whether `path` may be shown
    pub fn check(&self, path: &str, store: &dyn KeyValueStore) -> GateStatus {
        self.check_at(path, store, Utc::now())
    }

    /// Check whether `path` may be shown as of `now`
    ///
    /// Expired or unreadable sessions are removed from storage.
    pub fn check_at(&self, path: &str, store: &dyn KeyValueStore, now: DateTime<Utc>) -> GateStatus {
        if !self.config.enabled {
            return GateStatus::Disabled;
        }
        if self.is_allowlisted(path) {
            return GateStatus::Allowlisted;
        }

        match self.session(store, now) {
            Some(session) => GateStatus::Unlocked {
                expires_at: session.expiry,
            },
            None => GateStatus::Locked,
        }
    }

    /// Path contains one of the allow-list substrings
    pub fn is_allowlisted(&self, path: &str) -> bool {
        self.config
            .allow_paths
            .iter()
            .filter(|p| !p.is_empty())
            .any(|p| path.contains(p.as_str()))
    }

    /// Unlock with `pin` and start a session
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty PIN, `Gate` for a wrong PIN and
    /// `Persistence` if the session cannot be stored.
    pub fn unlock(&self, pin: &str, store: &dyn KeyValueStore) -> Result<GateSession> {
        self.unlock_at(pin, store, Utc::now())
    }

    pub fn unlock_at(
        &self,
        pin: &str,
        store: &dyn KeyValueStore,
        now: DateTime<Utc>,
    ) -> Result<GateSession> {
        let pin = pin.trim();
        if pin.is_empty() {
            return Err(DomassistError::Validation("PIN must not be empty".into()).into());
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(pin);
        let Some(matched) = self.config.pins.iter().find(|p| p.encoded == encoded) else {
            tracing::warn!("Rejected gate PIN");
            return Err(DomassistError::Gate("invalid PIN".into()).into());
        };

        let session = GateSession {
            expiry: now + Duration::hours(i64::from(self.config.session_hours)),
            created: now,
        };
        store.set(&self.config.storage_key, &serde_json::to_string(&session)?)?;

        tracing::info!(label = %matched.label, expiry = %session.expiry, "Gate unlocked");
        Ok(session)
    }

    /// End the current session
    pub fn logout(&self, store: &dyn KeyValueStore) -> Result<()> {
        tracing::info!("Gate session ended");
        store.remove(&self.config.storage_key)
    }

    fn session(&self, store: &dyn KeyValueStore, now: DateTime<Utc>) -> Option<GateSession> {
        let raw = match store.get(&self.config.storage_key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read gate session: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<GateSession>(&raw) {
            Ok(session) if now <= session.expiry => Some(session),
            Ok(_) => {
                tracing::info!("Gate session expired");
                self.discard(store);
                None
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable gate session: {}", e);
                self.discard(store);
                None
            }
        }
    }

    fn discard(&self, store: &dyn KeyValueStore) {
        if let Err(e) = store.remove(&self.config.storage_key) {
            tracing::warn!("Failed to remove gate session: {}", e);
        }
    }
}
