//! Consent state machine
//!
//! ```text
//! NoConsent --request_gate--> Pending --accept--> Granted
//!                                |                  |
//!                             decline            refresh (expired)
//!                                v                  v
//!                            NoConsent           Expired --request_gate--> Pending
//! ```
//!
//! `revoke` moves any state back to `NoConsent` and deletes the persisted
//! record. Network calls and persistence are only allowed while
//! [`ConsentManager::is_granted`] holds.

use crate::config::Config;
use crate::error::{DomassistError, Result};
use crate::storage::KeyValueStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consent state of the current visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    /// No valid consent on record
    NoConsent,
    /// Consent prompt is showing, waiting for accept or decline
    Pending,
    /// Consent granted and not yet expired
    Granted,
    /// Consent was granted but the window has passed
    Expired,
}

impl fmt::Display for ConsentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NoConsent => "no consent",
            Self::Pending => "pending",
            Self::Granted => "granted",
            Self::Expired => "expired",
        };
        f.write_str(label)
    }
}

/// Persisted proof of consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub granted: bool,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ConsentRecord {
    /// Grant consent at `now` for `validity`
    pub fn grant(now: DateTime<Utc>, validity: Duration) -> Self {
        Self {
            granted: true,
            granted_at: now,
            expires_at: now + validity,
        }
    }

    /// Whether the record grants consent at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.granted && now < self.expires_at
    }
}

/// Tracks consent and persists it in durable storage
#[derive(Debug, Clone)]
pub struct ConsentManager {
    required: bool,
    validity: Duration,
    storage_key: String,
    state: ConsentState,
    record: Option<ConsentRecord>,
}

impl ConsentManager {
    /// Resolve the initial state from `store`
    pub fn load(config: &Config, store: &dyn KeyValueStore) -> Self {
        Self::load_at(config, store, Utc::now())
    }

    /// Resolve the initial state as of `now`
    ///
    /// A missing, expired or unreadable record yields `NoConsent`. An
    /// unreadable record is removed. With consent disabled in the
    /// configuration the state is always `Granted`.
    pub fn load_at(config: &Config, store: &dyn KeyValueStore, now: DateTime<Utc>) -> Self {
        let mut manager = Self {
            required: config.widget.enable_consent,
            validity: Duration::days(i64::from(config.consent.validity_days)),
            storage_key: config.consent.storage_key.clone(),
            state: ConsentState::NoConsent,
            record: None,
        };

        if !manager.required {
            manager.state = ConsentState::Granted;
            return manager;
        }

        let raw = match store.get(&manager.storage_key) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to read consent record: {}", e);
                None
            }
        };

        if let Some(raw) = raw {
            match serde_json::from_str::<ConsentRecord>(&raw) {
                Ok(record) if record.is_valid_at(now) => {
                    manager.state = ConsentState::Granted;
                    manager.record = Some(record);
                }
                Ok(record) => {
                    tracing::info!(expired_at = %record.expires_at, "Stored consent is no longer valid");
                }
                Err(e) => {
                    tracing::warn!("Discarding unreadable consent record: {}", e);
                    if let Err(e) = store.remove(&manager.storage_key) {
                        tracing::warn!("Failed to remove consent record: {}", e);
                    }
                }
            }
        }

        tracing::debug!(state = %manager.state, "Consent resolved");
        manager
    }

    /// Current state
    pub fn state(&self) -> ConsentState {
        self.state
    }

    /// True when gated actions may run
    pub fn is_granted(&self) -> bool {
        !self.required || self.state == ConsentState::Granted
    }

    /// Whether consent is required at all
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The active consent record, if any
    pub fn record(&self) -> Option<&ConsentRecord> {
        self.record.as_ref()
    }

    /// Ask for consent before a gated action
    ///
    /// Returns true when the action may proceed. Otherwise the state moves
    /// to `Pending` and the caller must show the consent prompt.
    pub fn request_gate(&mut self) -> bool {
        if self.is_granted() {
            return true;
        }
        if self.state != ConsentState::Pending {
            tracing::info!(from = %self.state, "Consent requested");
            self.state = ConsentState::Pending;
        }
        false
    }

    /// Accept the pending consent prompt
    pub fn accept(&mut self, store: &dyn KeyValueStore) -> Result<&ConsentRecord> {
        self.accept_at(store, Utc::now())
    }

    /// Accept the pending consent prompt at `now`
    ///
    /// # Errors
    ///
    /// Returns `ConsentTransition` unless the state is `Pending`. Failing to
    /// persist the record is logged and the grant holds in memory.
    pub fn accept_at(
        &mut self,
        store: &dyn KeyValueStore,
        now: DateTime<Utc>,
    ) -> Result<&ConsentRecord> {
        if self.state != ConsentState::Pending {
            return Err(DomassistError::ConsentTransition(format!(
                "cannot accept consent while {}",
                self.state
            ))
            .into());
        }

        let record = ConsentRecord::grant(now, self.validity);
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = store.set(&self.storage_key, &json) {
                    tracing::warn!("Consent granted in memory only: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize consent record: {}", e),
        }

        tracing::info!(expires_at = %record.expires_at, "Consent granted");
        self.state = ConsentState::Granted;
        Ok(self.record.insert(record))
    }

    /// Decline the pending consent prompt
    ///
    /// # Errors
    ///
    /// Returns `ConsentTransition` unless the state is `Pending`.
    pub fn decline(&mut self) -> Result<()> {
        if self.state != ConsentState::Pending {
            return Err(DomassistError::ConsentTransition(format!(
                "cannot decline consent while {}",
                self.state
            ))
            .into());
        }
        tracing::info!("Consent declined");
        self.state = ConsentState::NoConsent;
        Ok(())
    }

    /// Withdraw consent from any state and delete the persisted record
    ///
    /// The in-memory state is reset even when the store fails; the storage
    /// error is returned so the caller can log it.
    pub fn revoke(&mut self, store: &dyn KeyValueStore) -> Result<()> {
        tracing::info!(from = %self.state, "Consent revoked");
        self.state = ConsentState::NoConsent;
        self.record = None;
        store.remove(&self.storage_key)
    }

    /// Passive expiry re-check
    pub fn refresh(&mut self) -> ConsentState {
        self.refresh_at(Utc::now())
    }

    /// Passive expiry re-check as of `now`
    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> ConsentState {
        if self.required && self.state == ConsentState::Granted {
            let valid = self.record.as_ref().is_some_and(|r| r.is_valid_at(now));
            if !valid {
                tracing::info!("Consent expired");
                self.state = ConsentState::Expired;
                self.record = None;
            }
        }
        self.state
    }
}
