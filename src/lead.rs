//! Lead scoring signals
//!
//! Tracks how engaged a visitor is over the course of a session. The score
//! travels with every outbound payload and the webhook may push updates
//! back through `leadUpdate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product package a visitor showed interest in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Package {
    Starter,
    Business,
    Enterprise,
}

impl Package {
    /// Detect the first package named in `text`, checked in tier order
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        [
            ("starter", Self::Starter),
            ("business", Self::Business),
            ("enterprise", Self::Enterprise),
        ]
        .into_iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, package)| package)
    }
}

/// Engagement signals of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScore {
    /// User turns sent so far
    #[serde(default)]
    pub actions: u32,
    /// Engagement score assigned by the webhook
    #[serde(default)]
    pub engagement: u32,
    /// Email or phone has been provided
    #[serde(default)]
    pub contact_provided: bool,
    /// Package mentioned by the visitor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interested_in_package: Option<Package>,
    /// Visitor asked for an appointment or consultation
    #[serde(default)]
    pub appointment_requested: bool,
    /// Time of the last webhook-driven update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl LeadScore {
    /// Record one user turn and the signals found in its text
    pub fn record_message(&mut self, text: &str) {
        self.actions += 1;

        let lower = text.to_lowercase();
        if lower.contains("termin") || lower.contains("beratung") {
            self.appointment_requested = true;
        }
        if let Some(package) = Package::detect(text) {
            self.interested_in_package = Some(package);
        }
    }

    /// Mirror the contact store flag; never reverts to false
    pub fn sync_contact(&mut self, contact_provided: bool) {
        self.contact_provided |= contact_provided;
    }

    /// Drop the contact flag after the visitor cleared the conversation
    pub fn forget_contact(&mut self) {
        self.contact_provided = false;
    }

    /// Merge a `leadUpdate` object sent by the webhook
    ///
    /// Known fields with the right JSON type are applied, everything else is
    /// ignored. `contactProvided` can only be raised. Returns true when the
    /// value was an object and the score was stamped.
    pub fn merge_update(&mut self, update: &Value) -> bool {
        let Some(fields) = update.as_object() else {
            tracing::warn!("Ignoring leadUpdate that is not an object");
            return false;
        };

        if let Some(actions) = fields.get("actions").and_then(as_u32) {
            self.actions = actions;
        }
        if let Some(engagement) = fields.get("engagement").and_then(as_u32) {
            self.engagement = engagement;
        }
        if fields.get("contactProvided").and_then(Value::as_bool) == Some(true) {
            self.contact_provided = true;
        }
        if let Some(requested) = fields.get("appointmentRequested").and_then(Value::as_bool) {
            self.appointment_requested = requested;
        }
        if let Some(package) = fields
            .get("interestedInPackage")
            .and_then(|v| serde_json::from_value::<Package>(v.clone()).ok())
        {
            self.interested_in_package = Some(package);
        }

        self.last_updated = Some(Utc::now());
        tracing::debug!(score = ?self, "Lead score updated from webhook");
        true
    }

    /// A lead with contact data and more than `threshold` actions
    pub fn is_qualified(&self, threshold: u32) -> bool {
        self.contact_provided && self.actions > threshold
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}
