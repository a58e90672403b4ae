//! Outbound wire types
//!
//! Optional keys are omitted rather than sent as `null`. `kontakt` is always
//! an object holding only the known contact fields.

use crate::contact::ContactProfile;
use crate::history::{Message, Role};
use crate::lead::LeadScore;
use crate::session::ChatMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub meta: Meta,
    pub kontakt: ContactProfile,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anfrage: Option<Anfrage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    /// Base64 encoded recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
}

/// Session metadata sent with every turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub mode: ChatMode,
    pub dsgvo_consent: bool,
    pub source: String,
    pub has_contact_data: bool,
    pub message_count: usize,
    pub lead_score: LeadScore,
}

/// Context message as sent in `history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// Structured request filled in through a form instead of free text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentRequest {
    /// Request type, e.g. `termin` or `rueckruf`
    pub kind: String,
    /// Free-text note accompanying the request
    pub message: String,
    /// Preferred date as entered
    pub date: Option<String>,
    /// Preferred time as entered
    pub time: Option<String>,
}

impl IntentRequest {
    /// Text recorded in the message log for this request
    pub fn summary(&self) -> String {
        let mut summary = format!("[{}]", self.kind);
        if let Some(date) = &self.date {
            summary.push(' ');
            summary.push_str(date);
        }
        if let Some(time) = &self.time {
            summary.push(' ');
            summary.push_str(time);
        }
        if !self.message.trim().is_empty() {
            summary.push(' ');
            summary.push_str(self.message.trim());
        }
        summary
    }
}

/// Wire form of an [`IntentRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anfrage {
    pub typ: String,
    pub nachricht: String,
    pub details: AnfrageDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnfrageDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uhrzeit: Option<String>,
}

impl From<&IntentRequest> for Anfrage {
    fn from(request: &IntentRequest) -> Self {
        let non_blank = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        Self {
            typ: request.kind.clone(),
            nachricht: request.message.clone(),
            details: AnfrageDetails {
                datum: non_blank(&request.date),
                uhrzeit: non_blank(&request.time),
            },
        }
    }
}

/// Notification sent once a lead qualifies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub session_id: String,
    pub kontakt: ContactProfile,
    pub lead_score: LeadScore,
    pub timestamp: DateTime<Utc>,
}

impl LeadNotification {
    pub fn qualified(session_id: &str, kontakt: &ContactProfile, lead_score: &LeadScore) -> Self {
        Self {
            kind: "qualified_lead".to_string(),
            session_id: session_id.to_string(),
            kontakt: kontakt.clone(),
            lead_score: lead_score.clone(),
            timestamp: Utc::now(),
        }
    }
}
