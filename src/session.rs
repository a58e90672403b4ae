//! Conversation session identity and UI mode

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Input mode of the widget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Typed text turns
    #[default]
    Chat,
    /// Recorded audio turns
    Voice,
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::Voice => write!(f, "voice"),
        }
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" | "text" => Ok(Self::Chat),
            "voice" | "audio" => Ok(Self::Voice),
            other => Err(format!("Unknown mode '{}', expected chat or voice", other)),
        }
    }
}

/// One conversation session
///
/// The id is fixed for the lifetime of the value; only the mode changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    session_id: String,
    created_at: DateTime<Utc>,
    mode: ChatMode,
}

impl Session {
    /// Start a new session with a fresh id
    pub fn new() -> Self {
        let created_at = Utc::now();
        let session_id = generate_id(created_at);
        tracing::debug!(%session_id, "Session created");
        Self {
            session_id,
            created_at,
            mode: ChatMode::default(),
        }
    }

    /// Opaque session identifier
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current input mode
    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// Switch the input mode
    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// `session_<unix millis>_<9 base36 chars>`
fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("session_{}_{}", now.timestamp_millis(), suffix)
}
