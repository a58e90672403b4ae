//! Configuration management for DomAssist
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{DomassistError, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for DomAssist
///
/// Holds the webhook endpoint, widget behaviour, consent and history
/// storage keys, lead qualification thresholds and the optional page gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Webhook endpoint configuration
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Widget behaviour configuration
    #[serde(default)]
    pub widget: WidgetConfig,
    /// Consent window configuration
    #[serde(default)]
    pub consent: ConsentConfig,
    /// History persistence configuration
    #[serde(default)]
    pub history: HistoryConfig,
    /// Lead qualification configuration
    #[serde(default)]
    pub lead: LeadConfig,
    /// Page-level PIN gate configuration
    #[serde(default)]
    pub gate: GateConfig,
    /// Durable storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// URL receiving every conversation turn
    #[serde(default = "default_webhook_url")]
    pub url: String,

    /// Request timeout in seconds; absent means the transport default
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Value sent as `meta.source`
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_webhook_url() -> String {
    "https://n8n.domassist.de/webhook/ecc1a840-b626-43ee-9825-0ae80d3feffd".to_string()
}

fn default_source() -> String {
    "landing-page-widget".to_string()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: default_webhook_url(),
            timeout_seconds: None,
            source: default_source(),
        }
    }
}

/// Widget behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Display name of the assistant
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Greeting shown before the first turn
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Input placeholder text
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,

    /// Canned prompts offered as quick actions
    #[serde(default = "default_quick_actions")]
    pub quick_actions: Vec<String>,

    /// Allow switching to voice mode
    #[serde(default = "default_true")]
    pub enable_voice: bool,

    /// Require consent before any network or persistence action
    #[serde(default = "default_true")]
    pub enable_consent: bool,

    /// Persist message log and contact profile while consent is granted
    #[serde(default = "default_true")]
    pub save_history: bool,

    /// Open the widget on start when consent is already granted
    #[serde(default)]
    pub auto_open: bool,

    /// Link shown in the consent prompt
    #[serde(default = "default_privacy_policy_url")]
    pub privacy_policy_url: String,
}

fn default_assistant_name() -> String {
    "DomAssist".to_string()
}

fn default_welcome_message() -> String {
    "Hallo! Ich bin DomAssist, wie kann ich heute helfen?".to_string()
}

fn default_placeholder_text() -> String {
    "Schreiben Sie eine Nachricht...".to_string()
}

fn default_quick_actions() -> Vec<String> {
    vec![
        "📅 Termin vereinbaren".to_string(),
        "💬 Frage stellen".to_string(),
        "ℹ️ Informationen".to_string(),
        "📞 Kontakt".to_string(),
    ]
}

fn default_privacy_policy_url() -> String {
    "datenschutz.html".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            welcome_message: default_welcome_message(),
            placeholder_text: default_placeholder_text(),
            quick_actions: default_quick_actions(),
            enable_voice: true,
            enable_consent: true,
            save_history: true,
            auto_open: false,
            privacy_policy_url: default_privacy_policy_url(),
        }
    }
}

/// Consent window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentConfig {
    /// Days a granted consent stays valid
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,

    /// Durable storage key of the consent record
    #[serde(default = "default_consent_key")]
    pub storage_key: String,
}

fn default_validity_days() -> u32 {
    365
}

fn default_consent_key() -> String {
    "domassist_dsgvo_consent".to_string()
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            validity_days: default_validity_days(),
            storage_key: default_consent_key(),
        }
    }
}

/// History persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Session storage key of the message log
    #[serde(default = "default_messages_key")]
    pub messages_key: String,

    /// Session storage key of the contact profile
    #[serde(default = "default_contacts_key")]
    pub contacts_key: String,

    /// Number of recent messages sent as conversation context
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_messages_key() -> String {
    "domassist_chat_history".to_string()
}

fn default_contacts_key() -> String {
    "domassist_contacts".to_string()
}

fn default_context_window() -> usize {
    5
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            messages_key: default_messages_key(),
            contacts_key: default_contacts_key(),
            context_window: default_context_window(),
        }
    }
}

/// Lead qualification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadConfig {
    /// A lead with contact data is qualified once it exceeds this many actions
    #[serde(default = "default_qualified_after_actions")]
    pub qualified_after_actions: u32,
}

fn default_qualified_after_actions() -> u32 {
    5
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            qualified_after_actions: default_qualified_after_actions(),
        }
    }
}

/// A shared secret accepted by the page gate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatePin {
    /// Base64 encoding of the PIN
    pub encoded: String,
    /// Who the PIN belongs to (logged on unlock)
    #[serde(default)]
    pub label: String,
}

/// Page-level PIN gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Gate the front end behind a PIN
    #[serde(default)]
    pub enabled: bool,

    /// Path substrings that bypass the gate
    #[serde(default)]
    pub allow_paths: Vec<String>,

    /// Accepted PINs
    #[serde(default)]
    pub pins: Vec<GatePin>,

    /// Hours an unlocked gate stays open
    #[serde(default = "default_session_hours")]
    pub session_hours: u32,

    /// Durable storage key of the gate session
    #[serde(default = "default_gate_key")]
    pub storage_key: String,
}

fn default_session_hours() -> u32 {
    8
}

fn default_gate_key() -> String {
    "domassist_auth".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_paths: Vec::new(),
            pins: Vec::new(),
            session_hours: default_session_hours(),
            storage_key: default_gate_key(),
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file for durable state; platform data dir when absent
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DomassistError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DomassistError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("DOMASSIST_WEBHOOK_URL") {
            self.webhook.url = url;
        }

        if let Ok(timeout) = std::env::var("DOMASSIST_WEBHOOK_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.webhook.timeout_seconds = Some(v),
                Err(_) => tracing::warn!("Invalid DOMASSIST_WEBHOOK_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(value) = std::env::var("DOMASSIST_ENABLE_CONSENT") {
            match value.parse::<bool>() {
                Ok(v) => {
                    self.widget.enable_consent = v;
                    tracing::debug!(enable_consent = v, "Env override: DOMASSIST_ENABLE_CONSENT");
                }
                Err(_) => tracing::warn!("Invalid value for DOMASSIST_ENABLE_CONSENT: {}", value),
            }
        }

        if let Ok(value) = std::env::var("DOMASSIST_SAVE_HISTORY") {
            match value.parse::<bool>() {
                Ok(v) => {
                    self.widget.save_history = v;
                    tracing::debug!(save_history = v, "Env override: DOMASSIST_SAVE_HISTORY");
                }
                Err(_) => tracing::warn!("Invalid value for DOMASSIST_SAVE_HISTORY: {}", value),
            }
        }

        if let Ok(value) = std::env::var("DOMASSIST_CONTEXT_WINDOW") {
            match value.parse::<usize>() {
                Ok(v) => self.history.context_window = v,
                Err(_) => tracing::warn!("Invalid DOMASSIST_CONTEXT_WINDOW: {}", value),
            }
        }

        if let Ok(value) = std::env::var("DOMASSIST_GATE_ENABLED") {
            match value.parse::<bool>() {
                Ok(v) => self.gate.enabled = v,
                Err(_) => tracing::warn!("Invalid value for DOMASSIST_GATE_ENABLED: {}", value),
            }
        }

        if let Ok(db_path) = std::env::var("DOMASSIST_STATE_DB") {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(url) = &cli.webhook_url {
            self.webhook.url = url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures the webhook URL is usable and that all windows and limits
    /// are non-zero.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.webhook.url.trim().is_empty() {
            return Err(DomassistError::Config("webhook.url cannot be empty".to_string()).into());
        }

        let parsed = url::Url::parse(&self.webhook.url).map_err(|e| {
            DomassistError::Config(format!("Invalid webhook.url {}: {}", self.webhook.url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomassistError::Config(format!(
                "webhook.url must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.webhook.timeout_seconds == Some(0) {
            return Err(DomassistError::Config(
                "webhook.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.consent.validity_days == 0 {
            return Err(DomassistError::Config(
                "consent.validity_days must be greater than 0".to_string(),
            )
            .into());
        }

        if self.history.context_window == 0 {
            return Err(DomassistError::Config(
                "history.context_window must be greater than 0".to_string(),
            )
            .into());
        }

        if self.gate.session_hours == 0 {
            return Err(DomassistError::Config(
                "gate.session_hours must be greater than 0".to_string(),
            )
            .into());
        }

        if self.gate.enabled && self.gate.pins.is_empty() {
            return Err(DomassistError::Config(
                "gate.pins must not be empty when the gate is enabled".to_string(),
            )
            .into());
        }

        for pin in &self.gate.pins {
            if base64::engine::general_purpose::STANDARD
                .decode(&pin.encoded)
                .is_err()
            {
                return Err(DomassistError::Config(format!(
                    "gate pin '{}' is not valid base64",
                    pin.label
                ))
                .into());
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook: WebhookConfig::default(),
            widget: WidgetConfig::default(),
            consent: ConsentConfig::default(),
            history: HistoryConfig::default(),
            lead: LeadConfig::default(),
            gate: GateConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.consent.validity_days, 365);
        assert_eq!(config.history.context_window, 5);
        assert_eq!(config.gate.session_hours, 8);
        assert!(config.widget.enable_consent);
        assert!(config.webhook.timeout_seconds.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_url() {
        let mut config = Config::default();
        config.webhook.url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_non_http_url() {
        let mut config = Config::default();
        config.webhook.url = "ftp://example.com/hook".to_string();
        assert!(config.validate().is_err());

        config.webhook.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_windows() {
        let mut config = Config::default();
        config.consent.validity_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.history.context_window = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.webhook.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_gate_requires_pins() {
        let mut config = Config::default();
        config.gate.enabled = true;
        assert!(config.validate().is_err());

        config.gate.pins.push(GatePin {
            encoded: "MTIzNA==".to_string(),
            label: "test".to_string(),
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_base64_pin() {
        let mut config = Config::default();
        config.gate.pins.push(GatePin {
            encoded: "***".to_string(),
            label: "broken".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
webhook:
  url: http://localhost:5678/webhook/test
  timeout_seconds: 20
  source: demo-page

widget:
  assistant_name: Helper
  enable_consent: false
  quick_actions:
    - "Preise ansehen"

history:
  context_window: 3

gate:
  enabled: true
  allow_paths: ["/impressum"]
  pins:
    - encoded: "MTIzNA=="
      label: team
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.webhook.url, "http://localhost:5678/webhook/test");
        assert_eq!(config.webhook.timeout_seconds, Some(20));
        assert_eq!(config.webhook.source, "demo-page");
        assert_eq!(config.widget.assistant_name, "Helper");
        assert!(!config.widget.enable_consent);
        assert!(config.widget.save_history);
        assert_eq!(config.widget.quick_actions, vec!["Preise ansehen"]);
        assert_eq!(config.history.context_window, 3);
        assert_eq!(config.history.messages_key, "domassist_chat_history");
        assert_eq!(config.gate.pins.len(), 1);
        assert_eq!(config.consent.storage_key, "domassist_dsgvo_consent");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.consent.validity_days, 365);
    }

    #[test]
    fn test_cli_webhook_override() {
        let mut cli = crate::cli::Cli::default();
        cli.webhook_url = Some("http://127.0.0.1:9/hook".to_string());
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.webhook.url, "http://127.0.0.1:9/hook");
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::set_var("DOMASSIST_WEBHOOK_TIMEOUT_SECONDS", "15");
        std::env::set_var("DOMASSIST_ENABLE_CONSENT", "false");
        std::env::set_var("DOMASSIST_CONTEXT_WINDOW", "not-a-number");

        let mut cfg = Config::default();
        cfg.apply_env_vars();

        assert_eq!(cfg.webhook.timeout_seconds, Some(15));
        assert!(!cfg.widget.enable_consent);
        assert_eq!(cfg.history.context_window, 5);

        std::env::remove_var("DOMASSIST_WEBHOOK_TIMEOUT_SECONDS");
        std::env::remove_var("DOMASSIST_ENABLE_CONSENT");
        std::env::remove_var("DOMASSIST_CONTEXT_WINDOW");
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = serde_yaml::from_str(include_str!("../config/config.yaml")).unwrap();
        assert_eq!(config.consent.storage_key, "domassist_dsgvo_consent");
        assert_eq!(config.gate.allow_paths.len(), 2);
        assert!(config.storage.db_path.is_none());
        assert!(config.validate().is_ok());
    }
}
