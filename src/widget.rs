//! The chat widget session object
//!
//! [`ChatWidget`] owns everything one embedded widget instance knows: the
//! session, consent, message log, contact profile and lead score. The
//! presentation layer feeds it raw user input and renders what comes back;
//! it never touches the state directly.
//!
//! A turn runs in a fixed order: validate, gate on consent, record the user
//! message, extract and merge contact data, build the payload, POST once,
//! classify, record the bot message. Every turn that passes the consent gate
//! appends exactly one user and one bot message, also when the webhook
//! fails.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::consent::{ConsentManager, ConsentState};
use crate::contact::{extract, ContactProfile, ContactStore};
use crate::history::{HistoryStore, Message, MessageLog};
use crate::lead::LeadScore;
use crate::session::{ChatMode, Session};
use crate::storage::KeyValueStore;
use crate::voice::encode_audio;
use crate::webhook::payload::{Anfrage, HistoryEntry, IntentRequest, LeadNotification, Meta};
use crate::webhook::{
    ActionDirective, BotReply, OutboundPayload, WebhookClient, CONNECTION_ERROR,
};

/// User message recorded for a voice turn
pub const VOICE_LABEL: &str = "🎤 Voice Message";

/// Short user-visible status message (toast)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ConsentDeclined,
    ConsentRequired,
    DataDeleted,
    HistoryCleared,
}

impl Notice {
    /// Toast text shown to the visitor
    pub fn text(&self) -> &'static str {
        match self {
            Self::ConsentDeclined => "⚠️ Ohne Zustimmung können wir DomAssist nicht starten.",
            Self::ConsentRequired => "⚠️ Bitte akzeptieren Sie zuerst die Datenschutzerklärung.",
            Self::DataDeleted => "✅ Ihre Daten wurden gelöscht.",
            Self::HistoryCleared => "✅ Chat-Verlauf gelöscht.",
        }
    }

    /// Success toasts are styled differently from warnings
    pub fn is_success(&self) -> bool {
        matches!(self, Self::DataDeleted | Self::HistoryCleared)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Result of opening or toggling the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    Closed,
    /// Consent prompt must be shown first
    ConsentRequired,
}

/// Successful turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub reply: BotReply,
    pub action: Option<ActionDirective>,
    pub follow_up_intent: Option<String>,
}

/// Failed turn; the widget stays usable after any of these
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// Nothing to send; no state changed
    #[error("message is empty")]
    EmptyInput,
    /// Consent prompt must be shown; nothing was recorded or sent
    #[error("consent required before sending")]
    ConsentRequired,
    /// Voice turns are switched off
    #[error("voice input is disabled")]
    VoiceDisabled,
    /// Webhook unreachable or failing; `apology` was added to the log
    #[error("{apology}")]
    Network { apology: String, reason: String },
}

struct Turn {
    logged: String,
    message: String,
    extract: bool,
    audio: Option<String>,
    anfrage: Option<Anfrage>,
}

/// One widget instance
#[derive(Debug)]
pub struct ChatWidget {
    config: Config,
    client: WebhookClient,
    durable: Arc<dyn KeyValueStore>,
    session_store: Arc<dyn KeyValueStore>,
    session: Session,
    consent: ConsentManager,
    history: HistoryStore,
    messages: MessageLog,
    contacts: ContactStore,
    lead: LeadScore,
    lead_reported: bool,
    open: bool,
}

impl ChatWidget {
    /// Create a widget with a fresh session
    ///
    /// Consent is resolved from `durable`; when granted, the message log and
    /// contact profile are restored from `session_store`.
    pub fn new(
        config: Config,
        client: WebhookClient,
        durable: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let consent = ConsentManager::load(&config, durable.as_ref());
        let history = HistoryStore::new(&config);
        let snapshot = history.load(consent.is_granted(), session_store.as_ref());

        let contacts = ContactStore::from_profile(snapshot.contacts);
        let mut lead = LeadScore::default();
        lead.sync_contact(contacts.contact_provided());

        let session = Session::new();
        tracing::info!(
            session_id = session.id(),
            consent = %consent.state(),
            restored = snapshot.messages.len(),
            "Widget initialised"
        );

        Self {
            config,
            client,
            durable,
            session_store,
            session,
            consent,
            history,
            messages: snapshot.messages,
            contacts,
            lead,
            lead_reported: false,
            open: false,
        }
    }

    /// Open the widget, or ask for consent first
    pub fn open(&mut self) -> OpenOutcome {
        if self.open {
            return OpenOutcome::Opened;
        }
        if self.consent.request_gate() {
            self.open = true;
            OpenOutcome::Opened
        } else {
            OpenOutcome::ConsentRequired
        }
    }

    /// Hide the widget; consent and conversation are untouched
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Close when open, otherwise behave like [`ChatWidget::open`]
    pub fn toggle(&mut self) -> OpenOutcome {
        if self.open {
            self.close();
            OpenOutcome::Closed
        } else {
            self.open()
        }
    }

    /// Whether the chat window is showing
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open on start only with auto-open configured and consent on record
    pub fn should_auto_open(&self) -> bool {
        self.config.widget.auto_open && self.consent.is_granted()
    }

    /// Grant consent and open the widget
    pub fn accept_consent(&mut self) {
        if !self.consent.request_gate() {
            if let Err(e) = self.consent.accept(self.durable.as_ref()) {
                tracing::warn!("Consent not accepted: {}", e);
                return;
            }
        }
        self.open = true;
        self.persist();
    }

    /// Refuse consent; the widget closes
    pub fn decline_consent(&mut self) -> Notice {
        if let Err(e) = self.consent.decline() {
            tracing::debug!("Decline outside of prompt: {}", e);
        }
        self.close();
        Notice::ConsentDeclined
    }

    /// Withdraw consent and delete every trace of the conversation
    ///
    /// In-memory state is cleared first so the caller never observes a
    /// partial purge; storage failures are logged.
    pub fn revoke_consent(&mut self) -> Notice {
        self.messages.clear();
        self.contacts.clear();
        self.lead = LeadScore::default();
        self.lead_reported = false;

        if let Err(e) = self.consent.revoke(self.durable.as_ref()) {
            tracing::warn!("Failed to delete consent record: {}", e);
        }
        if let Err(e) = self.history.clear(self.session_store.as_ref()) {
            tracing::warn!("Failed to delete stored history: {}", e);
        }

        self.close();
        Notice::DataDeleted
    }

    /// Re-check consent expiry
    pub fn refresh(&mut self) -> ConsentState {
        self.consent.refresh()
    }

    /// Forget messages and contacts; consent is kept
    ///
    /// The lead's contact flag goes with the contacts, so a later
    /// qualified-lead notification needs fresh contact data.
    pub fn clear_history(&mut self) -> Notice {
        self.messages.clear();
        self.contacts.clear();
        self.lead.forget_contact();
        self.lead_reported = false;
        if let Err(e) = self.history.clear(self.session_store.as_ref()) {
            tracing::warn!("Failed to delete stored history: {}", e);
        }
        Notice::HistoryCleared
    }

    /// Switch the input mode; voice is refused when disabled
    pub fn switch_mode(&mut self, mode: ChatMode) -> bool {
        if mode == ChatMode::Voice && !self.config.widget.enable_voice {
            return false;
        }
        self.session.set_mode(mode);
        true
    }

    /// Current input mode
    pub fn mode(&self) -> ChatMode {
        self.session.mode()
    }

    /// Send a typed message
    pub async fn send_message(&mut self, text: &str) -> Result<TurnReply, TurnError> {
        let text = text.trim();
        self.run_turn(Turn {
            logged: text.to_string(),
            message: text.to_string(),
            extract: true,
            audio: None,
            anfrage: None,
        })
        .await
    }

    /// Send one of the canned quick-action prompts
    pub async fn quick_action(&mut self, label: &str) -> Result<TurnReply, TurnError> {
        let label = label.trim();
        self.run_turn(Turn {
            logged: label.to_string(),
            message: label.to_string(),
            extract: false,
            audio: None,
            anfrage: None,
        })
        .await
    }

    /// Send a recorded voice message
    pub async fn send_voice(&mut self, audio: &[u8]) -> Result<TurnReply, TurnError> {
        if !self.config.widget.enable_voice {
            return Err(TurnError::VoiceDisabled);
        }
        if audio.is_empty() {
            return Err(TurnError::EmptyInput);
        }
        self.run_turn(Turn {
            logged: VOICE_LABEL.to_string(),
            message: VOICE_LABEL.to_string(),
            extract: false,
            audio: Some(encode_audio(audio)),
            anfrage: None,
        })
        .await
    }

    /// Send a structured request from an intent form
    pub async fn send_request(&mut self, request: &IntentRequest) -> Result<TurnReply, TurnError> {
        if request.kind.trim().is_empty() {
            return Err(TurnError::EmptyInput);
        }
        self.run_turn(Turn {
            logged: request.summary(),
            message: request.message.trim().to_string(),
            extract: true,
            audio: None,
            anfrage: Some(Anfrage::from(request)),
        })
        .await
    }

    async fn run_turn(&mut self, turn: Turn) -> Result<TurnReply, TurnError> {
        if turn.logged.is_empty() {
            return Err(TurnError::EmptyInput);
        }

        self.consent.refresh();
        if !self.consent.request_gate() {
            tracing::info!("Turn blocked pending consent");
            return Err(TurnError::ConsentRequired);
        }

        self.lead.record_message(&turn.logged);
        if turn.extract {
            let found = extract(&turn.message);
            if !found.is_empty() {
                tracing::debug!(?found, "Contact data detected");
            }
            self.contacts.absorb(&found);
            self.lead.sync_contact(self.contacts.contact_provided());
        }

        self.append(Message::user(turn.logged));
        let payload = self.build_payload(turn.message, turn.audio, turn.anfrage);

        match self.client.send(&payload).await {
            Ok(response) => {
                let message = match &response.reply {
                    BotReply::Text(text) => Message::bot(text.as_str()),
                    BotReply::Audio(url) => Message::bot_audio(url.as_str()),
                };
                self.append(message);

                if let Some(update) = &response.lead_update {
                    if self.lead.merge_update(update) {
                        self.report_qualified_lead().await;
                    }
                }

                Ok(TurnReply {
                    reply: response.reply,
                    action: response.action,
                    follow_up_intent: response.follow_up_intent,
                })
            }
            Err(e) => {
                tracing::error!(session_id = self.session.id(), "Webhook turn failed: {}", e);
                self.append(Message::bot(CONNECTION_ERROR));
                Err(TurnError::Network {
                    apology: CONNECTION_ERROR.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn build_payload(
        &self,
        message: String,
        audio_data: Option<String>,
        anfrage: Option<Anfrage>,
    ) -> OutboundPayload {
        let kontakt = self.contacts.profile().clone();
        let history = self.history.is_enabled().then(|| {
            self.messages
                .recent(self.config.history.context_window)
                .iter()
                .map(HistoryEntry::from)
                .collect()
        });

        OutboundPayload {
            meta: Meta {
                session_id: self.session.id().to_string(),
                timestamp: chrono::Utc::now(),
                mode: if audio_data.is_some() {
                    ChatMode::Voice
                } else {
                    ChatMode::Chat
                },
                dsgvo_consent: self.consent.is_granted(),
                source: self.config.webhook.source.clone(),
                has_contact_data: !kontakt.is_empty(),
                message_count: self.messages.len(),
                lead_score: self.lead.clone(),
            },
            kontakt,
            message,
            anfrage,
            history,
            audio_data,
        }
    }

    async fn report_qualified_lead(&mut self) {
        if self.lead_reported
            || !self
                .lead
                .is_qualified(self.config.lead.qualified_after_actions)
        {
            return;
        }

        let notification =
            LeadNotification::qualified(self.session.id(), self.contacts.profile(), &self.lead);
        match self.client.send_lead_notification(&notification).await {
            Ok(()) => self.lead_reported = true,
            Err(e) => tracing::warn!("Failed to send lead notification: {}", e),
        }
    }

    fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.history.save(
            self.consent.is_granted(),
            self.session_store.as_ref(),
            &self.messages,
            self.contacts.profile(),
        ) {
            tracing::warn!("History kept in memory only: {}", e);
        }
    }

    /// Session of this page load
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Conversation so far, oldest first
    pub fn messages(&self) -> &[Message] {
        self.messages.messages()
    }

    /// Contact data collected from the visitor's messages
    pub fn contacts(&self) -> &ContactProfile {
        self.contacts.profile()
    }

    /// Whether an email or phone number is on record
    pub fn contact_provided(&self) -> bool {
        self.contacts.contact_provided()
    }

    /// Lead signals gathered this session
    pub fn lead_score(&self) -> &LeadScore {
        &self.lead
    }

    /// Consent state as of the last check
    pub fn consent_state(&self) -> ConsentState {
        self.consent.state()
    }

    /// Whether gated actions are currently allowed
    pub fn consent_granted(&self) -> bool {
        self.consent.is_granted()
    }

    /// Toast to show when the visitor tries to act without consent
    pub fn notice_for_consent(&self) -> Option<Notice> {
        (!self.consent.is_granted()).then_some(Notice::ConsentRequired)
    }

    /// Configuration the widget was built with
    pub fn config(&self) -> &Config {
        &self.config
    }
}
