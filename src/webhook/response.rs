//! Inbound response classification

use crate::error::DomassistError;
use serde_json::Value;

use super::FALLBACK_REPLY;

/// What the bot says back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReply {
    Text(String),
    /// URL of an audio reply
    Audio(String),
}

impl BotReply {
    /// Text or URL carried by the reply
    pub fn content(&self) -> &str {
        match self {
            Self::Text(text) | Self::Audio(text) => text,
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio(_))
    }
}

/// Side effect requested by the webhook
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDirective {
    /// Open the booking calendar
    OpenCalendar(Value),
    /// Offer to compose an email
    SendEmail(Value),
    /// Navigate to `url`
    Redirect { url: String },
    /// Action tag this client does not know; logged and otherwise ignored
    Unknown { name: String, data: Value },
}

impl ActionDirective {
    fn parse(name: &str, data: Value) -> Option<Self> {
        match name {
            "open_calendar" => Some(Self::OpenCalendar(data)),
            "send_email" => Some(Self::SendEmail(data)),
            "redirect" => match data.get("url").and_then(Value::as_str) {
                Some(url) if !url.trim().is_empty() => Some(Self::Redirect {
                    url: url.to_string(),
                }),
                _ => {
                    tracing::warn!("Ignoring redirect action without url");
                    None
                }
            },
            other => {
                tracing::warn!(action = other, ?data, "Unknown webhook action");
                Some(Self::Unknown {
                    name: other.to_string(),
                    data,
                })
            }
        }
    }
}

/// Classified webhook reply
#[derive(Debug, Clone, PartialEq)]
pub struct InboundResponse {
    pub reply: BotReply,
    pub action: Option<ActionDirective>,
    /// Intent asking the front end to show a structured form
    pub follow_up_intent: Option<String>,
    /// Raw `leadUpdate` object
    pub lead_update: Option<Value>,
}

impl InboundResponse {
    /// Classify a 2xx response body
    ///
    /// # Errors
    ///
    /// A body that is not JSON is reported as `DomassistError::Network`.
    pub fn classify(body: &str) -> Result<Self, DomassistError> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            DomassistError::Network(format!("webhook response is not valid JSON: {}", e))
        })?;
        Ok(Self::from_value(&value))
    }

    /// Classify an already parsed body
    ///
    /// Reply text is the first non-empty of `response`, `message`, `text`,
    /// falling back to a fixed apology. `audioUrl` or `audio` turns the reply
    /// into an audio reply. `triggerTerminPopup: true` opens the calendar
    /// when no explicit `action` is given.
    pub fn from_value(value: &Value) -> Self {
        let text = first_string(value, &["response", "message", "text"]);
        let audio = first_string(value, &["audioUrl", "audio"]);

        let reply = match (audio, text) {
            (Some(url), _) => BotReply::Audio(url),
            (None, Some(text)) => BotReply::Text(text),
            (None, None) => BotReply::Text(FALLBACK_REPLY.to_string()),
        };

        let action = value
            .get("action")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .and_then(|name| {
                let data = value.get("actionData").cloned().unwrap_or(Value::Null);
                ActionDirective::parse(name, data)
            })
            .or_else(|| {
                value
                    .get("triggerTerminPopup")
                    .and_then(Value::as_bool)
                    .filter(|&popup| popup)
                    .map(|_| ActionDirective::OpenCalendar(Value::Null))
            });

        let response = Self {
            reply,
            action,
            follow_up_intent: first_string(value, &["intent"]),
            lead_update: value.get("leadUpdate").filter(|v| !v.is_null()).cloned(),
        };
        tracing::debug!(?response, "Classified webhook response");
        response
    }
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_field_precedence() {
        let r = InboundResponse::from_value(&json!({"message": "B", "response": "A", "text": "C"}));
        assert_eq!(r.reply, BotReply::Text("A".into()));

        let r = InboundResponse::from_value(&json!({"response": "", "text": "C"}));
        assert_eq!(r.reply, BotReply::Text("C".into()));
    }

    #[test]
    fn test_termin_popup_flag_opens_calendar() {
        let r = InboundResponse::from_value(&json!({
            "response": "Wann passt es Ihnen?",
            "triggerTerminPopup": true
        }));
        assert_eq!(r.action, Some(ActionDirective::OpenCalendar(Value::Null)));

        let r = InboundResponse::from_value(&json!({"response": "ok", "triggerTerminPopup": false}));
        assert!(r.action.is_none());

        let r = InboundResponse::from_value(&json!({
            "action": "send_email",
            "actionData": {"to": "info@example.com"},
            "triggerTerminPopup": true
        }));
        assert!(matches!(r.action, Some(ActionDirective::SendEmail(_))));
    }

    #[test]
    fn test_fallback_reply() {
        let r = InboundResponse::from_value(&json!({"status": "ok"}));
        assert_eq!(r.reply, BotReply::Text(FALLBACK_REPLY.into()));
        assert!(r.action.is_none());

        let r = InboundResponse::from_value(&json!(["not", "an", "object"]));
        assert_eq!(r.reply.content(), FALLBACK_REPLY);
    }

    #[test]
    fn test_audio_wins_over_text() {
        let r = InboundResponse::from_value(&json!({
            "response": "Hier ist die Antwort",
            "audio": "https://cdn.example.com/reply.mp3"
        }));
        assert!(r.reply.is_audio());
        assert_eq!(r.reply.content(), "https://cdn.example.com/reply.mp3");
    }

    #[test]
    fn test_actions() {
        let r = InboundResponse::from_value(&json!({
            "response": "Kalender",
            "action": "open_calendar",
            "actionData": {"slot": "morgen"}
        }));
        assert_eq!(
            r.action,
            Some(ActionDirective::OpenCalendar(json!({"slot": "morgen"})))
        );

        let r = InboundResponse::from_value(&json!({
            "action": "redirect",
            "actionData": {"url": "https://domassist.de/preise"}
        }));
        assert_eq!(
            r.action,
            Some(ActionDirective::Redirect {
                url: "https://domassist.de/preise".into()
            })
        );

        let r = InboundResponse::from_value(&json!({"action": "redirect"}));
        assert!(r.action.is_none());

        let r = InboundResponse::from_value(&json!({"action": "confetti"}));
        assert!(matches!(
            r.action,
            Some(ActionDirective::Unknown { ref name, .. }) if name == "confetti"
        ));
    }

    #[test]
    fn test_intent_and_lead_update() {
        let r = InboundResponse::from_value(&json!({
            "response": "Wann passt es Ihnen?",
            "intent": "termin",
            "leadUpdate": {"engagement": 3}
        }));
        assert_eq!(r.follow_up_intent.as_deref(), Some("termin"));
        assert_eq!(r.lead_update, Some(json!({"engagement": 3})));
    }

    #[test]
    fn test_non_json_body_is_network_error() {
        let err = InboundResponse::classify("<html>Bad Gateway</html>").unwrap_err();
        assert!(err.is_network());
    }
}
