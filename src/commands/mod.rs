/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive chat with the widget
- `run_send`: One turn, reply printed to stdout
- `run_extract`: Contact extraction only, no network
- `privacy`: Consent and page gate maintenance

The terminal plays the role of the page: it feeds raw input into
[`ChatWidget`](crate::widget::ChatWidget) and renders what comes back.
*/

use std::sync::Arc;

use colored::Colorize;

use crate::config::Config;
use crate::contact;
use crate::error::{DomassistError, Result};
use crate::storage::{KeyValueStore, MemoryStorage, SqliteStorage};
use crate::webhook::{ActionDirective, BotReply, WebhookClient};
use crate::widget::{ChatWidget, Notice, TurnError, TurnReply};

// Special commands parser for the REPL
pub mod special_commands;

// Consent and gate maintenance
pub mod privacy;

/// Build a widget over durable SQLite state and in-process session state
pub fn build_widget(config: Config) -> Result<(ChatWidget, Arc<SqliteStorage>)> {
    let durable = Arc::new(SqliteStorage::open(&config.storage)?);
    tracing::debug!(db = %durable.path().display(), "Durable state opened");

    let client = WebhookClient::from_config(&config.webhook)?;
    let session_store: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
    let widget = ChatWidget::new(config, client, durable.clone(), session_store);
    Ok((widget, durable))
}

/// Print the contact data found in `text` as pretty JSON
pub fn run_extract(text: &str) -> Result<()> {
    let profile = contact::extract(text);
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

/// Send a single message and print the reply
///
/// # Errors
///
/// Fails when consent is missing (and not accepted with
/// `accept_consent`), when the message is empty or when the webhook
/// cannot be reached. The user-facing text is printed before returning.
pub async fn run_send(config: Config, message: &str, accept_consent: bool) -> Result<()> {
    let (mut widget, _durable) = build_widget(config)?;

    if accept_consent && !widget.consent_granted() {
        widget.accept_consent();
    }

    let outcome = widget.send_message(message).await;
    let assistant = widget.config().widget.assistant_name.clone();
    match outcome {
        Ok(reply) => {
            print_reply(&assistant, &reply);
            Ok(())
        }
        Err(e) => Err(report_turn_error(e)),
    }
}

/// Print a turn failure and convert it to a process error
pub(crate) fn report_turn_error(error: TurnError) -> anyhow::Error {
    match error {
        TurnError::EmptyInput => {
            DomassistError::Validation("message must not be empty".into()).into()
        }
        TurnError::ConsentRequired => {
            eprintln!("{}", Notice::ConsentRequired.text().yellow());
            DomassistError::ConsentRequired("privacy notice not accepted".into()).into()
        }
        TurnError::VoiceDisabled => {
            DomassistError::Validation("voice input is disabled".into()).into()
        }
        TurnError::Network { apology, reason } => {
            eprintln!("{}", apology.red());
            DomassistError::Network(reason).into()
        }
    }
}

/// Render a successful turn
pub(crate) fn print_reply(assistant: &str, reply: &TurnReply) {
    match &reply.reply {
        BotReply::Text(text) => println!("{} {}", format!("{}:", assistant).cyan().bold(), text),
        BotReply::Audio(url) => println!("{} 🔊 {}", format!("{}:", assistant).cyan().bold(), url),
    }

    if let Some(action) = &reply.action {
        match action {
            ActionDirective::OpenCalendar(data) => {
                println!("{} {}", "📅 Kalender öffnen".green(), compact(data));
            }
            ActionDirective::SendEmail(data) => {
                println!("{} {}", "✉️  E-Mail senden".green(), compact(data));
            }
            ActionDirective::Redirect { url } => {
                println!("{} {}", "↪ Weiterleitung:".green(), url.underline());
            }
            ActionDirective::Unknown { .. } => {}
        }
    }

    if let Some(intent) = &reply.follow_up_intent {
        println!(
            "{}",
            format!("Formular angefragt: /request {} <nachricht>", intent).dimmed()
        );
    }
}

fn compact(data: &serde_json::Value) -> String {
    if data.is_null() {
        String::new()
    } else {
        data.to_string()
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Runs the page gate, then a readline loop that relays every line to
    //! the widget. Lines starting with `/` are special commands.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::consent::ConsentState;
    use crate::gate::{GateStatus, PageGate};
    use crate::voice::{record, FileCapture};
    use crate::webhook::IntentRequest;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    const MAX_PIN_ATTEMPTS: usize = 3;

    /// Start interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `path` - Page path checked against the PIN gate
    pub async fn run_chat(config: Config, path: &str) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let gate = PageGate::new(&config.gate);
        let (mut widget, durable) = build_widget(config)?;
        let mut rl = DefaultEditor::new()?;

        unlock_gate(&gate, path, durable.as_ref(), &mut rl)?;

        print_welcome_banner(&widget);
        if !widget.consent_granted() {
            print_consent_prompt(&widget);
        }
        widget.open();

        loop {
            let prompt = format!("{} ", format!("[{}]>", widget.mode()).cyan());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().yellow());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            let outcome = widget.send_message(trimmed).await;
                            render_outcome(&widget, outcome);
                        }
                        other => handle_special(&mut widget, other).await,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        widget.close();
        println!("Auf Wiedersehen!");
        Ok(())
    }

    fn unlock_gate(
        gate: &PageGate,
        path: &str,
        durable: &dyn KeyValueStore,
        rl: &mut DefaultEditor,
    ) -> Result<()> {
        match gate.check(path, durable) {
            GateStatus::Locked => {}
            status => {
                tracing::debug!(?status, "Gate open");
                return Ok(());
            }
        }

        println!("{}", "🔒 Diese Seite ist geschützt. Bitte PIN eingeben.".yellow());
        for _ in 0..MAX_PIN_ATTEMPTS {
            let pin = match rl.readline("PIN> ") {
                Ok(pin) => pin,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            match gate.unlock(&pin, durable) {
                Ok(session) => {
                    println!(
                        "{}",
                        format!(
                            "✅ Freigeschaltet bis {}",
                            session.expiry.format("%d.%m.%Y %H:%M")
                        )
                        .green()
                    );
                    return Ok(());
                }
                Err(e) => eprintln!("{}", format!("❌ {}", e).red()),
            }
        }

        Err(DomassistError::Gate("page is locked".into()).into())
    }

    async fn handle_special(widget: &mut ChatWidget, command: SpecialCommand) {
        match command {
            SpecialCommand::AcceptConsent => {
                widget.accept_consent();
                println!("{}\n", "✅ Danke! Sie können jetzt schreiben.".green());
            }
            SpecialCommand::DeclineConsent => print_notice(widget.decline_consent()),
            SpecialCommand::RevokeConsent => print_notice(widget.revoke_consent()),
            SpecialCommand::ClearHistory => print_notice(widget.clear_history()),
            SpecialCommand::SwitchMode(mode) => {
                if widget.switch_mode(mode) {
                    println!("Modus: {}\n", mode);
                } else {
                    eprintln!("{}\n", "Spracheingabe ist deaktiviert.".yellow());
                }
            }
            SpecialCommand::Voice(path) => {
                let audio = match record(Box::new(FileCapture::new(&path))) {
                    Ok(audio) => audio,
                    Err(e) => {
                        eprintln!("{}\n", format!("❌ {}", e).red());
                        return;
                    }
                };
                let outcome = widget.send_voice(&audio).await;
                render_outcome(widget, outcome);
            }
            SpecialCommand::QuickAction(n) => {
                let label = widget.config().widget.quick_actions.get(n - 1).cloned();
                match label {
                    Some(label) => {
                        println!("{} {}", "Sie:".bold(), label);
                        let outcome = widget.quick_action(&label).await;
                        render_outcome(widget, outcome);
                    }
                    None => eprintln!("{}\n", format!("Keine Schnellaktion Nr. {}", n).yellow()),
                }
            }
            SpecialCommand::Request { kind, message } => {
                let request = IntentRequest {
                    kind,
                    message,
                    date: None,
                    time: None,
                };
                let outcome = widget.send_request(&request).await;
                render_outcome(widget, outcome);
            }
            SpecialCommand::ShowContacts => match serde_json::to_string_pretty(widget.contacts()) {
                Ok(json) => println!("{}\n", json),
                Err(e) => tracing::warn!("Failed to render contacts: {}", e),
            },
            SpecialCommand::ShowLead => match serde_json::to_string_pretty(widget.lead_score()) {
                Ok(json) => println!("{}\n", json),
                Err(e) => tracing::warn!("Failed to render lead score: {}", e),
            },
            SpecialCommand::ShowStatus => print_status_display(widget),
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
    }

    fn render_outcome(widget: &ChatWidget, outcome: std::result::Result<TurnReply, TurnError>) {
        match outcome {
            Ok(reply) => print_reply(&widget.config().widget.assistant_name, &reply),
            Err(TurnError::ConsentRequired) => {
                eprintln!("{}", Notice::ConsentRequired.text().yellow());
                print_consent_prompt(widget);
            }
            Err(TurnError::Network { apology, .. }) => eprintln!("{}", apology.red()),
            Err(TurnError::EmptyInput) => {}
            Err(TurnError::VoiceDisabled) => {
                eprintln!("{}", "Spracheingabe ist deaktiviert.".yellow())
            }
        }
        println!();
    }

    fn print_notice(notice: Notice) {
        if notice.is_success() {
            println!("{}\n", notice.text().green());
        } else {
            println!("{}\n", notice.text().yellow());
        }
    }

    fn print_welcome_banner(widget: &ChatWidget) {
        let settings = &widget.config().widget;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                 {:^28}                 ║", settings.assistant_name);
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("{}\n", settings.welcome_message);
        for (i, action) in settings.quick_actions.iter().enumerate() {
            println!("  /quick {}  {}", i + 1, action);
        }
        println!("\nType '/help' for available commands, 'exit' to quit\n");
    }

    fn print_consent_prompt(widget: &ChatWidget) {
        println!("{}", "🔐 Datenschutz".bold());
        println!(
            "Bevor wir starten, benötigen wir Ihre Zustimmung zur Verarbeitung Ihrer Daten ({}).",
            widget.config().widget.privacy_policy_url.underline()
        );
        println!("Mit {} zustimmen, mit {} ablehnen.\n", "/accept".cyan(), "/decline".cyan());
    }

    fn print_status_display(widget: &ChatWidget) {
        let consent = match widget.consent_state() {
            ConsentState::Granted => "granted".green(),
            ConsentState::Pending => "pending".yellow(),
            other => other.to_string().red(),
        };

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    DomAssist Session Status                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session:           {}", widget.session().id());
        println!("Mode:              {}", widget.mode());
        println!("Consent:           {}", consent);
        println!("Messages:          {}", widget.messages().len());
        println!("Contact Provided:  {}", widget.contact_provided());
        println!("Lead Actions:      {}", widget.lead_score().actions);
        println!();
    }
}
