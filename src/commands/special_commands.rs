//! Special commands parser for the interactive chat
//!
//! Special commands drive the widget instead of being sent to the webhook:
//! - Accept, decline or revoke consent
//! - Clear the conversation
//! - Switch between chat and voice mode, send a voice recording
//! - Send a quick action or a structured request
//! - Inspect contacts, lead score and session status
//!
//! Commands are prefixed with `/`; the command word is case-insensitive,
//! arguments keep their case.

use std::path::PathBuf;

use crate::session::ChatMode;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Accept the privacy notice
    AcceptConsent,

    /// Decline the privacy notice
    DeclineConsent,

    /// Withdraw consent and delete all data
    RevokeConsent,

    /// Clear messages and contacts, keep consent
    ClearHistory,

    /// Switch the input mode
    SwitchMode(ChatMode),

    /// Send the audio file at the path as a voice message
    Voice(PathBuf),

    /// Send the n-th configured quick action (1-based)
    QuickAction(usize),

    /// Send a structured request of the given type
    Request { kind: String, message: String },

    /// Show the collected contact profile
    ShowContacts,

    /// Show the lead score
    ShowLead,

    /// Show session and consent status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input as a message
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not
/// a valid command, `UnsupportedArgument` or `MissingArgument` for bad
/// arguments.
///
/// # Examples
///
/// ```
/// use domassist::commands::special_commands::{parse_special_command, SpecialCommand};
/// use domassist::session::ChatMode;
///
/// let cmd = parse_special_command("/mode voice").unwrap();
/// assert_eq!(cmd, SpecialCommand::SwitchMode(ChatMode::Voice));
///
/// let cmd = parse_special_command("Hallo, ich habe eine Frage").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, arg)) => (word.to_lowercase(), arg.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/accept" => Ok(SpecialCommand::AcceptConsent),
        "/decline" => Ok(SpecialCommand::DeclineConsent),
        "/revoke" => Ok(SpecialCommand::RevokeConsent),
        "/clear" => Ok(SpecialCommand::ClearHistory),
        "/contacts" => Ok(SpecialCommand::ShowContacts),
        "/lead" => Ok(SpecialCommand::ShowLead),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        "/mode" => {
            if arg.is_empty() {
                return Err(missing("/mode", "/mode <chat|voice>"));
            }
            arg.parse::<ChatMode>()
                .map(SpecialCommand::SwitchMode)
                .map_err(|_| unsupported("/mode", arg))
        }

        "/voice" => {
            if arg.is_empty() {
                return Err(missing("/voice", "/voice <audio-file>"));
            }
            Ok(SpecialCommand::Voice(PathBuf::from(arg)))
        }

        "/quick" => {
            if arg.is_empty() {
                return Err(missing("/quick", "/quick <number>"));
            }
            match arg.parse::<usize>() {
                Ok(n) if n > 0 => Ok(SpecialCommand::QuickAction(n)),
                _ => Err(unsupported("/quick", arg)),
            }
        }

        "/request" => {
            let usage = "/request <type> <message>";
            let Some((kind, message)) = arg.split_once(char::is_whitespace) else {
                return Err(missing("/request", usage));
            };
            if message.trim().is_empty() {
                return Err(missing("/request", usage));
            }
            Ok(SpecialCommand::Request {
                kind: kind.to_lowercase(),
                message: message.trim().to_string(),
            })
        }

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn unsupported(command: &str, arg: &str) -> CommandError {
    CommandError::UnsupportedArgument {
        command: command.to_string(),
        arg: arg.to_string(),
    }
}

/// Print help for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

PRIVACY:
  /accept         - Accept the privacy notice and start chatting
  /decline        - Decline the privacy notice
  /revoke         - Withdraw consent and delete all stored data

CONVERSATION:
  /clear          - Clear the chat history (consent is kept)
  /quick <n>      - Send quick action number n
  /request <type> <message>
                  - Send a structured request, e.g. /request termin Beratung am Montag
  /mode chat      - Switch to text input
  /mode voice     - Switch to voice input
  /voice <file>   - Send an audio file as a voice message

SESSION INFORMATION:
  /contacts       - Show the contact data collected so far
  /lead           - Show the lead score
  /status         - Show session, consent and mode
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  /exit, exit     - Exit interactive mode
  /quit, quit     - Same as exit

NOTES:
  - Command words are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - Nothing is sent before the privacy notice is accepted
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_text_is_none() {
        assert_eq!(
            parse_special_command("Was kostet das Business Paket?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_exit_aliases() {
        for input in ["exit", "QUIT", "/exit", "/quit"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_consent_commands() {
        assert_eq!(
            parse_special_command("/ACCEPT").unwrap(),
            SpecialCommand::AcceptConsent
        );
        assert_eq!(
            parse_special_command("/decline").unwrap(),
            SpecialCommand::DeclineConsent
        );
        assert_eq!(
            parse_special_command("/revoke").unwrap(),
            SpecialCommand::RevokeConsent
        );
    }

    #[test]
    fn test_mode_switch() {
        assert_eq!(
            parse_special_command("/mode chat").unwrap(),
            SpecialCommand::SwitchMode(ChatMode::Chat)
        );
        assert!(matches!(
            parse_special_command("/mode"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/mode video"),
            Err(CommandError::UnsupportedArgument { ref arg, .. }) if arg == "video"
        ));
    }

    #[test]
    fn test_voice_keeps_path_case() {
        assert_eq!(
            parse_special_command("/Voice Recordings/Frage.webm").unwrap(),
            SpecialCommand::Voice(PathBuf::from("Recordings/Frage.webm"))
        );
        assert!(parse_special_command("/voice").is_err());
    }

    #[test]
    fn test_quick_action_index() {
        assert_eq!(
            parse_special_command("/quick 2").unwrap(),
            SpecialCommand::QuickAction(2)
        );
        assert!(parse_special_command("/quick 0").is_err());
        assert!(parse_special_command("/quick zwei").is_err());
    }

    #[test]
    fn test_request() {
        assert_eq!(
            parse_special_command("/request Termin Beratung am Montag").unwrap(),
            SpecialCommand::Request {
                kind: "termin".into(),
                message: "Beratung am Montag".into()
            }
        );
        assert!(parse_special_command("/request termin").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_special_command("/models").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/models".into()));
        assert!(err.to_string().contains("/help"));
    }
}
