//! Command-line interface definition for DomAssist
//!
//! This module defines the CLI structure using clap's derive API: an
//! interactive chat, one-shot sends, contact extraction and the consent
//! and page-gate maintenance commands.

use clap::{Parser, Subcommand};

/// DomAssist - chat assistant widget in the terminal
///
/// Relays conversation turns to the DomAssist webhook after the privacy
/// notice has been accepted, collecting contact details along the way.
#[derive(Parser, Debug, Clone)]
#[command(name = "domassist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the webhook URL from config
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for DomAssist
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat with the assistant
    Chat {
        /// Page path checked against the PIN gate
        #[arg(long, default_value = "/")]
        path: String,
    },

    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,

        /// Accept the privacy notice if it has not been accepted yet
        #[arg(long)]
        accept_consent: bool,
    },

    /// Print the contact data found in a text as JSON
    Extract {
        /// Free text to analyse
        text: String,
    },

    /// Inspect or withdraw the stored privacy consent
    Consent {
        #[command(subcommand)]
        command: ConsentCommand,
    },

    /// Manage the page-level PIN gate
    Gate {
        #[command(subcommand)]
        command: GateCommand,
    },
}

/// Consent subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConsentCommand {
    /// Show the stored consent record
    Status,
    /// Withdraw consent and delete stored data
    Revoke,
}

/// Page gate subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GateCommand {
    /// Show whether a path is open
    Status {
        /// Page path to check
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Unlock with a PIN
    Unlock {
        #[arg(long)]
        pin: String,
    },
    /// End the unlocked session
    Logout,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            webhook_url: None,
            command: Commands::Chat {
                path: "/".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.webhook_url.is_none());
        assert!(matches!(cli.command, Commands::Chat { ref path } if path == "/"));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["domassist", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { .. }));
    }

    #[test]
    fn test_cli_parse_send() {
        let cli = Cli::try_parse_from([
            "domassist",
            "--verbose",
            "send",
            "Hallo DomAssist",
            "--accept-consent",
        ])
        .unwrap();
        assert!(cli.verbose);
        if let Commands::Send {
            message,
            accept_consent,
        } = cli.command
        {
            assert_eq!(message, "Hallo DomAssist");
            assert!(accept_consent);
        } else {
            panic!("Expected Send command");
        }
    }

    #[test]
    fn test_cli_parse_send_requires_message() {
        assert!(Cli::try_parse_from(["domassist", "send"]).is_err());
    }

    #[test]
    fn test_cli_parse_extract() {
        let cli = Cli::try_parse_from(["domassist", "extract", "Frau Anna Schmidt"]).unwrap();
        assert!(matches!(cli.command, Commands::Extract { ref text } if text == "Frau Anna Schmidt"));
    }

    #[test]
    fn test_cli_parse_consent_and_gate() {
        let cli = Cli::try_parse_from(["domassist", "consent", "revoke"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Consent {
                command: ConsentCommand::Revoke
            }
        ));

        let cli = Cli::try_parse_from(["domassist", "gate", "unlock", "--pin", "1234"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Gate {
                command: GateCommand::Unlock { ref pin }
            } if pin == "1234"
        ));

        let cli =
            Cli::try_parse_from(["domassist", "gate", "status", "--path", "/impressum"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Gate {
                command: GateCommand::Status { ref path }
            } if path == "/impressum"
        ));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "domassist",
            "--json-logs",
            "--webhook-url",
            "http://localhost:5678/webhook/x",
            "-c",
            "custom.yaml",
            "consent",
            "status",
        ])
        .unwrap();
        assert!(cli.json_logs);
        assert_eq!(
            cli.webhook_url.as_deref(),
            Some("http://localhost:5678/webhook/x")
        );
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    }
}
