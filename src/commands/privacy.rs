//! Consent and page gate maintenance commands

use crate::cli::{ConsentCommand, GateCommand};
use crate::config::Config;
use crate::consent::{ConsentManager, ConsentState};
use crate::error::Result;
use crate::gate::{GateStatus, PageGate};
use crate::history::HistoryStore;
use crate::storage::SqliteStorage;
use crate::widget::Notice;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle `consent` subcommands
pub fn handle_consent(config: &Config, command: ConsentCommand) -> Result<()> {
    let storage = SqliteStorage::open(&config.storage)?;
    let mut consent = ConsentManager::load(config, &storage);

    match command {
        ConsentCommand::Status => {
            let state = match consent.state() {
                ConsentState::Granted => "granted".green(),
                other => other.to_string().yellow(),
            };

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row!["Field".bold(), "Value".bold()]);
            table.add_row(prettytable::row!["State", state]);
            table.add_row(prettytable::row!["Required", consent.is_required()]);

            match consent.record() {
                Some(record) => {
                    table.add_row(prettytable::row![
                        "Granted At",
                        record.granted_at.format("%Y-%m-%d %H:%M").to_string()
                    ]);
                    table.add_row(prettytable::row![
                        "Expires At",
                        record.expires_at.format("%Y-%m-%d %H:%M").to_string().cyan()
                    ]);
                }
                None => {
                    table.add_row(prettytable::row!["Record", "-"]);
                }
            }

            println!("\nPrivacy Consent:");
            table.printstd();
            println!();
        }
        ConsentCommand::Revoke => {
            consent.revoke(&storage)?;
            HistoryStore::new(config).clear(&storage)?;
            tracing::info!("Consent revoked from CLI");
            println!("{}", Notice::DataDeleted.text().green());
        }
    }

    Ok(())
}

/// Handle `gate` subcommands
pub fn handle_gate(config: &Config, command: GateCommand) -> Result<()> {
    let storage = SqliteStorage::open(&config.storage)?;
    let gate = PageGate::new(&config.gate);

    match command {
        GateCommand::Status { path } => {
            let status = match gate.check(&path, &storage) {
                GateStatus::Disabled => "disabled".normal(),
                GateStatus::Allowlisted => "allowlisted".green(),
                GateStatus::Unlocked { expires_at } => {
                    format!("unlocked until {}", expires_at.format("%Y-%m-%d %H:%M")).green()
                }
                GateStatus::Locked => "locked".red(),
            };
            println!("{}: {}", path.cyan(), status);
        }
        GateCommand::Unlock { pin } => {
            let session = gate.unlock(&pin, &storage)?;
            println!(
                "{}",
                format!(
                    "✅ Unlocked until {}",
                    session.expiry.format("%Y-%m-%d %H:%M")
                )
                .green()
            );
        }
        GateCommand::Logout => {
            gate.logout(&storage)?;
            println!("{}", "🔒 Gate session ended".yellow());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatePin;
    use crate::storage::KeyValueStore;
    use crate::test_utils::test_config;
    use base64::Engine as _;

    #[test]
    fn test_consent_revoke_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), "http://127.0.0.1:9/webhook");
        {
            let storage = SqliteStorage::open(&config.storage).unwrap();
            let mut consent = ConsentManager::load(&config, &storage);
            assert!(consent.request_gate());
            consent.accept(&storage).unwrap();
        }

        handle_consent(&config, ConsentCommand::Status).unwrap();
        handle_consent(&config, ConsentCommand::Revoke).unwrap();

        let storage = SqliteStorage::open(&config.storage).unwrap();
        assert!(storage.get(&config.consent.storage_key).unwrap().is_none());
        assert_eq!(
            ConsentManager::load(&config, &storage).state(),
            ConsentState::NoConsent
        );
    }

    #[test]
    fn test_gate_unlock_and_logout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path(), "http://127.0.0.1:9/webhook");
        config.gate.enabled = true;
        config.gate.pins = vec![GatePin {
            encoded: base64::engine::general_purpose::STANDARD.encode("2468"),
            label: "team".into(),
        }];

        assert!(handle_gate(&config, GateCommand::Unlock { pin: "1111".into() }).is_err());
        handle_gate(&config, GateCommand::Unlock { pin: "2468".into() }).unwrap();

        let storage = SqliteStorage::open(&config.storage).unwrap();
        let gate = PageGate::new(&config.gate);
        assert!(matches!(
            gate.check("/", &storage),
            GateStatus::Unlocked { .. }
        ));
        drop(storage);

        handle_gate(&config, GateCommand::Logout).unwrap();
        let storage = SqliteStorage::open(&config.storage).unwrap();
        assert_eq!(gate.check("/", &storage), GateStatus::Locked);
    }
}
