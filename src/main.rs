//! DomAssist - chat assistant widget in the terminal
//!
#![doc = "DomAssist - chat assistant widget in the terminal"]
#![doc = "Main entry point for the DomAssist application."]

use anyhow::Result;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domassist::cli::{Cli, Commands};
use domassist::commands;
use domassist::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { path } => {
            tracing::info!("Starting interactive chat mode");
            commands::chat::run_chat(config, &path).await?;
            Ok(())
        }
        Commands::Send {
            message,
            accept_consent,
        } => {
            tracing::debug!(accept_consent, "Sending single message");
            commands::run_send(config, &message, accept_consent).await?;
            Ok(())
        }
        Commands::Extract { text } => {
            commands::run_extract(&text)?;
            Ok(())
        }
        Commands::Consent { command } => {
            tracing::info!("Starting consent command");
            commands::privacy::handle_consent(&config, command)?;
            Ok(())
        }
        Commands::Gate { command } => {
            tracing::info!("Starting gate command");
            commands::privacy::handle_gate(&config, command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays machine readable.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "domassist=debug"
    } else {
        "domassist=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
