//! Tabletalk - conversational CLI for a natural-language-to-SQL agent
//!
#![doc = "Main entry point for the Tabletalk client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tabletalk::cli::{Cli, Commands};
use tabletalk::commands;
use tabletalk::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { fresh } => {
            tracing::info!("Starting interactive chat");
            if fresh {
                tracing::debug!("Starting from a fresh session");
            }
            commands::chat::run_chat(config, fresh).await?;
            Ok(())
        }
        Commands::Upload { file } => {
            tracing::info!("Uploading {}", file.display());
            commands::db::run_upload(config, file).await?;
            Ok(())
        }
        Commands::Status => {
            commands::db::run_status(config).await?;
            Ok(())
        }
        Commands::ResetDb => {
            commands::db::run_reset_db(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "tabletalk=debug"
    } else {
        "tabletalk=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
