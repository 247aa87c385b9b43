//! Reelkit - media session engine CLI
//!
#![doc = "Main entry point for the Reelkit command-line client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelkit::cli::{Cli, Commands};
use reelkit::commands;
use reelkit::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Auth { command } => {
            tracing::debug!("Running auth command");
            commands::auth::handle_auth(config, command).await?;
            Ok(())
        }
        Commands::Generate { command } => {
            tracing::debug!(?command, "Running generate command");
            commands::generate::handle_generate(config, command).await?;
            Ok(())
        }
        Commands::Watermark { command } => {
            tracing::debug!(?command, "Running watermark command");
            commands::watermark::handle_watermark(config, command).await?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "reelkit=debug" } else { "reelkit=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
