//! `reelkit watermark` handlers

use colored::Colorize;

use crate::cli::WatermarkCommand;
use crate::commands::{open_engine, print_json};
use crate::config::Config;
use crate::error::Result;
use crate::media::MediaArtifact;

/// Handle watermark commands
///
/// The media at `--uri` becomes the engine's current media; a successful
/// removal is appended to its history and the new location printed.
///
/// # Errors
///
/// Returns the ownership, gate, backend, or serialization error.
pub async fn handle_watermark(config: Config, command: WatermarkCommand) -> Result<()> {
    let (engine, _) = open_engine(&config).await?;

    match command {
        WatermarkCommand::Detect {
            uri,
            media_type,
            confirm_ownership,
            json,
        } => {
            engine.set_media(MediaArtifact::new(uri, media_type))?;
            let verdict = engine.detect_watermark(confirm_ownership).await?;
            if json {
                print_json(&verdict)?;
            } else if verdict.detected {
                println!(
                    "{} (confidence {:.0}%)",
                    "Watermark detected".yellow(),
                    verdict.confidence * 100.0
                );
            } else {
                println!("{}", "No watermark detected".green());
            }
        }
        WatermarkCommand::Remove {
            uri,
            media_type,
            confirm_ownership,
            json,
        } => {
            engine.set_media(MediaArtifact::new(uri, media_type))?;
            let removal = engine.remove_watermark(confirm_ownership).await?;
            if json {
                print_json(&removal)?;
            } else {
                println!(
                    "{} {}",
                    "Cleaned media:".green(),
                    removal.artifact.source_uri.bold()
                );
                if removal.provenance_added {
                    println!("Provenance metadata embedded.");
                }
            }
        }
    }
    Ok(())
}
