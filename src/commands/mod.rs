/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`: login, logout, and session status
- `generate`: AI generation operations
- `watermark`: watermark detection and removal

Every handler builds a [`MediaEngine`] from configuration and restores the
stored session before doing anything that needs it.
*/

use serde::Serialize;

use crate::auth::RestoreOutcome;
use crate::config::Config;
use crate::engine::MediaEngine;
use crate::error::{ReelkitError, Result};

pub mod auth;
pub mod generate;
pub mod watermark;

/// Builds the engine and restores the stored session
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub async fn open_engine(config: &Config) -> Result<(MediaEngine, RestoreOutcome)> {
    let engine = MediaEngine::from_config(config)?;
    let outcome = engine.restore().await;
    tracing::debug!(?outcome, "Session restore finished");
    Ok((engine, outcome))
}

/// Prints `value` as pretty JSON on stdout
///
/// # Errors
///
/// Returns [`ReelkitError::Serialization`] if `value` cannot be serialized.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(ReelkitError::Serialization)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_json_accepts_slices() {
        let tags = ["#a".to_string(), "#b".to_string()];
        assert!(print_json(&tags[..]).is_ok());
    }
}
