//! `reelkit auth` handlers

use colored::Colorize;
use serde::Serialize;

use crate::auth::{Plan, RestoreOutcome};
use crate::cli::AuthCommand;
use crate::commands::{open_engine, print_json};
use crate::config::Config;
use crate::engine::MediaEngine;
use crate::error::Result;

/// Session summary printed by `auth status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// How startup restore ended
    pub restore: RestoreOutcome,
    /// Identity verified
    pub authenticated: bool,
    /// User id, when known
    pub user_id: Option<String>,
    /// Display name, when known
    pub name: Option<String>,
    /// Current plan
    pub plan: Plan,
    /// Remaining credits
    pub credits: u32,
}

impl StatusReport {
    /// Summarises the engine's session
    pub fn from_engine(engine: &MediaEngine, restore: RestoreOutcome) -> Self {
        let session = engine.session().snapshot();
        Self {
            restore,
            authenticated: session.is_authenticated,
            user_id: session.identity.as_ref().map(|i| i.id.clone()),
            name: session.identity.and_then(|i| i.name),
            plan: session.subscription.plan,
            credits: session.subscription.credits,
        }
    }
}

/// Handle auth commands
///
/// # Errors
///
/// Returns the login, storage, or serialization error.
pub async fn handle_auth(config: Config, command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::Login { token } => {
            let engine = MediaEngine::from_config(&config)?;
            let identity = engine.login(&token).await?;
            let session = engine.session().snapshot();
            println!(
                "{} {}",
                "Signed in as".green(),
                identity.name.as_deref().unwrap_or(identity.id.as_str()).bold()
            );
            println!(
                "Plan: {}  Credits: {}",
                session.subscription.plan, session.subscription.credits
            );
        }
        AuthCommand::Logout => {
            let engine = MediaEngine::from_config(&config)?;
            engine.logout();
            println!("{}", "Signed out.".green());
        }
        AuthCommand::Status { json } => {
            let (engine, restore) = open_engine(&config).await?;
            let report = StatusReport::from_engine(&engine, restore);
            if json {
                print_json(&report)?;
            } else {
                print_status(&report);
            }
        }
    }
    Ok(())
}

fn print_status(report: &StatusReport) {
    if report.authenticated {
        let who = report
            .name
            .as_deref()
            .or(report.user_id.as_deref())
            .unwrap_or("-");
        println!("{} {}", "Signed in as".green(), who.bold());
        println!("Plan:     {}", report.plan);
        println!("Credits:  {}", report.credits);
        return;
    }

    match report.restore {
        RestoreOutcome::Unverified => println!(
            "{}",
            "A token is stored but could not be verified (backend unreachable).".yellow()
        ),
        RestoreOutcome::Rejected => {
            println!("{}", "Stored token was rejected; signed out.".yellow())
        }
        RestoreOutcome::StorageUnavailable => {
            println!("{}", "Credential storage is unavailable.".red())
        }
        _ => println!("{}", "Not signed in.".yellow()),
    }
    println!("Use {} to sign in.", "reelkit auth login --token <TOKEN>".cyan());
}
