//! `reelkit generate` handlers

use colored::Colorize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::GenerateCommand;
use crate::commands::{open_engine, print_json};
use crate::config::Config;
use crate::error::Result;
use crate::generation::{ContentAnalysis, GenerateAllReport};

/// Handle generate commands
///
/// # Errors
///
/// Returns the gate, backend, or serialization error of the operation.
pub async fn handle_generate(config: Config, command: GenerateCommand) -> Result<()> {
    let (engine, _) = open_engine(&config).await?;
    let orchestrator = engine.orchestrator();
    let defaults = orchestrator.defaults().clone();

    match command {
        GenerateCommand::Caption {
            content,
            platform,
            tone,
            json,
        } => {
            let caption = orchestrator
                .generate_caption(
                    &content,
                    platform.unwrap_or(defaults.default_platform),
                    tone.unwrap_or(defaults.tone),
                )
                .await?;
            if json {
                print_json(&caption)?;
            } else {
                println!("{}", caption.caption);
            }
        }
        GenerateCommand::Variations {
            content,
            platform,
            count,
            json,
        } => {
            let variations = orchestrator
                .generate_caption_variations(
                    &content,
                    platform.unwrap_or(defaults.default_platform),
                    count.unwrap_or(defaults.caption_variations),
                )
                .await?;
            if json {
                print_json(&variations)?;
            } else {
                print_numbered(&variations.variations);
            }
        }
        GenerateCommand::Hashtags {
            content,
            platform,
            count,
            json,
        } => {
            let hashtags = orchestrator
                .generate_hashtags(
                    &content,
                    platform.unwrap_or(defaults.default_platform),
                    count.unwrap_or(defaults.hashtag_count),
                )
                .await?;
            if json {
                print_json(&hashtags)?;
            } else {
                println!("{}", hashtags.hashtags.join(" ").cyan());
            }
        }
        GenerateCommand::Analyze {
            content,
            media_type,
            json,
        } => {
            let analysis = orchestrator.analyze_content(&content, media_type).await?;
            if json {
                print_json(&analysis)?;
            } else {
                print_analysis(&analysis);
            }
        }
        GenerateCommand::Suggestions {
            niche,
            platform,
            json,
        } => {
            let suggestions = orchestrator
                .get_content_suggestions(&niche, platform.unwrap_or(defaults.default_platform))
                .await?;
            if json {
                print_json(&suggestions)?;
            } else {
                print_numbered(&suggestions.suggestions);
            }
        }
        GenerateCommand::PostingTimes {
            platform,
            timezone,
            json,
        } => {
            let timezone = timezone.unwrap_or(defaults.timezone);
            let times = orchestrator
                .get_best_posting_times(platform.unwrap_or(defaults.default_platform), &timezone)
                .await?;
            if json {
                print_json(&times)?;
            } else {
                println!(
                    "Best times ({}):",
                    times.timezone.as_deref().unwrap_or(&timezone)
                );
                print_numbered(&times.best_times);
            }
        }
        GenerateCommand::All {
            content,
            platform,
            json,
        } => {
            let cancel = CancellationToken::new();
            let watcher = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupted; cancelling outstanding requests");
                    watcher.cancel();
                }
            });

            let report = engine
                .generate_all_for_description(
                    &content,
                    platform.unwrap_or(defaults.default_platform),
                    &cancel,
                )
                .await;

            if json {
                print_json(&AllOutput::from(&report))?;
            } else {
                print_all(&report);
            }
            if report_is_empty(&report) {
                if let Err(e) = report.captions {
                    return Err(e);
                }
            }
        }
    }
    Ok(())
}

/// JSON shape for `generate all`: each part is either its value or an error string
#[derive(Debug, Serialize)]
struct AllOutput<'a> {
    captions: PartOutput<'a, Vec<String>>,
    hashtags: PartOutput<'a, Vec<String>>,
    analysis: PartOutput<'a, ContentAnalysis>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum PartOutput<'a, T> {
    Ok(&'a T),
    Error(String),
}

impl<'a, T> PartOutput<'a, T> {
    fn new<U>(result: &'a Result<U>, project: impl FnOnce(&'a U) -> &'a T) -> Self {
        match result {
            Ok(value) => Self::Ok(project(value)),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

impl<'a> From<&'a GenerateAllReport> for AllOutput<'a> {
    fn from(report: &'a GenerateAllReport) -> Self {
        Self {
            captions: PartOutput::new(&report.captions, |c| &c.variations),
            hashtags: PartOutput::new(&report.hashtags, |h| &h.hashtags),
            analysis: PartOutput::new(&report.analysis, |a| a),
        }
    }
}

fn report_is_empty(report: &GenerateAllReport) -> bool {
    report.captions.is_err() && report.hashtags.is_err() && report.analysis.is_err()
}

fn print_numbered(items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        println!("{:>2}. {}", i + 1, item);
    }
}

fn print_analysis(analysis: &ContentAnalysis) {
    println!("Score: {}", format!("{:.0}", analysis.score).bold());
    for s in &analysis.strengths {
        println!("  {} {}", "+".green(), s);
    }
    for s in &analysis.improvements {
        println!("  {} {}", "-".yellow(), s);
    }
}

fn print_all(report: &GenerateAllReport) {
    println!("\n{}", "Captions".bold());
    match &report.captions {
        Ok(c) => print_numbered(&c.variations),
        Err(e) => println!("  {}", e.to_string().red()),
    }

    println!("\n{}", "Hashtags".bold());
    match &report.hashtags {
        Ok(h) => println!("  {}", h.hashtags.join(" ").cyan()),
        Err(e) => println!("  {}", e.to_string().red()),
    }

    println!("\n{}", "Analysis".bold());
    match &report.analysis {
        Ok(a) => print_analysis(a),
        Err(e) => println!("  {}", e.to_string().red()),
    }
    println!();
}
