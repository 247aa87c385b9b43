//! Command-line interface definition for Reelkit
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for authentication, AI generation, and watermark
//! handling.

use clap::{Parser, Subcommand};

use crate::generation::{Platform, Tone};
use crate::media::MediaKind;

/// Reelkit - media session engine for short-form content
///
/// Sign in, then generate captions, hashtags, and analyses for your media.
#[derive(Parser, Debug, Clone)]
#[command(name = "reelkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "REELKIT_CONFIG", default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Keep the auth token in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Reelkit
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage the signed-in session
    Auth {
        /// Auth subcommand
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Generate content with the AI engine
    Generate {
        /// Generation subcommand
        #[command(subcommand)]
        command: GenerateCommand,
    },

    /// Detect or remove watermarks
    Watermark {
        /// Watermark subcommand
        #[command(subcommand)]
        command: WatermarkCommand,
    },
}

/// Session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Verify a token and store it
    Login {
        /// Bearer token issued by the account service
        #[arg(long, env = "REELKIT_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Forget the stored token
    Logout,

    /// Show who is signed in and the remaining credits
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Generation subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum GenerateCommand {
    /// One caption
    Caption {
        /// Description of the content
        content: String,

        /// Target platform (defaults to the configured one)
        #[arg(short, long)]
        platform: Option<Platform>,

        /// Caption tone (defaults to the configured one)
        #[arg(short, long)]
        tone: Option<Tone>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Several alternative captions
    Variations {
        /// Description of the content
        content: String,

        /// Target platform
        #[arg(short, long)]
        platform: Option<Platform>,

        /// How many variations
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Hashtags
    Hashtags {
        /// Description of the content
        content: String,

        /// Target platform
        #[arg(short, long)]
        platform: Option<Platform>,

        /// How many hashtags
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score the content
    Analyze {
        /// Description of the content
        content: String,

        /// Media type (image, video)
        #[arg(short, long, default_value = "video")]
        media_type: MediaKind,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Content ideas for a niche
    Suggestions {
        /// Niche, e.g. "travel"
        niche: String,

        /// Target platform
        #[arg(short, long)]
        platform: Option<Platform>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Best times to post
    PostingTimes {
        /// Target platform
        #[arg(short, long)]
        platform: Option<Platform>,

        /// Timezone (defaults to the configured one)
        #[arg(long)]
        timezone: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Captions, hashtags, and analysis at once
    All {
        /// Description of the content
        content: String,

        /// Target platform
        #[arg(short, long)]
        platform: Option<Platform>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Watermark subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum WatermarkCommand {
    /// Check media for a watermark
    Detect {
        /// Media location
        #[arg(long)]
        uri: String,

        /// Media type (image, video)
        #[arg(short, long, default_value = "image")]
        media_type: MediaKind,

        /// Confirm you own the media
        #[arg(long)]
        confirm_ownership: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a watermark from media you own
    Remove {
        /// Media location
        #[arg(long)]
        uri: String,

        /// Media type (image, video)
        #[arg(short, long, default_value = "image")]
        media_type: MediaKind,

        /// Confirm you own the media
        #[arg(long)]
        confirm_ownership: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_auth_status() {
        let cli = Cli::try_parse_from(["reelkit", "auth", "status", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth {
                command: AuthCommand::Status { json: true }
            }
        ));
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
    }

    #[test]
    fn test_cli_parse_login_token() {
        let cli = Cli::try_parse_from(["reelkit", "auth", "login", "--token", "abc"]).unwrap();
        if let Commands::Auth {
            command: AuthCommand::Login { token },
        } = cli.command
        {
            assert_eq!(token, "abc");
        } else {
            panic!("Expected Login command");
        }
    }

    #[test]
    fn test_cli_parse_generate_hashtags() {
        let cli = Cli::try_parse_from([
            "reelkit",
            "generate",
            "hashtags",
            "sunset timelapse",
            "--platform",
            "instagram-reels",
            "-n",
            "5",
        ])
        .unwrap();
        if let Commands::Generate {
            command:
                GenerateCommand::Hashtags {
                    content,
                    platform,
                    count,
                    json,
                },
        } = cli.command
        {
            assert_eq!(content, "sunset timelapse");
            assert_eq!(platform, Some(Platform::InstagramReels));
            assert_eq!(count, Some(5));
            assert!(!json);
        } else {
            panic!("Expected Hashtags command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_platform() {
        let result =
            Cli::try_parse_from(["reelkit", "generate", "all", "x", "--platform", "myspace"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_watermark_remove_defaults() {
        let cli = Cli::try_parse_from([
            "reelkit",
            "--ephemeral",
            "watermark",
            "remove",
            "--uri",
            "file:///a.jpg",
        ])
        .unwrap();
        assert!(cli.ephemeral);
        if let Commands::Watermark {
            command:
                WatermarkCommand::Remove {
                    uri,
                    media_type,
                    confirm_ownership,
                    ..
                },
        } = cli.command
        {
            assert_eq!(uri, "file:///a.jpg");
            assert_eq!(media_type, MediaKind::Image);
            assert!(!confirm_ownership);
        } else {
            panic!("Expected Remove command");
        }
    }
}
