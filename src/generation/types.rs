//! Typed views of AI engine requests and results

use serde::{Deserialize, Serialize};

use crate::error::ReelkitError;
use crate::media::MediaArtifact;

/// Target platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// YouTube Shorts
    YoutubeShorts,
    /// Instagram Reels
    InstagramReels,
    /// TikTok
    Tiktok,
    /// Regular YouTube upload
    Youtube,
    /// Instagram feed post
    Instagram,
}

impl Platform {
    /// Wire identifier
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YoutubeShorts => "youtube_shorts",
            Self::InstagramReels => "instagram_reels",
            Self::Tiktok => "tiktok",
            Self::Youtube => "youtube",
            Self::Instagram => "instagram",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = ReelkitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "youtube_shorts" => Ok(Self::YoutubeShorts),
            "instagram_reels" => Ok(Self::InstagramReels),
            "tiktok" => Ok(Self::Tiktok),
            "youtube" => Ok(Self::Youtube),
            "instagram" => Ok(Self::Instagram),
            other => Err(ReelkitError::InvalidInput(format!(
                "Unknown platform: {}",
                other
            ))),
        }
    }
}

/// Caption voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Relaxed, conversational
    #[default]
    Casual,
    /// Polished
    Professional,
    /// Playful
    Funny,
    /// Uplifting
    Inspirational,
}

impl std::str::FromStr for Tone {
    type Err = ReelkitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "casual" => Ok(Self::Casual),
            "professional" => Ok(Self::Professional),
            "funny" => Ok(Self::Funny),
            "inspirational" => Ok(Self::Inspirational),
            other => Err(ReelkitError::InvalidInput(format!("Unknown tone: {}", other))),
        }
    }
}

/// Single generated caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    /// Caption text
    pub caption: String,
}

/// Alternative captions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptionVariations {
    /// Caption texts
    #[serde(default)]
    pub variations: Vec<String>,
}

/// Generated hashtags
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hashtags {
    /// Tags, including the leading `#`
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Suggested posting windows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingTimes {
    /// Timezone the windows are expressed in
    #[serde(default)]
    pub timezone: Option<String>,
    /// Human-readable windows, best first
    #[serde(default)]
    pub best_times: Vec<String>,
}

/// Content quality assessment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// Overall score
    #[serde(default)]
    pub score: f64,
    /// What works
    #[serde(default)]
    pub strengths: Vec<String>,
    /// What to change
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalysisEnvelope {
    pub(crate) analysis: ContentAnalysis,
}

/// Content ideas for a niche
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentSuggestions {
    /// Ideas
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Watermark detection verdict
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WatermarkDetection {
    /// A watermark was found
    pub detected: bool,
    /// Detector confidence in `[0, 1]`
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemovalResponse {
    pub(crate) media_url: String,
    #[serde(default)]
    pub(crate) provenance_added: bool,
}

/// Result of a watermark removal
///
/// The artifact is not yet part of any history; the caller folds it in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkRemoval {
    /// Cleaned media
    pub artifact: MediaArtifact,
    /// Provenance metadata was embedded
    pub provenance_added: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trips_wire_name() {
        for platform in [
            Platform::YoutubeShorts,
            Platform::InstagramReels,
            Platform::Tiktok,
            Platform::Youtube,
            Platform::Instagram,
        ] {
            let json = serde_json::to_value(platform).unwrap();
            assert_eq!(json, platform.as_str());
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_platform_accepts_dashes() {
        assert_eq!(
            "instagram-reels".parse::<Platform>().unwrap(),
            Platform::InstagramReels
        );
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_analysis_envelope_tolerates_missing_lists() {
        let envelope: AnalysisEnvelope =
            serde_json::from_str(r#"{"analysis":{"score":71.5}}"#).unwrap();
        assert_eq!(envelope.analysis.score, 71.5);
        assert!(envelope.analysis.strengths.is_empty());
    }

    #[test]
    fn test_posting_times_camel_case() {
        let times: PostingTimes =
            serde_json::from_str(r#"{"timezone":"UTC","bestTimes":["Mon 09:00"]}"#).unwrap();
        assert_eq!(times.best_times, vec!["Mon 09:00".to_string()]);
    }

    #[test]
    fn test_tone_from_str() {
        assert_eq!("Funny".parse::<Tone>().unwrap(), Tone::Funny);
        assert!("angry".parse::<Tone>().is_err());
    }
}
