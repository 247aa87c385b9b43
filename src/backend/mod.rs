//! AI backend collaborator
//!
//! The engine talks to two hosts: the account API, used only to verify a
//! token and fetch the user's subscription, and the AI engine, which serves
//! every generation operation. Requests and responses are JSON-shaped; the
//! typed views live in [`crate::generation`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::AccountProfile;
use crate::error::Result;

pub mod fake;
pub mod http;

pub use fake::{FakeBackend, FakeReply};
pub use http::HttpBackend;

/// Path of the identity endpoint on the account API
pub const IDENTITY_PATH: &str = "/api/auth/me";

/// AI engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Single caption
    CaptionGenerate,
    /// Several alternative captions
    CaptionVariations,
    /// Hashtag list
    HashtagsGenerate,
    /// Best times to post on a platform
    PostingTimes,
    /// Quality score with strengths and improvements
    ContentAnalyze,
    /// Content ideas for a niche
    ContentSuggestions,
    /// Watermark presence check
    WatermarkDetect,
    /// Watermark removal producing new media
    WatermarkRemove,
}

impl Operation {
    /// Every operation, in a stable order
    pub const ALL: [Operation; 8] = [
        Operation::CaptionGenerate,
        Operation::CaptionVariations,
        Operation::HashtagsGenerate,
        Operation::PostingTimes,
        Operation::ContentAnalyze,
        Operation::ContentSuggestions,
        Operation::WatermarkDetect,
        Operation::WatermarkRemove,
    ];

    /// Endpoint path on the AI engine
    pub fn path(self) -> &'static str {
        match self {
            Self::CaptionGenerate => "/api/caption/generate",
            Self::CaptionVariations => "/api/caption/variations",
            Self::HashtagsGenerate => "/api/hashtags/generate",
            Self::PostingTimes => "/api/hashtags/posting-times",
            Self::ContentAnalyze => "/api/content/analyze",
            Self::ContentSuggestions => "/api/content/suggestions",
            Self::WatermarkDetect => "/api/watermark/detect",
            Self::WatermarkRemove => "/api/watermark/remove",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CaptionGenerate => "caption",
            Self::CaptionVariations => "caption_variations",
            Self::HashtagsGenerate => "hashtags",
            Self::PostingTimes => "posting_times",
            Self::ContentAnalyze => "analysis",
            Self::ContentSuggestions => "suggestions",
            Self::WatermarkDetect => "watermark_detect",
            Self::WatermarkRemove => "watermark_remove",
        };
        write!(f, "{}", name)
    }
}

/// One request to the AI engine
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Which operation
    pub operation: Operation,
    /// JSON body
    pub payload: serde_json::Value,
    /// Bearer token sent with the request, when signed in
    pub bearer_token: Option<String>,
}

/// Remote backend contract
///
/// Implementations map failures onto the crate taxonomy:
/// a 401 becomes [`ReelkitError::Unauthenticated`], any other non-success
/// status becomes [`ReelkitError::BackendRejected`], and transport failures
/// become [`ReelkitError::BackendUnavailable`]. Implementations never retry.
///
/// [`ReelkitError::Unauthenticated`]: crate::error::ReelkitError::Unauthenticated
/// [`ReelkitError::BackendRejected`]: crate::error::ReelkitError::BackendRejected
/// [`ReelkitError::BackendUnavailable`]: crate::error::ReelkitError::BackendUnavailable
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Verifies `token` and returns the account it belongs to
    async fn fetch_identity(&self, token: &str) -> Result<AccountProfile>;

    /// Issues exactly one AI engine request
    async fn dispatch(&self, request: BackendRequest) -> Result<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_operation_paths_are_unique() {
        let paths: HashSet<_> = Operation::ALL.iter().map(|op| op.path()).collect();
        assert_eq!(paths.len(), Operation::ALL.len());
    }

    #[test]
    fn test_operation_paths_match_engine_routes() {
        assert_eq!(Operation::HashtagsGenerate.path(), "/api/hashtags/generate");
        assert_eq!(Operation::PostingTimes.path(), "/api/hashtags/posting-times");
        assert_eq!(Operation::WatermarkRemove.path(), "/api/watermark/remove");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::ContentAnalyze.to_string(), "analysis");
        assert_eq!(Operation::CaptionVariations.to_string(), "caption_variations");
    }
}
