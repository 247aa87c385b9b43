//! Immutable media artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReelkitError;

/// Kind of media an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still photo
    Image,
    /// Video clip
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = ReelkitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" | "photo" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(ReelkitError::InvalidInput(format!(
                "Unknown media kind: {}. Must be one of: image, video",
                other
            ))),
        }
    }
}

/// One immutable media object at a point in its edit history
///
/// Never mutated in place. An edit produces a new artifact with a fresh id,
/// usually through [`MediaArtifact::derive`].
///
/// # Examples
///
/// ```
/// use reelkit::media::{MediaArtifact, MediaKind};
///
/// let photo = MediaArtifact::new("file:///photos/a.jpg", MediaKind::Image);
/// let cropped = photo.derive("file:///photos/a-cropped.jpg");
///
/// assert_ne!(photo.id, cropped.id);
/// assert_eq!(cropped.kind, MediaKind::Image);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaArtifact {
    /// Unique identifier
    pub id: Uuid,
    /// Where the media bytes live
    pub source_uri: String,
    /// Image or video
    pub kind: MediaKind,
    /// When this artifact was produced
    pub created_at: DateTime<Utc>,
}

impl MediaArtifact {
    /// Creates a new artifact for media at `source_uri`
    pub fn new(source_uri: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_uri: source_uri.into(),
            kind,
            created_at: Utc::now(),
        }
    }

    /// Creates the artifact produced by editing this one into `source_uri`
    pub fn derive(&self, source_uri: impl Into<String>) -> Self {
        Self::new(source_uri, self.kind)
    }
}
