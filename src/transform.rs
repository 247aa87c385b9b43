//! Media-transform collaborator contract
//!
//! Pixel work happens outside this crate. A [`MediaTransformer`] takes a
//! source URI and a [`Transform`], and returns the URI of the produced
//! media; the engine wraps that URI in a new artifact and folds it into
//! the edit history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ReelkitError, Result};
use crate::media::MediaKind;

/// Transformation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Keep a rectangle of the frame
    Crop {
        /// Left edge in pixels
        x: u32,
        /// Top edge in pixels
        y: u32,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Scale to the given size
    Resize {
        /// Target width
        width: u32,
        /// Target height
        height: u32,
    },
    /// Rotate clockwise
    Rotate {
        /// Degrees, a multiple of 90
        degrees: u16,
    },
    /// Still frame taken from a video
    Thumbnail {
        /// Offset into the video
        at_seconds: f64,
    },
}

impl Transform {
    /// Kind of media the transform produces from `source`
    pub fn output_kind(&self, source: MediaKind) -> MediaKind {
        match self {
            Self::Thumbnail { .. } => MediaKind::Image,
            _ => source,
        }
    }

    /// Checks the parameters against the source media
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidInput`] for zero-sized rectangles,
    /// rotations that are not a multiple of 90, or a thumbnail requested
    /// from an image.
    pub fn validate(&self, source: MediaKind) -> Result<()> {
        let problem = match self {
            Self::Crop { width, height, .. } | Self::Resize { width, height }
                if *width == 0 || *height == 0 =>
            {
                Some("width and height must be non-zero".to_string())
            }
            Self::Rotate { degrees } if degrees % 90 != 0 => {
                Some(format!("rotation of {} degrees is not a multiple of 90", degrees))
            }
            Self::Thumbnail { .. } if source != MediaKind::Video => {
                Some("thumbnails can only be taken from video".to_string())
            }
            Self::Thumbnail { at_seconds } if !at_seconds.is_finite() || *at_seconds < 0.0 => {
                Some("thumbnail offset must be a non-negative number".to_string())
            }
            _ => None,
        };

        match problem {
            Some(message) => Err(ReelkitError::InvalidInput(message).into()),
            None => Ok(()),
        }
    }
}

/// External media-transform collaborator
#[async_trait]
pub trait MediaTransformer: Send + Sync {
    /// Applies `transform` to the media at `source_uri` and returns the new URI
    async fn apply(&self, source_uri: &str, transform: &Transform) -> Result<String>;
}
