//! Generation orchestrator
//!
//! Every AI operation follows the same protocol:
//!
//! 1. local validation (content present, ownership confirmed) with no side effects
//! 2. gate check: Pro access, otherwise one credit, otherwise
//!    [`ReelkitError::InsufficientAccess`] and no backend call
//! 3. exactly one backend request bounded by the configured timeout
//! 4. the typed result handed back to the caller
//!
//! A 401 from the backend clears the session, unless the token the request
//! carried is no longer the one held.
//! The orchestrator never touches edit history; callers fold
//! [`WatermarkRemoval::artifact`] in themselves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::auth::SessionStore;
use crate::backend::{Backend, BackendRequest, Operation};
use crate::config::GenerationConfig;
use crate::error::{ReelkitError, Result};
use crate::media::{MediaArtifact, MediaKind};

pub mod types;

pub use types::{
    Caption, CaptionVariations, ContentAnalysis, ContentSuggestions, Hashtags, Platform,
    PostingTimes, Tone, WatermarkDetection, WatermarkRemoval,
};

/// How a gated call was paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGrant {
    /// Pro or Premium plan; nothing spent
    Subscription,
    /// One credit spent
    Credit,
}

/// Tagged results of [`GenerationOrchestrator::generate_all`]
///
/// Each part succeeds or fails on its own.
#[derive(Debug)]
pub struct GenerateAllReport {
    /// Caption variations
    pub captions: Result<CaptionVariations>,
    /// Hashtags
    pub hashtags: Result<Hashtags>,
    /// Content analysis
    pub analysis: Result<ContentAnalysis>,
}

impl GenerateAllReport {
    /// `true` when all three parts succeeded
    pub fn is_complete(&self) -> bool {
        self.captions.is_ok() && self.hashtags.is_ok() && self.analysis.is_ok()
    }

    /// First failure, in caption/hashtag/analysis order
    pub fn first_error(&self) -> Option<&anyhow::Error> {
        self.captions
            .as_ref()
            .err()
            .or_else(|| self.hashtags.as_ref().err())
            .or_else(|| self.analysis.as_ref().err())
    }
}

/// Coordinates gated calls to the AI backend
pub struct GenerationOrchestrator {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    defaults: GenerationConfig,
    request_timeout: Duration,
}

impl GenerationOrchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `backend` - AI backend collaborator
    /// * `session` - Session store used for gating and the bearer token
    /// * `defaults` - Request parameter defaults
    /// * `request_timeout` - Upper bound for each backend call
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<SessionStore>,
        defaults: GenerationConfig,
        request_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            session,
            defaults,
            request_timeout,
        }
    }

    /// Request parameter defaults
    pub fn defaults(&self) -> &GenerationConfig {
        &self.defaults
    }

    /// Gate check: Pro access first, then one credit
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InsufficientAccess`] when neither is available.
    pub fn gate(&self, operation: Operation) -> Result<AccessGrant> {
        if self.session.has_pro_access() {
            tracing::debug!(%operation, "Gate passed by subscription");
            return Ok(AccessGrant::Subscription);
        }
        if self.session.consume_credit() {
            tracing::debug!(%operation, "Gate passed by credit");
            return Ok(AccessGrant::Credit);
        }
        tracing::info!(%operation, "Gate refused: no credits and no Pro access");
        Err(ReelkitError::InsufficientAccess.into())
    }

    /// Gates, dispatches, and decodes one operation
    async fn run<T: DeserializeOwned>(&self, operation: Operation, payload: Value) -> Result<T> {
        self.gate(operation)?;
        let value = self.send(operation, payload).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send(&self, operation: Operation, payload: Value) -> Result<Value> {
        let bearer_token = self.session.token();
        let request = BackendRequest {
            operation,
            payload,
            bearer_token: bearer_token.clone(),
        };

        tracing::info!(%operation, "Dispatching generation request");
        let dispatch = self.backend.dispatch(request);
        let outcome = tokio::time::timeout(self.request_timeout, dispatch).await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if matches!(ReelkitError::classify(&e), Some(err) if err.is_unauthenticated())
                    && self.session.clear_session_if_token(bearer_token.as_deref())
                {
                    tracing::warn!(%operation, "Backend rejected the session token; signed out");
                }
                Err(e)
            }
            Err(_) => {
                tracing::error!(
                    %operation,
                    timeout = ?self.request_timeout,
                    "Generation request timed out"
                );
                Err(ReelkitError::BackendUnavailable(format!(
                    "Request timed out after {}s",
                    self.request_timeout.as_secs()
                ))
                .into())
            }
        }
    }

    /// Generates one caption
    ///
    /// # Errors
    ///
    /// [`ReelkitError::InvalidInput`] for empty content, the gate error, or
    /// the backend error.
    pub async fn generate_caption(
        &self,
        content: &str,
        platform: Platform,
        tone: Tone,
    ) -> Result<Caption> {
        require_content(content)?;
        self.run(
            Operation::CaptionGenerate,
            json!({ "content": content, "platform": platform, "tone": tone }),
        )
        .await
    }

    /// Generates `count` alternative captions
    ///
    /// # Errors
    ///
    /// See [`generate_caption`](Self::generate_caption).
    pub async fn generate_caption_variations(
        &self,
        content: &str,
        platform: Platform,
        count: u32,
    ) -> Result<CaptionVariations> {
        require_content(content)?;
        self.run(
            Operation::CaptionVariations,
            json!({ "content": content, "platform": platform, "count": count }),
        )
        .await
    }

    /// Generates `count` hashtags
    ///
    /// # Errors
    ///
    /// See [`generate_caption`](Self::generate_caption).
    pub async fn generate_hashtags(
        &self,
        content: &str,
        platform: Platform,
        count: u32,
    ) -> Result<Hashtags> {
        require_content(content)?;
        self.run(
            Operation::HashtagsGenerate,
            json!({ "content": content, "platform": platform, "count": count }),
        )
        .await
    }

    /// Suggests when to post on `platform`
    ///
    /// # Errors
    ///
    /// The gate error or the backend error.
    pub async fn get_best_posting_times(
        &self,
        platform: Platform,
        timezone: &str,
    ) -> Result<PostingTimes> {
        self.run(
            Operation::PostingTimes,
            json!({ "platform": platform, "timezone": timezone }),
        )
        .await
    }

    /// Scores described content
    ///
    /// # Errors
    ///
    /// See [`generate_caption`](Self::generate_caption).
    pub async fn analyze_content(&self, content: &str, kind: MediaKind) -> Result<ContentAnalysis> {
        require_content(content)?;
        let envelope: types::AnalysisEnvelope = self
            .run(
                Operation::ContentAnalyze,
                json!({ "content": content, "mediaType": kind }),
            )
            .await?;
        Ok(envelope.analysis)
    }

    /// Suggests content ideas for `niche`
    ///
    /// # Errors
    ///
    /// See [`generate_caption`](Self::generate_caption).
    pub async fn get_content_suggestions(
        &self,
        niche: &str,
        platform: Platform,
    ) -> Result<ContentSuggestions> {
        require_content(niche)?;
        self.run(
            Operation::ContentSuggestions,
            json!({ "niche": niche, "platform": platform }),
        )
        .await
    }

    /// Checks `source` for a watermark
    ///
    /// The ownership flag is forwarded so the backend can record it.
    ///
    /// # Errors
    ///
    /// The gate error or the backend error.
    pub async fn detect_watermark(
        &self,
        source: &MediaArtifact,
        ownership_confirmed: bool,
    ) -> Result<WatermarkDetection> {
        self.run(
            Operation::WatermarkDetect,
            json!({
                "mediaUrl": source.source_uri,
                "ownershipConfirmed": ownership_confirmed,
            }),
        )
        .await
    }

    /// Removes the watermark from `source`
    ///
    /// Refused locally, before the gate and without contacting the backend,
    /// unless `ownership_confirmed` is `true`.
    ///
    /// # Errors
    ///
    /// [`ReelkitError::OwnershipNotConfirmed`], the gate error, or the
    /// backend error.
    pub async fn remove_watermark(
        &self,
        source: &MediaArtifact,
        ownership_confirmed: bool,
    ) -> Result<WatermarkRemoval> {
        if !ownership_confirmed {
            tracing::warn!(
                artifact = %source.id,
                "Watermark removal refused: ownership not confirmed"
            );
            return Err(ReelkitError::OwnershipNotConfirmed.into());
        }

        let response: types::RemovalResponse = self
            .run(
                Operation::WatermarkRemove,
                json!({
                    "mediaUrl": source.source_uri,
                    "ownershipConfirmed": true,
                    "addProvenance": self.defaults.add_provenance,
                }),
            )
            .await?;

        Ok(WatermarkRemoval {
            artifact: source.derive(response.media_url),
            provenance_added: response.provenance_added,
        })
    }

    /// Runs caption variations, hashtags, and analysis concurrently
    ///
    /// Each part is gated on its own, so a Free user spends one credit per
    /// part. Cancelling `cancel` abandons every part still in flight; parts
    /// that had not passed the gate yet spend nothing.
    pub async fn generate_all(
        &self,
        content: &str,
        platform: Platform,
        kind: MediaKind,
        cancel: &CancellationToken,
    ) -> GenerateAllReport {
        let (captions, hashtags, analysis) = futures::future::join3(
            cancellable(
                cancel,
                self.generate_caption_variations(
                    content,
                    platform,
                    self.defaults.caption_variations,
                ),
            ),
            cancellable(
                cancel,
                self.generate_hashtags(content, platform, self.defaults.hashtag_count),
            ),
            cancellable(cancel, self.analyze_content(content, kind)),
        )
        .await;

        GenerateAllReport {
            captions,
            hashtags,
            analysis,
        }
    }
}

/// Resolves to [`ReelkitError::Cancelled`] as soon as `cancel` fires
pub async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReelkitError::Cancelled.into()),
        result = future => result,
    }
}

fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(ReelkitError::InvalidInput(
            "Please describe your content first".to_string(),
        )
        .into());
    }
    Ok(())
}
