//! Media engine: one editing session wired end to end
//!
//! [`MediaEngine`] is the explicit context object that owns the session
//! store, the media session, the generation orchestrator, and the publish
//! coordinator. It is also where results coming back from collaborators are
//! checked against the media session they were requested for, so a late
//! arrival never lands on replaced or cleared media.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::auth::{Identity, RestoreOutcome, SessionStore};
use crate::backend::{Backend, HttpBackend};
use crate::config::Config;
use crate::error::{ReelkitError, Result};
use crate::generation::{
    GenerateAllReport, GenerationOrchestrator, Platform, WatermarkDetection, WatermarkRemoval,
};
use crate::media::{
    EditCommand, EditOutcome, EditorMode, MediaArtifact, MediaKind, MediaSessionHandle,
    SessionTicket,
};
use crate::publish::{PublishCoordinator, PublishPlan, PublishReceipt, Publisher};
use crate::storage::{create_store, CredentialStore};
use crate::transform::{MediaTransformer, Transform};

/// Context object for one active editing session
pub struct MediaEngine {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    media: MediaSessionHandle,
    orchestrator: GenerationOrchestrator,
    publish: PublishCoordinator,
    request_timeout: Duration,
}

impl MediaEngine {
    /// Builds an engine backed by HTTP and the configured credential store
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        let storage = create_store(&config.storage);
        Ok(Self::new(config, backend, storage))
    }

    /// Builds an engine from explicit collaborators
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use reelkit::backend::FakeBackend;
    /// use reelkit::config::Config;
    /// use reelkit::engine::MediaEngine;
    /// use reelkit::storage::MemoryStore;
    ///
    /// let engine = MediaEngine::new(
    ///     &Config::default(),
    ///     Arc::new(FakeBackend::new()),
    ///     Arc::new(MemoryStore::new()),
    /// );
    /// assert!(engine.session().is_loading());
    /// assert!(engine.current().is_none());
    /// ```
    pub fn new(
        config: &Config,
        backend: Arc<dyn Backend>,
        storage: Arc<dyn CredentialStore>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage));
        let request_timeout = config.backend.timeout();
        let orchestrator = GenerationOrchestrator::new(
            backend.clone(),
            session.clone(),
            config.generation.clone(),
            request_timeout,
        );

        Self {
            backend,
            session,
            media: MediaSessionHandle::new(),
            orchestrator,
            publish: PublishCoordinator::new(),
            request_timeout,
        }
    }

    /// Session store
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Shared media session handle
    pub fn media(&self) -> &MediaSessionHandle {
        &self.media
    }

    /// Orchestrator for single generation calls
    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    // ---- Authentication ----

    /// Restores and verifies a stored token
    pub async fn restore(&self) -> RestoreOutcome {
        self.session.restore_on_startup(self.backend.as_ref()).await
    }

    /// Verifies `token` with the backend and signs in as its owner
    ///
    /// Nothing is persisted unless the backend accepts the token.
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidInput`] for a blank token, the backend
    /// error when verification fails, or the storage error when the token
    /// cannot be persisted.
    pub async fn login(&self, token: &str) -> Result<Identity> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ReelkitError::InvalidInput("token must not be empty".to_string()).into());
        }

        let profile = tokio::time::timeout(self.request_timeout, self.backend.fetch_identity(token))
            .await
            .map_err(|_| {
                ReelkitError::BackendUnavailable(format!(
                    "Identity check timed out after {}s",
                    self.request_timeout.as_secs()
                ))
            })??;

        self.session.authenticate(profile.user.clone(), token)?;
        self.session.set_subscription(profile.subscription);
        Ok(profile.user)
    }

    /// Signs out
    pub fn logout(&self) {
        self.session.clear_session();
    }

    // ---- Edit history ----

    /// Starts editing `artifact`, discarding the previous history
    ///
    /// # Errors
    ///
    /// See [`MediaSessionHandle::execute`].
    pub fn set_media(&self, artifact: MediaArtifact) -> Result<EditOutcome> {
        self.media.execute(EditCommand::SetMedia(artifact))
    }

    /// Appends an edited artifact after the cursor
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] when no media is loaded.
    pub fn apply_edit(&self, artifact: MediaArtifact) -> Result<EditOutcome> {
        self.media.execute(EditCommand::ApplyEdit(artifact))
    }

    /// Steps back one edit
    pub fn undo(&self) -> Result<EditOutcome> {
        self.media.execute(EditCommand::Undo)
    }

    /// Steps forward one edit
    pub fn redo(&self) -> Result<EditOutcome> {
        self.media.execute(EditCommand::Redo)
    }

    /// Drops the media, its history, and its generated content
    pub fn clear_media(&self) -> Result<EditOutcome> {
        self.media.execute(EditCommand::Clear)
    }

    /// Artifact at the history cursor
    pub fn current(&self) -> Option<MediaArtifact> {
        self.media.current()
    }

    /// Switches the editor tool
    ///
    /// # Errors
    ///
    /// See [`crate::media::MediaSession::set_editor_mode`].
    pub fn set_editor_mode(&self, mode: EditorMode) -> Result<()> {
        self.media.with(|s| s.set_editor_mode(mode))
    }

    /// Picks one of the cached caption variations
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] if `index` is out of range.
    pub fn select_caption(&self, index: usize) -> Result<String> {
        self.media.with(|s| s.select_caption(index).map(str::to_string))
    }

    fn require_media(&self) -> Result<(SessionTicket, MediaArtifact)> {
        self.media.ticket_with_current().ok_or_else(|| {
            ReelkitError::InvalidTransition("no media loaded".to_string()).into()
        })
    }

    fn fold_edit(&self, ticket: SessionTicket, artifact: MediaArtifact) -> Result<MediaArtifact> {
        match self.media.apply_edit_if_unchanged(ticket, artifact.clone())? {
            EditOutcome::Discarded => Err(ReelkitError::StaleSession.into()),
            _ => Ok(artifact),
        }
    }

    /// Runs `transform` on the current media and appends the result
    ///
    /// # Errors
    ///
    /// [`ReelkitError::InvalidTransition`] without media,
    /// [`ReelkitError::InvalidInput`] for bad parameters, the transformer's
    /// error, or [`ReelkitError::StaleSession`] if the history moved while
    /// the transform ran.
    pub async fn apply_transform(
        &self,
        transformer: &dyn MediaTransformer,
        transform: &Transform,
    ) -> Result<MediaArtifact> {
        let (ticket, source) = self.require_media()?;
        transform.validate(source.kind)?;

        tracing::debug!(artifact = %source.id, ?transform, "Applying transform");
        let uri = transformer.apply(&source.source_uri, transform).await?;
        let edited = MediaArtifact::new(uri, transform.output_kind(source.kind));
        self.fold_edit(ticket, edited)
    }

    // ---- Generation ----

    /// Checks the current media for a watermark
    ///
    /// # Errors
    ///
    /// [`ReelkitError::InvalidTransition`] without media, otherwise see
    /// [`GenerationOrchestrator::detect_watermark`].
    pub async fn detect_watermark(&self, ownership_confirmed: bool) -> Result<WatermarkDetection> {
        let (_, source) = self.require_media()?;
        self.orchestrator
            .detect_watermark(&source, ownership_confirmed)
            .await
    }

    /// Removes the watermark from the current media and appends the result
    ///
    /// # Errors
    ///
    /// See [`GenerationOrchestrator::remove_watermark`]; additionally
    /// [`ReelkitError::StaleSession`] when the media changed before the
    /// cleaned artifact arrived. The credit is not refunded in that case.
    pub async fn remove_watermark(&self, ownership_confirmed: bool) -> Result<WatermarkRemoval> {
        let (ticket, source) = self.require_media()?;
        let removal = self
            .orchestrator
            .remove_watermark(&source, ownership_confirmed)
            .await?;
        self.fold_edit(ticket, removal.artifact.clone())?;
        Ok(removal)
    }

    /// Generates captions, hashtags, and an analysis for the current media
    ///
    /// Successful captions and hashtags are cached on the media session,
    /// unless the media was replaced or cleared in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] when no media is loaded.
    /// Per-part failures are reported inside the [`GenerateAllReport`].
    pub async fn generate_all(
        &self,
        content: &str,
        platform: Platform,
        cancel: &CancellationToken,
    ) -> Result<GenerateAllReport> {
        let (ticket, source) = self.require_media()?;
        let report = self
            .orchestrator
            .generate_all(content, platform, source.kind, cancel)
            .await;

        self.media.with(|s| {
            if let Ok(captions) = &report.captions {
                s.store_captions(ticket, captions.variations.clone());
            }
            if let Ok(hashtags) = &report.hashtags {
                s.store_hashtags(ticket, hashtags.hashtags.clone());
            }
        });

        Ok(report)
    }

    /// Like [`generate_all`](Self::generate_all) for content with no loaded media
    pub async fn generate_all_for_description(
        &self,
        content: &str,
        platform: Platform,
        cancel: &CancellationToken,
    ) -> GenerateAllReport {
        self.orchestrator
            .generate_all(content, platform, MediaKind::Video, cancel)
            .await
    }

    // ---- Publishing ----

    /// Adds or removes a publish target
    pub fn toggle_platform(&mut self, platform: Platform) -> bool {
        self.publish.toggle_platform(platform)
    }

    /// Sets or clears the publish schedule
    pub fn set_schedule(&mut self, at: Option<DateTime<Utc>>) {
        self.publish.set_schedule(at);
    }

    /// Publish plan as currently built
    pub fn publish_plan(&self) -> &PublishPlan {
        self.publish.plan()
    }

    /// Publishes the current media with the accumulated plan
    ///
    /// The plan is reset whatever the outcome.
    ///
    /// # Errors
    ///
    /// [`ReelkitError::InvalidPublishPlan`] without media or without
    /// targets, or the publisher's error.
    pub async fn publish(&mut self, publisher: &dyn Publisher) -> Result<PublishReceipt> {
        let Some(artifact) = self.media.current() else {
            self.publish.take_plan();
            return Err(
                ReelkitError::InvalidPublishPlan("no media loaded to publish".to_string()).into(),
            );
        };
        self.publish.commit(publisher, &artifact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccountProfile, Plan, Subscription};
    use crate::backend::{FakeBackend, FakeReply, Operation};
    use crate::storage::{MemoryStore, AUTH_TOKEN_KEY};
    use crate::test_utils::{assert_reelkit_error, test_engine};
    use async_trait::async_trait;

    fn engine_with(backend: Arc<FakeBackend>, storage: Arc<MemoryStore>) -> MediaEngine {
        MediaEngine::new(&Config::default(), backend, storage)
    }

    fn photo() -> MediaArtifact {
        MediaArtifact::new("file:///photo.jpg", MediaKind::Image)
    }

    struct SuffixTransformer;

    #[async_trait]
    impl MediaTransformer for SuffixTransformer {
        async fn apply(&self, source_uri: &str, _transform: &Transform) -> Result<String> {
            Ok(format!("{}.edited", source_uri))
        }
    }

    #[tokio::test]
    async fn test_login_persists_verified_token() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_profile(&AccountProfile {
            user: Identity::new("u-1"),
            subscription: Subscription::new(Plan::Pro, 0),
        });
        let storage = Arc::new(MemoryStore::new());
        let engine = engine_with(backend, storage.clone());

        let identity = engine.login("tok-123").await.unwrap();

        assert_eq!(identity.id, "u-1");
        assert!(engine.session().is_authenticated());
        assert!(engine.session().has_pro_access());
        assert_eq!(
            storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(),
            Some("tok-123")
        );
    }

    #[tokio::test]
    async fn test_rejected_login_persists_nothing() {
        let backend = Arc::new(FakeBackend::new());
        backend.script_identity(FakeReply::reject(401, "bad token"));
        let storage = Arc::new(MemoryStore::new());
        let engine = engine_with(backend, storage.clone());

        assert!(engine.login("nope").await.is_err());
        assert!(!engine.session().is_authenticated());
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_edit_commands_and_editor_mode() {
        let engine = test_engine(Plan::Free, 0).engine;
        assert!(engine.set_editor_mode(EditorMode::Trim).is_err());

        let original = photo();
        let cropped = original.derive("file:///photo-crop.jpg");
        engine.set_media(original.clone()).unwrap();
        engine.set_editor_mode(EditorMode::Crop).unwrap();
        engine.apply_edit(cropped.clone()).unwrap();

        assert_eq!(engine.undo().unwrap(), EditOutcome::Changed);
        assert_eq!(engine.current(), Some(original));
        assert_eq!(engine.redo().unwrap(), EditOutcome::Changed);
        assert_eq!(engine.current(), Some(cropped));

        engine.clear_media().unwrap();
        assert!(engine.current().is_none());
        assert_eq!(engine.media().with(|s| s.editor_mode()), EditorMode::View);
    }

    #[tokio::test]
    async fn test_apply_transform_appends_edit() {
        let engine = engine_with(Arc::new(FakeBackend::new()), Arc::new(MemoryStore::new()));
        engine.set_media(photo()).unwrap();

        let edited = engine
            .apply_transform(&SuffixTransformer, &Transform::Rotate { degrees: 90 })
            .await
            .unwrap();

        assert_eq!(edited.source_uri, "file:///photo.jpg.edited");
        assert_eq!(engine.current(), Some(edited));
        assert!(engine.media().can_undo());
    }

    #[tokio::test]
    async fn test_transform_without_media_is_invalid_transition() {
        let t = test_engine(Plan::Free, 0);
        let result = t
            .engine
            .apply_transform(&SuffixTransformer, &Transform::Rotate { degrees: 90 })
            .await;
        assert_reelkit_error(result, |e| matches!(e, ReelkitError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_remove_watermark_folds_into_history() {
        let t = test_engine(Plan::Free, 1);
        t.engine.set_media(photo()).unwrap();

        let removal = t.engine.remove_watermark(true).await.unwrap();

        assert_eq!(removal.artifact.source_uri, "file:///photo.jpg.clean");
        assert_eq!(t.engine.current(), Some(removal.artifact));
        assert_eq!(t.engine.media().history_entries().len(), 2);
        assert_eq!(t.backend.calls_for(Operation::WatermarkRemove), 1);
        assert_eq!(t.engine.session().snapshot().subscription.credits, 0);
    }

    #[tokio::test]
    async fn test_late_removal_after_clear_is_stale() {
        let backend = Arc::new(FakeBackend::new());
        backend.script(
            Operation::WatermarkRemove,
            FakeReply::delayed(
                Duration::from_millis(50),
                FakeReply::Json(serde_json::json!({"mediaUrl": "file:///late.jpg"})),
            ),
        );
        let engine = engine_with(backend, Arc::new(MemoryStore::new()));
        engine.session().set_subscription(Subscription::new(Plan::Pro, 0));
        engine.set_media(photo()).unwrap();

        let media = engine.media().clone();
        let (result, _) = tokio::join!(engine.remove_watermark(true), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            media.execute(EditCommand::Clear).unwrap();
        });

        let err = result.unwrap_err();
        assert!(matches!(
            ReelkitError::classify(&err),
            Some(ReelkitError::StaleSession)
        ));
        assert!(engine.current().is_none());
        assert!(engine.media().history_entries().is_empty());
    }

    #[tokio::test]
    async fn test_generate_all_caches_results() {
        let engine = test_engine(Plan::Premium, 0).engine;
        engine.set_media(photo()).unwrap();

        let report = engine
            .generate_all("sunset over the bay", Platform::Tiktok, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(engine.media().generated_captions().len(), 3);
        assert_eq!(engine.media().generated_hashtags()[0], "#sunset");
        assert_eq!(
            engine.select_caption(1).unwrap(),
            "Chasing the last light of the day"
        );
    }

    #[tokio::test]
    async fn test_publish_without_media_resets_plan() {
        struct NeverPublisher;

        #[async_trait]
        impl Publisher for NeverPublisher {
            async fn publish(
                &self,
                _plan: &PublishPlan,
                _artifact: &MediaArtifact,
            ) -> Result<PublishReceipt> {
                panic!("publisher must not be contacted");
            }
        }

        let mut engine =
            engine_with(Arc::new(FakeBackend::new()), Arc::new(MemoryStore::new()));
        engine.toggle_platform(Platform::Instagram);

        let err = engine.publish(&NeverPublisher).await.unwrap_err();
        assert!(matches!(
            ReelkitError::classify(&err),
            Some(ReelkitError::InvalidPublishPlan(_))
        ));
        assert!(engine.publish_plan().is_empty());
    }
}
