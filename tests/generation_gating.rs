//! Gate checks, ownership enforcement, 401 invalidation, and cancellation
//! through the public engine API against the in-process fake backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{engine_with, photo, video};
use reelkit::auth::{AccountProfile, Identity, Plan, Subscription};
use reelkit::backend::{FakeBackend, FakeReply, Operation};
use reelkit::error::ReelkitError;
use reelkit::generation::{Platform, Tone};
use reelkit::media::MediaKind;
use reelkit::storage::{CredentialStore, MemoryStore, AUTH_TOKEN_KEY};
use tokio_util::sync::CancellationToken;

fn classify(err: &anyhow::Error) -> Option<&ReelkitError> {
    ReelkitError::classify(err)
}

#[tokio::test]
async fn test_free_user_without_credits_then_upgrade() {
    let backend = Arc::new(FakeBackend::new());
    let engine = engine_with(backend.clone(), Arc::new(MemoryStore::new()), Plan::Free, 0);

    let err = engine
        .orchestrator()
        .generate_hashtags("beach sunset", Platform::Tiktok, 10)
        .await
        .unwrap_err();
    assert!(matches!(classify(&err), Some(ReelkitError::InsufficientAccess)));
    assert_eq!(backend.call_count(), 0);
    assert_eq!(engine.session().snapshot().subscription.credits, 0);

    engine
        .session()
        .set_subscription(Subscription::new(Plan::Pro, 0));
    let tags = engine
        .orchestrator()
        .generate_hashtags("beach sunset", Platform::Tiktok, 10)
        .await
        .unwrap();

    assert!(!tags.hashtags.is_empty());
    assert_eq!(backend.calls_for(Operation::HashtagsGenerate), 1);
    assert_eq!(engine.session().snapshot().subscription.credits, 0);
}

#[tokio::test]
async fn test_credits_run_out_after_exactly_three_calls() {
    let backend = Arc::new(FakeBackend::new());
    let engine = engine_with(backend.clone(), Arc::new(MemoryStore::new()), Plan::Free, 3);

    let mut successes = 0;
    for _ in 0..5 {
        match engine
            .orchestrator()
            .generate_caption("city at night", Platform::InstagramReels, Tone::Professional)
            .await
        {
            Ok(_) => successes += 1,
            Err(e) => assert!(matches!(classify(&e), Some(ReelkitError::InsufficientAccess))),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(backend.call_count(), 3);
    assert_eq!(engine.session().snapshot().subscription.credits, 0);
}

#[tokio::test]
async fn test_concurrent_calls_cannot_double_spend_last_credit() {
    let backend = Arc::new(FakeBackend::new());
    let engine = engine_with(backend.clone(), Arc::new(MemoryStore::new()), Plan::Free, 1);
    let orch = engine.orchestrator();

    let (a, b, c) = tokio::join!(
        orch.get_content_suggestions("travel", Platform::Youtube),
        orch.get_content_suggestions("food", Platform::Youtube),
        orch.get_best_posting_times(Platform::Youtube, "Europe/Madrid"),
    );

    let ok = [a.is_ok(), b.is_ok(), c.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(ok, 1);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_watermark_removal_requires_ownership() {
    let backend = Arc::new(FakeBackend::new());
    let engine = engine_with(backend.clone(), Arc::new(MemoryStore::new()), Plan::Premium, 0);
    engine.set_media(photo("branded")).unwrap();

    let err = engine.remove_watermark(false).await.unwrap_err();
    assert!(matches!(classify(&err), Some(ReelkitError::OwnershipNotConfirmed)));
    assert_eq!(backend.call_count(), 0);
    assert_eq!(engine.media().history_entries().len(), 1);

    let removal = engine.remove_watermark(true).await.unwrap();
    assert_eq!(backend.calls_for(Operation::WatermarkRemove), 1);
    assert_eq!(engine.current(), Some(removal.artifact));

    let sent = &backend.calls()[0];
    assert_eq!(sent.payload["ownershipConfirmed"], true);
    assert_eq!(sent.payload["mediaUrl"], "file:///branded.jpg");
}

#[tokio::test]
async fn test_removed_watermark_can_be_undone() {
    let backend = Arc::new(FakeBackend::new());
    let engine = engine_with(backend, Arc::new(MemoryStore::new()), Plan::Pro, 0);
    let original = photo("branded");
    engine.set_media(original.clone()).unwrap();

    engine.remove_watermark(true).await.unwrap();
    engine.undo().unwrap();

    assert_eq!(engine.current(), Some(original));
    assert!(engine.media().can_redo());
}

#[tokio::test]
async fn test_unauthorized_response_signs_out() {
    let backend = Arc::new(FakeBackend::new());
    backend.script(
        Operation::ContentAnalyze,
        FakeReply::reject(401, "Session expired"),
    );
    let storage = Arc::new(MemoryStore::new());
    let engine = engine_with(backend.clone(), storage, Plan::Pro, 7);
    engine.login("tok").await.unwrap();
    engine
        .session()
        .set_subscription(Subscription::new(Plan::Pro, 7));

    let err = engine
        .orchestrator()
        .analyze_content("product demo", MediaKind::Video)
        .await
        .unwrap_err();

    assert!(matches!(classify(&err), Some(ReelkitError::Unauthenticated(_))));
    let session = engine.session().snapshot();
    assert!(!session.is_authenticated);
    assert_eq!(session.auth_token, None);
    assert_eq!(session.subscription, Subscription::default());
}

#[tokio::test]
async fn test_late_unauthorized_for_old_token_keeps_new_session() {
    let backend = Arc::new(FakeBackend::new());
    backend.set_profile(&AccountProfile {
        user: Identity::new("u-1"),
        subscription: Subscription::new(Plan::Free, 5),
    });
    backend.script(
        Operation::HashtagsGenerate,
        FakeReply::delayed(
            Duration::from_millis(100),
            FakeReply::reject(401, "Session expired"),
        ),
    );
    let storage = Arc::new(MemoryStore::new());
    let engine = engine_with(backend.clone(), storage.clone(), Plan::Free, 0);
    engine.login("old-token").await.unwrap();

    let (result, ()) = tokio::join!(
        engine
            .orchestrator()
            .generate_hashtags("city lights", Platform::Tiktok, 10),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            engine.logout();
            engine.login("new-token").await.unwrap();
        }
    );

    assert!(matches!(
        classify(&result.unwrap_err()),
        Some(ReelkitError::Unauthenticated(_))
    ));
    let session = engine.session().snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.auth_token.as_deref(), Some("new-token"));
    assert_eq!(session.subscription.credits, 5);
    assert_eq!(
        storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(),
        Some("new-token")
    );
}

#[tokio::test]
async fn test_rejection_message_reaches_caller() {
    let backend = Arc::new(FakeBackend::new());
    backend.script(
        Operation::CaptionVariations,
        FakeReply::reject(422, "Content is too long"),
    );
    let engine = engine_with(backend, Arc::new(MemoryStore::new()), Plan::Pro, 0);

    let err = engine
        .orchestrator()
        .generate_caption_variations("x", Platform::Tiktok, 3)
        .await
        .unwrap_err();
    match classify(&err) {
        Some(ReelkitError::BackendRejected { status, message }) => {
            assert_eq!(*status, 422);
            assert_eq!(message, "Content is too long");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_all_spends_one_credit_per_part_and_caches() {
    let backend = Arc::new(FakeBackend::new());
    let engine = engine_with(backend.clone(), Arc::new(MemoryStore::new()), Plan::Free, 3);
    engine.set_media(video("surf")).unwrap();

    let report = engine
        .generate_all("surfing at dawn", Platform::YoutubeShorts, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(backend.call_count(), 3);
    assert_eq!(engine.session().snapshot().subscription.credits, 0);
    assert_eq!(engine.media().generated_captions().len(), 3);
    assert!(!engine.media().generated_hashtags().is_empty());

    let analysis_request = backend
        .calls()
        .into_iter()
        .find(|c| c.operation == Operation::ContentAnalyze)
        .unwrap();
    assert_eq!(analysis_request.payload["mediaType"], "video");
}

#[tokio::test]
async fn test_generate_all_results_are_dropped_after_media_changes() {
    let backend = Arc::new(FakeBackend::new());
    for op in [
        Operation::CaptionVariations,
        Operation::HashtagsGenerate,
        Operation::ContentAnalyze,
    ] {
        backend.script(
            op,
            FakeReply::delayed(
                Duration::from_millis(40),
                FakeReply::Json(FakeBackend::default_reply(&reelkit::backend::BackendRequest {
                    operation: op,
                    payload: serde_json::json!({}),
                    bearer_token: None,
                })),
            ),
        );
    }
    let engine = engine_with(backend, Arc::new(MemoryStore::new()), Plan::Pro, 0);
    engine.set_media(video("first")).unwrap();

    let media = engine.media().clone();
    let second = video("second");
    let replacement = second.clone();
    let cancel = CancellationToken::new();
    let (report, _) = tokio::join!(
        engine.generate_all("first clip", Platform::Tiktok, &cancel),
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            media
                .execute(reelkit::media::EditCommand::SetMedia(replacement))
                .unwrap();
        }
    );

    assert!(report.unwrap().is_complete());
    assert_eq!(engine.current(), Some(second));
    assert!(engine.media().generated_captions().is_empty());
    assert!(engine.media().generated_hashtags().is_empty());
}

#[tokio::test]
async fn test_cancelling_generate_all_abandons_in_flight_requests() {
    let backend = Arc::new(FakeBackend::new());
    backend.script(
        Operation::ContentAnalyze,
        FakeReply::delayed(Duration::from_secs(10), FakeReply::Json(serde_json::json!({}))),
    );
    let engine = engine_with(backend.clone(), Arc::new(MemoryStore::new()), Plan::Free, 3);
    engine.set_media(video("clip")).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let (report, _) = tokio::join!(
        engine.generate_all("clip", Platform::Tiktok, &cancel),
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        }
    );
    let report = report.unwrap();

    assert!(report.captions.is_ok());
    assert!(report.hashtags.is_ok());
    assert!(matches!(
        report.analysis.as_ref().err().and_then(classify),
        Some(ReelkitError::Cancelled)
    ));
    // the analysis request was issued but never completed
    assert_eq!(backend.call_count(), 3);
    assert_eq!(backend.completed_count(), 2);
    assert_eq!(engine.media().generated_captions().len(), 3);
}
