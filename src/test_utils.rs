//! Test utilities for Reelkit
//!
//! Shared fixtures for unit tests: an engine wired to the in-process fake
//! backend and an in-memory credential store, plus error assertions.

use std::sync::Arc;

use crate::auth::{Plan, Subscription};
use crate::backend::FakeBackend;
use crate::config::Config;
use crate::engine::MediaEngine;
use crate::error::ReelkitError;
use crate::storage::MemoryStore;

/// Engine plus handles to its fake collaborators
pub struct TestEngine {
    /// Engine under test
    pub engine: MediaEngine,
    /// Backend the engine talks to
    pub backend: Arc<FakeBackend>,
    /// Credential store the engine persists to
    pub storage: Arc<MemoryStore>,
}

/// Builds an engine whose session holds `plan` with `credits`
pub fn test_engine(plan: Plan, credits: u32) -> TestEngine {
    let backend = Arc::new(FakeBackend::new());
    let storage = Arc::new(MemoryStore::new());
    let engine = MediaEngine::new(&test_config(), backend.clone(), storage.clone());
    engine
        .session()
        .set_subscription(Subscription::new(plan, credits));
    TestEngine {
        engine,
        backend,
        storage,
    }
}

/// Configuration with in-memory storage and a short timeout
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.kind = crate::config::StorageKind::Memory;
    config.backend.timeout_seconds = 5;
    config
}

/// Asserts that `result` failed with a [`ReelkitError`] matching `predicate`
///
/// # Panics
///
/// Panics if `result` is `Ok`, the error is not a `ReelkitError`, or the
/// predicate rejects it.
pub fn assert_reelkit_error<T: std::fmt::Debug>(
    result: crate::error::Result<T>,
    predicate: impl FnOnce(&ReelkitError) -> bool,
) {
    let err = result.expect_err("expected an error");
    let typed = ReelkitError::classify(&err)
        .unwrap_or_else(|| panic!("expected a ReelkitError, got: {}", err));
    assert!(predicate(typed), "unexpected error: {}", typed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_engine_applies_subscription() {
        let t = test_engine(Plan::Free, 2);
        assert_eq!(t.engine.session().snapshot().subscription.credits, 2);
        assert_eq!(t.backend.call_count(), 0);
    }

    #[test]
    fn test_assert_reelkit_error_matches() {
        let result: crate::error::Result<()> = Err(ReelkitError::Cancelled.into());
        assert_reelkit_error(result, |e| matches!(e, ReelkitError::Cancelled));
    }

    #[test]
    #[should_panic(expected = "expected an error")]
    fn test_assert_reelkit_error_panics_on_ok() {
        assert_reelkit_error(Ok(()), |_| true);
    }
}
