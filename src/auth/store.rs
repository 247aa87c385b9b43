//! Authentication and subscription state
//!
//! [`SessionStore`] is the only owner of the session. Other components
//! read snapshots and call the gating primitives, never mutate fields.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::auth::{Identity, IdentityUpdate, Session, Subscription};
use crate::backend::Backend;
use crate::error::{ReelkitError, Result};
use crate::storage::{CredentialStore, AUTH_TOKEN_KEY};

/// How a startup restore ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// No token was stored
    NoToken,
    /// Token verified by the backend; session is authenticated
    Verified,
    /// Backend rejected the token; session was cleared
    Rejected,
    /// Token is held but could not be verified (backend unreachable)
    Unverified,
    /// Durable storage could not be read
    StorageUnavailable,
}

/// Owner of the authenticated identity, token, and subscription
///
/// Created with the loading flag set; [`restore_on_startup`] always
/// clears it.
///
/// [`restore_on_startup`]: SessionStore::restore_on_startup
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use reelkit::auth::{Plan, SessionStore, Subscription};
/// use reelkit::storage::MemoryStore;
///
/// let store = SessionStore::new(Arc::new(MemoryStore::new()));
/// store.set_subscription(Subscription::new(Plan::Free, 1));
///
/// assert!(!store.has_pro_access());
/// assert!(store.consume_credit());
/// assert!(!store.consume_credit());
/// ```
pub struct SessionStore {
    storage: Arc<dyn CredentialStore>,
    state: Mutex<Session>,
    // Held across a durable write and the matching state update. Always
    // taken before `state`.
    persist: Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionStore")
            .field("is_authenticated", &state.is_authenticated)
            .field("is_loading", &state.is_loading)
            .field("plan", &state.subscription.plan)
            .field("credits", &state.subscription.credits)
            .finish()
    }
}

/// Clears the loading flag when dropped, including on early return or
/// when the restore future is abandoned mid-flight.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.lock().is_loading = false;
    }
}

impl SessionStore {
    /// Creates an empty, loading session backed by `storage`
    pub fn new(storage: Arc<dyn CredentialStore>) -> Self {
        Self {
            storage,
            state: Mutex::new(Session {
                is_loading: true,
                ..Session::default()
            }),
            persist: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_persist(&self) -> MutexGuard<'_, ()> {
        self.persist
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Persists `token` and marks the session authenticated as `identity`
    ///
    /// The durable write happens first; if it fails the in-memory state is
    /// left exactly as it was. A concurrent [`clear_session`] runs either
    /// entirely before or entirely after this call.
    ///
    /// [`clear_session`]: SessionStore::clear_session
    ///
    /// # Errors
    ///
    /// Returns the storage error when the token could not be persisted.
    pub fn authenticate(&self, identity: Identity, token: &str) -> Result<()> {
        let _persist = self.lock_persist();
        self.storage.set(AUTH_TOKEN_KEY, token)?;

        let mut state = self.lock();
        tracing::info!(user = %identity.id, "Session authenticated");
        state.identity = Some(identity);
        state.auth_token = Some(token.to_string());
        state.is_authenticated = true;
        state.is_loading = false;
        Ok(())
    }

    /// Logs out: forgets the token and resets the subscription to Free/0
    ///
    /// Deleting the durable token is best-effort; the logical logout
    /// happens even when it fails.
    pub fn clear_session(&self) {
        let _persist = self.lock_persist();
        self.clear_locked();
    }

    /// Clears the session only if it still holds `token`
    ///
    /// Used when a rejection arrives for a request sent with `token`; if the
    /// user has since logged out or logged in again, the rejection is stale
    /// and nothing changes. Returns `true` when the session was cleared.
    pub fn clear_session_if_token(&self, token: Option<&str>) -> bool {
        let _persist = self.lock_persist();
        let held = self.lock().auth_token.clone();
        if held.as_deref() != token {
            tracing::debug!("Ignoring rejection for a token no longer held");
            return false;
        }
        self.clear_locked();
        true
    }

    // Caller holds `persist`.
    fn clear_locked(&self) {
        if let Err(e) = self.storage.delete(AUTH_TOKEN_KEY) {
            tracing::warn!("Failed to delete stored auth token: {}", e);
        }

        let mut state = self.lock();
        state.identity = None;
        state.auth_token = None;
        state.is_authenticated = false;
        state.subscription = Subscription::default();
        tracing::info!("Session cleared");
    }

    /// Restores a stored token and verifies it with the backend
    ///
    /// The session only becomes authenticated after the identity fetch
    /// succeeds. A 401 clears the session; any other failure leaves the
    /// token held but unauthenticated. The loading flag is cleared on every
    /// path.
    pub async fn restore_on_startup(&self, backend: &dyn Backend) -> RestoreOutcome {
        let _loading = LoadingGuard { store: self };

        let token = match self.storage.get(AUTH_TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!("No stored auth token");
                return RestoreOutcome::NoToken;
            }
            Err(e) => {
                tracing::warn!("Load stored auth error: {}", e);
                return RestoreOutcome::StorageUnavailable;
            }
        };

        self.lock().auth_token = Some(token.clone());

        match backend.fetch_identity(&token).await {
            Ok(profile) => {
                let mut state = self.lock();
                if state.auth_token.as_deref() != Some(token.as_str()) {
                    tracing::warn!("Session changed while verifying stored token");
                    return RestoreOutcome::Unverified;
                }
                tracing::info!(
                    user = %profile.user.id,
                    plan = %profile.subscription.plan,
                    "Restored session"
                );
                state.identity = Some(profile.user);
                state.subscription = profile.subscription;
                state.is_authenticated = true;
                RestoreOutcome::Verified
            }
            Err(e) => match ReelkitError::classify(&e) {
                Some(err) if err.is_unauthenticated() => {
                    tracing::warn!("Stored auth token rejected: {}", e);
                    if self.clear_session_if_token(Some(&token)) {
                        RestoreOutcome::Rejected
                    } else {
                        RestoreOutcome::Unverified
                    }
                }
                _ => {
                    tracing::warn!("Could not verify stored auth token: {}", e);
                    RestoreOutcome::Unverified
                }
            },
        }
    }

    /// `true` when the plan is Pro or Premium, regardless of credits
    pub fn has_pro_access(&self) -> bool {
        self.lock().subscription.plan.is_paid()
    }

    /// `true` when at least one credit remains
    pub fn has_credits(&self) -> bool {
        self.lock().subscription.credits > 0
    }

    /// Spends one credit if any remain
    ///
    /// Check and decrement happen under one lock, so concurrent callers can
    /// never both spend the last credit.
    pub fn consume_credit(&self) -> bool {
        let mut state = self.lock();
        if state.subscription.credits == 0 {
            return false;
        }
        state.subscription.credits -= 1;
        tracing::debug!(remaining = state.subscription.credits, "Credit consumed");
        true
    }

    /// Replaces the subscription
    pub fn set_subscription(&self, subscription: Subscription) {
        tracing::debug!(
            plan = %subscription.plan,
            credits = subscription.credits,
            "Subscription updated"
        );
        self.lock().subscription = subscription;
    }

    /// Merges `update` into the held identity
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::Unauthenticated`] when no identity is held.
    pub fn update_identity(&self, update: IdentityUpdate) -> Result<Identity> {
        let mut state = self.lock();
        let identity = state.identity.as_mut().ok_or_else(|| {
            ReelkitError::Unauthenticated("no user is signed in".to_string())
        })?;
        identity.merge(update);
        Ok(identity.clone())
    }

    /// Copy of the full state
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    /// Bearer token held in memory
    pub fn token(&self) -> Option<String> {
        self.lock().auth_token.clone()
    }

    /// `true` once an identity has been verified
    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated
    }

    /// `true` until startup restore completes
    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }
}
