//! In-process fake backend for unit and integration tests
//!
//! [`FakeBackend`] answers every operation with a canned JSON payload
//! unless a [`FakeReply`] has been scripted for it, and records every
//! request so tests can assert exactly how many calls were made.
//!
//! # Example
//!
//! ```
//! use reelkit::backend::{Backend, BackendRequest, FakeBackend, FakeReply, Operation};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = FakeBackend::new();
//! backend.script(Operation::HashtagsGenerate, FakeReply::reject(500, "engine down"));
//!
//! let result = backend
//!     .dispatch(BackendRequest {
//!         operation: Operation::HashtagsGenerate,
//!         payload: serde_json::json!({}),
//!         bearer_token: None,
//!     })
//!     .await;
//!
//! assert!(result.is_err());
//! assert_eq!(backend.call_count(), 1);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::auth::{AccountProfile, Identity, Subscription};
use crate::backend::{Backend, BackendRequest, Operation};
use crate::error::{ReelkitError, Result, NETWORK_ERROR_MESSAGE};

/// Scripted answer for one operation
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Success with this body
    Json(Value),
    /// Non-success status with a message
    Reject {
        /// Status code
        status: u16,
        /// Message placed in the error
        message: String,
    },
    /// Network failure
    Unavailable,
    /// Wait, then answer
    Delayed(Duration, Box<FakeReply>),
}

impl FakeReply {
    /// Non-success reply
    pub fn reject(status: u16, message: impl Into<String>) -> Self {
        Self::Reject {
            status,
            message: message.into(),
        }
    }

    /// Waits `delay` before giving `reply`
    pub fn delayed(delay: Duration, reply: FakeReply) -> Self {
        Self::Delayed(delay, Box::new(reply))
    }
}

#[derive(Debug, Default)]
struct FakeState {
    scripted: HashMap<Operation, FakeReply>,
    identity: Option<FakeReply>,
    calls: Vec<BackendRequest>,
    identity_calls: usize,
    completed: usize,
}

/// Recording backend with canned responses
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    /// Fake that answers every operation successfully
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets the reply for every future call of `operation`
    pub fn script(&self, operation: Operation, reply: FakeReply) {
        self.lock().scripted.insert(operation, reply);
    }

    /// Sets the reply for identity fetches
    ///
    /// Without a script, any token is accepted as a Free user with no credits.
    pub fn script_identity(&self, reply: FakeReply) {
        self.lock().identity = Some(reply);
    }

    /// Makes identity fetches return `profile`
    pub fn set_profile(&self, profile: &AccountProfile) {
        let body = serde_json::to_value(profile).unwrap_or(Value::Null);
        self.script_identity(FakeReply::Json(body));
    }

    /// Every AI request received, in order
    pub fn calls(&self) -> Vec<BackendRequest> {
        self.lock().calls.clone()
    }

    /// Number of AI requests received
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of AI requests received for `operation`
    pub fn calls_for(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Number of AI requests that ran to completion (not dropped mid-delay)
    pub fn completed_count(&self) -> usize {
        self.lock().completed
    }

    /// Number of identity fetches received
    pub fn identity_calls(&self) -> usize {
        self.lock().identity_calls
    }

    /// Canned success body for `request`
    pub fn default_reply(request: &BackendRequest) -> Value {
        let platform = request
            .payload
            .get("platform")
            .cloned()
            .unwrap_or(Value::Null);
        match request.operation {
            Operation::CaptionGenerate => json!({
                "caption": "Golden hour never disappoints"
            }),
            Operation::CaptionVariations => json!({
                "variations": [
                    "Golden hour never disappoints",
                    "Chasing the last light of the day",
                    "Sunset therapy, no filter needed"
                ]
            }),
            Operation::HashtagsGenerate => json!({
                "hashtags": ["#sunset", "#goldenhour", "#timelapse", "#ocean"]
            }),
            Operation::PostingTimes => json!({
                "platform": platform,
                "timezone": request.payload.get("timezone").cloned().unwrap_or(json!("UTC")),
                "bestTimes": ["Tue 18:00", "Thu 12:00", "Sat 09:00"]
            }),
            Operation::ContentAnalyze => json!({
                "analysis": {
                    "score": 82,
                    "strengths": ["Strong opening shot"],
                    "improvements": ["Add a hook in the first second"]
                }
            }),
            Operation::ContentSuggestions => json!({
                "suggestions": ["Behind the scenes", "Day in the life"]
            }),
            Operation::WatermarkDetect => json!({
                "detected": true,
                "confidence": 0.93
            }),
            Operation::WatermarkRemove => {
                let source = request
                    .payload
                    .get("mediaUrl")
                    .and_then(Value::as_str)
                    .unwrap_or("media");
                json!({
                    "mediaUrl": format!("{}.clean", source),
                    "provenanceAdded": request
                        .payload
                        .get("addProvenance")
                        .cloned()
                        .unwrap_or(json!(false))
                })
            }
        }
    }
}

async fn resolve(mut reply: FakeReply) -> Result<Value> {
    loop {
        match reply {
            FakeReply::Json(value) => return Ok(value),
            FakeReply::Reject { status: 401, message } => {
                return Err(ReelkitError::Unauthenticated(message).into())
            }
            FakeReply::Reject { status, message } => {
                return Err(ReelkitError::BackendRejected { status, message }.into())
            }
            FakeReply::Unavailable => {
                return Err(
                    ReelkitError::BackendUnavailable(NETWORK_ERROR_MESSAGE.to_string()).into(),
                )
            }
            FakeReply::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_identity(&self, token: &str) -> Result<AccountProfile> {
        let scripted = {
            let mut state = self.lock();
            state.identity_calls += 1;
            state.identity.clone()
        };
        match scripted {
            Some(reply) => Ok(serde_json::from_value(resolve(reply).await?)?),
            None => Ok(AccountProfile {
                user: Identity::new(format!("user-{}", token.len())),
                subscription: Subscription::default(),
            }),
        }
    }

    async fn dispatch(&self, request: BackendRequest) -> Result<Value> {
        let reply = {
            let mut state = self.lock();
            state.calls.push(request.clone());
            state
                .scripted
                .get(&request.operation)
                .cloned()
                .unwrap_or_else(|| FakeReply::Json(Self::default_reply(&request)))
        };
        let result = resolve(reply).await;
        self.lock().completed += 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(operation: Operation) -> BackendRequest {
        BackendRequest {
            operation,
            payload: json!({"mediaUrl": "file:///a.jpg", "addProvenance": true}),
            bearer_token: None,
        }
    }

    #[tokio::test]
    async fn test_default_reply_for_watermark_removal_derives_url() {
        let backend = FakeBackend::new();
        let value = backend
            .dispatch(request(Operation::WatermarkRemove))
            .await
            .unwrap();
        assert_eq!(value["mediaUrl"], "file:///a.jpg.clean");
        assert_eq!(value["provenanceAdded"], true);
    }

    #[tokio::test]
    async fn test_scripted_401_maps_to_unauthenticated() {
        let backend = FakeBackend::new();
        backend.script(Operation::CaptionGenerate, FakeReply::reject(401, "expired"));
        let err = backend
            .dispatch(request(Operation::CaptionGenerate))
            .await
            .unwrap_err();
        assert!(matches!(
            ReelkitError::classify(&err),
            Some(ReelkitError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_records_calls_per_operation() {
        let backend = FakeBackend::new();
        backend
            .dispatch(request(Operation::HashtagsGenerate))
            .await
            .unwrap();
        backend
            .dispatch(request(Operation::HashtagsGenerate))
            .await
            .unwrap();
        assert_eq!(backend.calls_for(Operation::HashtagsGenerate), 2);
        assert_eq!(backend.calls_for(Operation::CaptionGenerate), 0);
        assert_eq!(backend.completed_count(), 2);
    }

    #[tokio::test]
    async fn test_identity_defaults_to_free_user() {
        let backend = FakeBackend::new();
        let profile = backend.fetch_identity("tok").await.unwrap();
        assert_eq!(profile.subscription, Subscription::default());
        assert_eq!(backend.identity_calls(), 1);
    }
}
