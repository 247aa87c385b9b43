//! Publish coordinator
//!
//! Accumulates target platforms and an optional schedule for the finished
//! artifact, then hands both to a [`Publisher`]. A plan is consumed by
//! exactly one commit attempt; success or failure, the coordinator is left
//! holding an empty plan.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReelkitError, Result};
use crate::generation::Platform;
use crate::media::MediaArtifact;

/// Where and when to publish
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPlan {
    /// Destinations, deduplicated
    pub target_platforms: BTreeSet<Platform>,
    /// Publish immediately when `None`
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl PublishPlan {
    /// `true` when no platform is selected
    pub fn is_empty(&self) -> bool {
        self.target_platforms.is_empty()
    }
}

/// Acknowledgement returned by a publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Publisher-side reference for the submission
    pub reference: String,
}

/// External publish collaborator
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Submits `artifact` according to `plan`
    async fn publish(&self, plan: &PublishPlan, artifact: &MediaArtifact) -> Result<PublishReceipt>;
}

/// Builds a [`PublishPlan`] incrementally
#[derive(Debug, Default)]
pub struct PublishCoordinator {
    plan: PublishPlan,
}

impl PublishCoordinator {
    /// Coordinator with an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `platform` if absent, removes it if present
    ///
    /// Returns `true` when the platform is selected afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelkit::generation::Platform;
    /// use reelkit::publish::PublishCoordinator;
    ///
    /// let mut coordinator = PublishCoordinator::new();
    /// assert!(coordinator.toggle_platform(Platform::Tiktok));
    /// assert!(!coordinator.toggle_platform(Platform::Tiktok));
    /// assert!(coordinator.plan().is_empty());
    /// ```
    pub fn toggle_platform(&mut self, platform: Platform) -> bool {
        let selected = if self.plan.target_platforms.remove(&platform) {
            false
        } else {
            self.plan.target_platforms.insert(platform);
            true
        };
        tracing::debug!(%platform, selected, "Toggled publish target");
        selected
    }

    /// Sets or clears the schedule
    pub fn set_schedule(&mut self, at: Option<DateTime<Utc>>) {
        tracing::debug!(scheduled_at = ?at, "Publish schedule updated");
        self.plan.scheduled_at = at;
    }

    /// Plan as currently built
    pub fn plan(&self) -> &PublishPlan {
        &self.plan
    }

    /// Takes the plan, leaving an empty one behind
    pub fn take_plan(&mut self) -> PublishPlan {
        std::mem::take(&mut self.plan)
    }

    /// Hands the plan and `artifact` to `publisher`
    ///
    /// The plan is reset before the publisher is contacted, so a failed
    /// commit leaves nothing selected. Commits are never retried here.
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidPublishPlan`] when no platform is
    /// selected (the publisher is not contacted), or the publisher's error.
    pub async fn commit(
        &mut self,
        publisher: &dyn Publisher,
        artifact: &MediaArtifact,
    ) -> Result<PublishReceipt> {
        let plan = self.take_plan();
        if plan.is_empty() {
            return Err(
                ReelkitError::InvalidPublishPlan("select at least one platform".to_string()).into(),
            );
        }

        tracing::info!(
            artifact = %artifact.id,
            targets = plan.target_platforms.len(),
            scheduled = plan.scheduled_at.is_some(),
            "Committing publish plan"
        );

        match publisher.publish(&plan, artifact).await {
            Ok(receipt) => {
                tracing::info!(reference = %receipt.reference, "Publish accepted");
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!("Publish failed; plan was reset: {}", e);
                Err(e)
            }
        }
    }
}
