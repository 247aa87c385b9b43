//! Identity and subscription types held by the session store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// No paid access; AI operations spend credits
    #[default]
    Free,
    /// Paid tier
    Pro,
    /// Top paid tier
    Premium,
}

impl Plan {
    /// `true` for the paid tiers
    pub fn is_paid(self) -> bool {
        matches!(self, Self::Pro | Self::Premium)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

/// Plan, credit balance, and expiry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Tier
    #[serde(default)]
    pub plan: Plan,
    /// Remaining AI credits
    #[serde(default)]
    pub credits: u32,
    /// When the paid plan lapses
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Subscription on the given plan with no expiry
    pub fn new(plan: Plan, credits: u32) -> Self {
        Self {
            plan,
            credits,
            expires_at: None,
        }
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend user id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    /// Identity with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
        }
    }
}

/// Partial update merged into the held identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUpdate {
    /// New display name
    pub name: Option<String>,
    /// New email address
    pub email: Option<String>,
}

impl Identity {
    /// Applies the fields present in `update`
    pub fn merge(&mut self, update: IdentityUpdate) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
    }
}

/// What the identity endpoint returns for a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// The user
    pub user: Identity,
    /// Their subscription
    #[serde(default)]
    pub subscription: Subscription,
}

/// Read-only copy of the session store state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Verified user, if any
    pub identity: Option<Identity>,
    /// Bearer token held in memory
    pub auth_token: Option<String>,
    /// Plan and credits
    pub subscription: Subscription,
    /// A verified identity is held
    pub is_authenticated: bool,
    /// Startup restore still running
    pub is_loading: bool,
}
