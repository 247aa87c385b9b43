//! Session store: authentication lifecycle and access gating
//!
//! All gating decisions for AI operations flow through
//! [`SessionStore::has_pro_access`] and [`SessionStore::consume_credit`].

pub mod account;
pub mod store;

pub use account::{AccountProfile, Identity, IdentityUpdate, Plan, Session, Subscription};
pub use store::{RestoreOutcome, SessionStore};
