//! Reelkit - client-side media session engine
//!
//! This library tracks a photo or video through a sequence of edits with
//! linear undo/redo, coordinates credit-gated calls to an AI backend, and
//! manages the authentication session that gates all of it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Session store, identity, subscription, and access gating
//! - `storage`: Durable credential storage (OS keyring or in-memory)
//! - `media`: Media artifacts, edit history, and per-session state
//! - `backend`: AI backend contract, HTTP client, and in-process fake
//! - `generation`: Generation orchestrator and typed results
//! - `publish`: Publish plan coordinator
//! - `transform`: Media-transform collaborator contract
//! - `engine`: Context object wiring one editing session together
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use reelkit::backend::FakeBackend;
//! use reelkit::media::{MediaArtifact, MediaKind};
//! use reelkit::storage::MemoryStore;
//! use reelkit::{Config, MediaEngine};
//!
//! let engine = MediaEngine::new(
//!     &Config::default(),
//!     Arc::new(FakeBackend::new()),
//!     Arc::new(MemoryStore::new()),
//! );
//!
//! let photo = MediaArtifact::new("file:///photo.jpg", MediaKind::Image);
//! engine.set_media(photo.clone()).unwrap();
//! engine.apply_edit(photo.derive("file:///photo-cropped.jpg")).unwrap();
//! engine.undo().unwrap();
//! assert_eq!(engine.current(), Some(photo));
//! ```

pub mod auth;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod media;
pub mod publish;
pub mod storage;
pub mod transform;

// Re-export commonly used types
pub use auth::SessionStore;
pub use config::Config;
pub use engine::MediaEngine;
pub use error::{ReelkitError, Result};
pub use generation::GenerationOrchestrator;
pub use media::{EditHistory, MediaArtifact, MediaKind};

#[cfg(test)]
pub mod test_utils;
