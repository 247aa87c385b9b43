//! Media artifacts and the edit history engine
//!
//! - `artifact`: immutable [`MediaArtifact`] values
//! - `history`: the linear undo/redo state machine
//! - `session`: per-editing-session state, commands, and cancellation tickets

pub mod artifact;
pub mod history;
pub mod session;

pub use artifact::{MediaArtifact, MediaKind};
pub use history::{EditHistory, HistoryState};
pub use session::{
    EditCommand, EditOutcome, EditorMode, MediaSession, MediaSessionHandle, SessionTicket,
};
