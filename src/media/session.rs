//! Per-session media state and its single-writer command surface
//!
//! A [`MediaSession`] owns the edit history, the editor mode, and the
//! generated-content caches for one piece of media. All mutation goes
//! through [`EditCommand`]s so the history invariant is checked in one
//! place. [`MediaSessionHandle`] wraps the session in a mutex and is the
//! serialization point shared with asynchronous callers.
//!
//! Every command bumps a revision counter; `SetMedia` and `Clear` also start
//! a new epoch. A [`SessionTicket`] captured before a backend call lets the
//! caller decide, when the result finally arrives, whether it still belongs
//! to this session.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::{ReelkitError, Result};
use crate::media::{EditHistory, HistoryState, MediaArtifact};

/// Editor tool currently selected for the media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Plain preview
    #[default]
    View,
    /// Video trimming
    Trim,
    /// Cropping
    Crop,
    /// Text overlay
    Text,
    /// Sticker overlay
    Sticker,
}

/// Mutation applied to a [`MediaSession`]
#[derive(Debug, Clone)]
pub enum EditCommand {
    /// Start a new editing session on this artifact
    SetMedia(MediaArtifact),
    /// Append an edited artifact after the cursor
    ApplyEdit(MediaArtifact),
    /// Step back one entry
    Undo,
    /// Step forward one entry
    Redo,
    /// Drop the media and everything scoped to it
    Clear,
}

/// What a command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// State changed
    Changed,
    /// Undo at the start or redo at the tail
    Unchanged,
    /// Result belonged to a session state that no longer exists
    Discarded,
}

/// Marker of the session state a request was issued against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    epoch: u64,
    revision: u64,
}

/// Media state for one editing session
#[derive(Debug, Default)]
pub struct MediaSession {
    history: EditHistory,
    editor_mode: EditorMode,
    generated_captions: Vec<String>,
    generated_hashtags: Vec<String>,
    selected_caption: Option<String>,
    epoch: u64,
    revision: u64,
}

impl MediaSession {
    /// Creates an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one command
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] for `ApplyEdit` without media.
    pub fn apply(&mut self, command: EditCommand) -> Result<EditOutcome> {
        let outcome = match command {
            EditCommand::SetMedia(artifact) => {
                self.history.set_media(artifact);
                self.reset_scoped_state();
                self.epoch += 1;
                EditOutcome::Changed
            }
            EditCommand::ApplyEdit(artifact) => {
                self.history.apply_edit(artifact)?;
                EditOutcome::Changed
            }
            EditCommand::Undo => match self.history.undo() {
                Some(_) => EditOutcome::Changed,
                None => EditOutcome::Unchanged,
            },
            EditCommand::Redo => match self.history.redo() {
                Some(_) => EditOutcome::Changed,
                None => EditOutcome::Unchanged,
            },
            EditCommand::Clear => {
                self.history.clear();
                self.reset_scoped_state();
                self.epoch += 1;
                EditOutcome::Changed
            }
        };

        if outcome == EditOutcome::Changed {
            self.revision += 1;
        }
        self.history.check_invariants()?;
        Ok(outcome)
    }

    /// Ticket for the current state
    pub fn ticket(&self) -> SessionTicket {
        SessionTicket {
            epoch: self.epoch,
            revision: self.revision,
        }
    }

    /// `true` while no `SetMedia`/`Clear` happened since `ticket`
    pub fn is_same_media(&self, ticket: SessionTicket) -> bool {
        self.epoch == ticket.epoch && !self.history.is_empty()
    }

    /// `true` while nothing at all changed since `ticket`
    pub fn is_unchanged_since(&self, ticket: SessionTicket) -> bool {
        self.is_same_media(ticket) && self.revision == ticket.revision
    }

    /// Applies `artifact` as an edit only if the history did not move since `ticket`
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] if the session is empty
    /// and the ticket still matches, which cannot happen through the public API.
    pub fn apply_edit_if_unchanged(
        &mut self,
        ticket: SessionTicket,
        artifact: MediaArtifact,
    ) -> Result<EditOutcome> {
        if !self.is_unchanged_since(ticket) {
            tracing::warn!(
                artifact = %artifact.id,
                "Discarding edit result for a media session that moved on"
            );
            return Ok(EditOutcome::Discarded);
        }
        self.apply(EditCommand::ApplyEdit(artifact))
    }

    /// Stores generated captions if the media is still the one they were made for
    pub fn store_captions(&mut self, ticket: SessionTicket, captions: Vec<String>) -> EditOutcome {
        if !self.is_same_media(ticket) {
            tracing::warn!("Discarding captions generated for previous media");
            return EditOutcome::Discarded;
        }
        self.generated_captions = captions;
        self.selected_caption = None;
        EditOutcome::Changed
    }

    /// Stores generated hashtags if the media is still the one they were made for
    pub fn store_hashtags(&mut self, ticket: SessionTicket, hashtags: Vec<String>) -> EditOutcome {
        if !self.is_same_media(ticket) {
            tracing::warn!("Discarding hashtags generated for previous media");
            return EditOutcome::Discarded;
        }
        self.generated_hashtags = hashtags;
        EditOutcome::Changed
    }

    /// Selects one of the generated captions
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] if `index` is out of range.
    pub fn select_caption(&mut self, index: usize) -> Result<&str> {
        let caption = self.generated_captions.get(index).cloned().ok_or_else(|| {
            ReelkitError::InvalidTransition(format!(
                "caption {} does not exist ({} generated)",
                index,
                self.generated_captions.len()
            ))
        })?;
        Ok(self.selected_caption.insert(caption).as_str())
    }

    /// Switches the editor tool
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] when there is no media to edit.
    pub fn set_editor_mode(&mut self, mode: EditorMode) -> Result<()> {
        if self.history.state() == HistoryState::Empty && mode != EditorMode::View {
            return Err(ReelkitError::InvalidTransition(
                "no media loaded to edit".to_string(),
            )
            .into());
        }
        self.editor_mode = mode;
        Ok(())
    }

    /// Edit history
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Artifact at the history cursor
    pub fn current(&self) -> Option<&MediaArtifact> {
        self.history.current()
    }

    /// Selected editor tool
    pub fn editor_mode(&self) -> EditorMode {
        self.editor_mode
    }

    /// Cached caption variations
    pub fn generated_captions(&self) -> &[String] {
        &self.generated_captions
    }

    /// Cached hashtags
    pub fn generated_hashtags(&self) -> &[String] {
        &self.generated_hashtags
    }

    /// Caption chosen by the user
    pub fn selected_caption(&self) -> Option<&str> {
        self.selected_caption.as_deref()
    }

    fn reset_scoped_state(&mut self) {
        self.editor_mode = EditorMode::View;
        self.generated_captions.clear();
        self.generated_hashtags.clear();
        self.selected_caption = None;
    }
}

/// Shared, serialized access to a [`MediaSession`]
///
/// Cloning the handle shares the same session. The lock is held only for
/// the duration of one synchronous operation, never across an await.
///
/// # Examples
///
/// ```
/// use reelkit::media::{EditCommand, EditOutcome, MediaArtifact, MediaKind, MediaSessionHandle};
///
/// let session = MediaSessionHandle::new();
/// let photo = MediaArtifact::new("file:///a.jpg", MediaKind::Image);
/// session.execute(EditCommand::SetMedia(photo.clone())).unwrap();
///
/// assert_eq!(session.execute(EditCommand::Undo).unwrap(), EditOutcome::Unchanged);
/// assert_eq!(session.current(), Some(photo));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MediaSessionHandle {
    inner: Arc<Mutex<MediaSession>>,
}

impl MediaSessionHandle {
    /// Creates a handle to a fresh, empty session
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MediaSession> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut MediaSession) -> R) -> R {
        f(&mut self.lock())
    }

    /// Applies one command
    ///
    /// # Errors
    ///
    /// See [`MediaSession::apply`].
    pub fn execute(&self, command: EditCommand) -> Result<EditOutcome> {
        self.lock().apply(command)
    }

    /// Ticket for the current state
    pub fn ticket(&self) -> SessionTicket {
        self.lock().ticket()
    }

    /// Ticket plus the artifact it refers to, taken under one lock
    pub fn ticket_with_current(&self) -> Option<(SessionTicket, MediaArtifact)> {
        let session = self.lock();
        session.current().cloned().map(|a| (session.ticket(), a))
    }

    /// See [`MediaSession::apply_edit_if_unchanged`]
    ///
    /// # Errors
    ///
    /// See [`MediaSession::apply_edit_if_unchanged`].
    pub fn apply_edit_if_unchanged(
        &self,
        ticket: SessionTicket,
        artifact: MediaArtifact,
    ) -> Result<EditOutcome> {
        self.lock().apply_edit_if_unchanged(ticket, artifact)
    }

    /// Artifact at the history cursor
    pub fn current(&self) -> Option<MediaArtifact> {
        self.lock().current().cloned()
    }

    /// See [`EditHistory::can_undo`]
    pub fn can_undo(&self) -> bool {
        self.lock().history().can_undo()
    }

    /// See [`EditHistory::can_redo`]
    pub fn can_redo(&self) -> bool {
        self.lock().history().can_redo()
    }

    /// Copy of every history entry
    pub fn history_entries(&self) -> Vec<MediaArtifact> {
        self.lock().history().entries().to_vec()
    }

    /// Copy of the cached captions
    pub fn generated_captions(&self) -> Vec<String> {
        self.lock().generated_captions().to_vec()
    }

    /// Copy of the cached hashtags
    pub fn generated_hashtags(&self) -> Vec<String> {
        self.lock().generated_hashtags().to_vec()
    }
}
