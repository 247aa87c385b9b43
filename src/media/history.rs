//! Linear undo/redo history over media artifacts
//!
//! The history is a sequence of artifact snapshots plus a cursor naming the
//! current one. It is strictly linear: an edit made after an undo truncates
//! everything past the cursor, so the undone branch becomes unreachable.
//! Branching histories are not supported.
//!
//! Invariant after every operation: the cursor is `None` exactly when the
//! history is empty, and otherwise indexes a valid entry.

use crate::error::{ReelkitError, Result};
use crate::media::MediaArtifact;

/// Observable state of an [`EditHistory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// No artifact
    Empty,
    /// Cursor points at a valid entry
    Active,
}

/// Undo/redo history for one editing session
///
/// # Examples
///
/// ```
/// use reelkit::media::{EditHistory, MediaArtifact, MediaKind};
///
/// let photo = MediaArtifact::new("file:///a.jpg", MediaKind::Image);
/// let cropped = photo.derive("file:///a-crop.jpg");
///
/// let mut history = EditHistory::new();
/// history.set_media(photo.clone());
/// history.apply_edit(cropped.clone()).unwrap();
///
/// assert_eq!(history.current(), Some(&cropped));
/// assert_eq!(history.undo(), Some(&photo));
/// assert!(history.undo().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    entries: Vec<MediaArtifact>,
    cursor: Option<usize>,
}

impl EditHistory {
    /// Creates an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of the machine
    pub fn state(&self) -> HistoryState {
        match self.cursor {
            None => HistoryState::Empty,
            Some(_) => HistoryState::Active,
        }
    }

    /// Artifact at the cursor
    pub fn current(&self) -> Option<&MediaArtifact> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    /// Cursor position, `None` when empty
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of entries, including any redo branch
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no artifact is held
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in order
    pub fn entries(&self) -> &[MediaArtifact] {
        &self.entries
    }

    /// Replaces the whole history with `[artifact]`
    ///
    /// Valid from any state; any prior history is discarded.
    pub fn set_media(&mut self, artifact: MediaArtifact) {
        tracing::debug!(
            artifact = %artifact.id,
            discarded = self.entries.len(),
            "History reset to new media"
        );
        self.entries.clear();
        self.entries.push(artifact);
        self.cursor = Some(0);
        self.debug_check();
    }

    /// Appends `artifact` after the cursor, discarding the redo branch
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] when the history is empty.
    pub fn apply_edit(&mut self, artifact: MediaArtifact) -> Result<()> {
        let cursor = self.cursor.ok_or_else(|| {
            ReelkitError::InvalidTransition("cannot apply an edit without media".to_string())
        })?;

        let dropped = self.entries.len() - (cursor + 1);
        self.entries.truncate(cursor + 1);
        self.entries.push(artifact);
        self.cursor = Some(self.entries.len() - 1);

        tracing::debug!(
            cursor = cursor + 1,
            depth = self.entries.len(),
            dropped_redo = dropped,
            "Edit applied"
        );
        self.debug_check();
        Ok(())
    }

    /// Moves the cursor back one entry
    ///
    /// Returns the new current artifact, or `None` when there is nothing to
    /// undo. The no-op case leaves the history untouched.
    pub fn undo(&mut self) -> Option<&MediaArtifact> {
        if !self.can_undo() {
            tracing::debug!("Nothing to undo");
            return None;
        }
        let cursor = self.cursor.map(|c| c - 1);
        self.cursor = cursor;
        tracing::debug!(cursor = ?self.cursor, "Undo");
        self.debug_check();
        self.current()
    }

    /// Moves the cursor forward one entry
    ///
    /// Returns the new current artifact, or `None` at the tail.
    pub fn redo(&mut self) -> Option<&MediaArtifact> {
        if !self.can_redo() {
            tracing::debug!("Nothing to redo");
            return None;
        }
        let cursor = self.cursor.map(|c| c + 1);
        self.cursor = cursor;
        tracing::debug!(cursor = ?self.cursor, "Redo");
        self.debug_check();
        self.current()
    }

    /// Drops every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        tracing::debug!("History cleared");
        self.debug_check();
    }

    /// Returns `true` when [`undo`](Self::undo) would move the cursor
    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    /// Returns `true` when [`redo`](Self::redo) would move the cursor
    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// Checks the cursor/length invariant
    ///
    /// # Errors
    ///
    /// Returns [`ReelkitError::InvalidTransition`] describing the violation.
    pub fn check_invariants(&self) -> Result<()> {
        match (self.cursor, self.entries.len()) {
            (None, 0) => Ok(()),
            (Some(c), len) if c < len => Ok(()),
            (cursor, len) => Err(ReelkitError::InvalidTransition(format!(
                "cursor {:?} is invalid for history of length {}",
                cursor, len
            ))
            .into()),
        }
    }

    fn debug_check(&self) {
        debug_assert!(self.check_invariants().is_ok());
    }
}
