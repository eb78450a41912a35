//! Linear undo/redo log of image states.
//!
//! Entries are full [`EncodedImage`] snapshots. `index` points at the
//! displayed entry; pushing after an undo discards everything past it.

use crate::codec::EncodedImage;
use crate::types::EditorError;

/// Undo/redo history of edited images.
///
/// Empty until the first image is loaded (`index() == None`).
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    entries: Vec<EncodedImage>,
    index: Option<usize>,
}

impl EditHistory {
    /// An empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: None,
        }
    }

    /// Record `image` as the new current state, dropping any redo entries.
    pub fn push(&mut self, image: EncodedImage) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(image);
        self.index = Some(self.entries.len() - 1);
    }

    /// Step back one entry and return it.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NothingToUndo`] when the current entry is the
    /// first one or the history is empty. The state is unchanged.
    pub fn undo(&mut self) -> Result<&EncodedImage, EditorError> {
        let index = match self.index {
            Some(i) if i > 0 => i - 1,
            _ => return Err(EditorError::NothingToUndo),
        };
        self.index = Some(index);
        self.entries.get(index).ok_or(EditorError::NothingToUndo)
    }

    /// Step forward one entry and return it.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NothingToRedo`] when the current entry is the
    /// last one or the history is empty. The state is unchanged.
    pub fn redo(&mut self) -> Result<&EncodedImage, EditorError> {
        if !self.can_redo() {
            return Err(EditorError::NothingToRedo);
        }
        let index = self.index.map_or(0, |i| i + 1);
        self.index = Some(index);
        self.entries.get(index).ok_or(EditorError::NothingToRedo)
    }

    /// Start over with `image` as the only entry.
    pub fn reset(&mut self, image: EncodedImage) {
        self.entries.clear();
        self.entries.push(image);
        self.index = Some(0);
    }

    /// The entry at the current index.
    #[must_use]
    pub fn current(&self) -> Option<&EncodedImage> {
        self.index.and_then(|i| self.entries.get(i))
    }

    /// Whether [`undo`](Self::undo) would succeed.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    /// Whether [`redo`](Self::redo) would succeed.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        match self.index {
            Some(i) => i + 1 < self.entries.len(),
            None => false,
        }
    }

    /// Current position, `None` while empty.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// Number of stored entries, including redo entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` before the first image is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All stored entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[EncodedImage] {
        &self.entries
    }
}
