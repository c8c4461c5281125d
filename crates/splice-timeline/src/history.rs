//! Snapshot undo/redo history.
//!
//! Every committed mutation pushes the document as it was before the change.
//! Undo swaps the current document for the latest snapshot and keeps the
//! current one for redo.

/// Bounded undo/redo stacks of document snapshots.
#[derive(Debug, Clone)]
pub struct History<S> {
    /// Snapshots before each committed change (most recent last).
    undo: Vec<S>,
    /// Snapshots replaced by undo (most recent last).
    redo: Vec<S>,
    /// Maximum history depth.
    max_depth: usize,
}

impl<S> History<S> {
    /// Create an empty history keeping at most `max_depth` undo steps.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth,
        }
    }

    /// Record the state before a new change.
    /// Clears the redo stack (new action invalidates redo history).
    pub fn record(&mut self, before: S) {
        self.redo.clear();
        if self.max_depth == 0 {
            return;
        }
        self.undo.push(before);
        if self.undo.len() > self.max_depth {
            self.undo.remove(0);
        }
    }

    /// Step back: returns the state to restore and stores `current` for redo.
    pub fn undo(&mut self, current: S) -> Option<S> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again: returns the state to restore and stores `current`
    /// for undo.
    pub fn redo(&mut self, current: S) -> Option<S> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        Some(next)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Change the depth, dropping the oldest snapshots if needed.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        let excess = self.undo.len().saturating_sub(max_depth);
        self.undo.drain(..excess);
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new(200)
    }
}
