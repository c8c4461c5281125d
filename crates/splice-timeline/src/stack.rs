//! Ordered, reorderable layer stacks shared by masks and adjustment layers.
//!
//! Index 0 is painted first (bottom); the last entry is painted last (top).
//! Entries are addressed by id; indices only matter for reordering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TimelineError, TimelineResult};

/// An entry that can live in a [`LayerStack`].
pub trait StackEntry {
    type Id: Copy + Eq + fmt::Debug;

    fn id(&self) -> Self::Id;
}

/// Ordered list of layers in paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerStack<T> {
    entries: Vec<T>,
}

impl<T> LayerStack<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }
}

impl<T: StackEntry> LayerStack<T> {
    /// Add an entry on top of the stack.
    pub fn push(&mut self, entry: T) -> T::Id {
        let id = entry.id();
        self.entries.push(entry);
        id
    }

    /// Remove an entry by id.
    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        let idx = self.index_of(id)?;
        Some(self.entries.remove(idx))
    }

    /// Move the entry at `old_index` so it ends up at `new_index`.
    pub fn reorder(&mut self, old_index: usize, new_index: usize) -> TimelineResult<()> {
        let len = self.entries.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(TimelineError::IndexOutOfBounds { index, len });
            }
        }
        let entry = self.entries.remove(old_index);
        self.entries.insert(new_index, entry);
        Ok(())
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    /// Paint-order position of an entry.
    pub fn index_of(&self, id: T::Id) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }
}

impl<T> Default for LayerStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a LayerStack<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
