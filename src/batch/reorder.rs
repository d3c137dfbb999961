//! Restores ascending index order over results that complete in any order.

use std::collections::BTreeMap;

/// Holds out-of-order items until every lower index has been released.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: usize,
    pending: BTreeMap<usize, T>,
}

impl<T> ReorderBuffer<T> {
    /// Creates a buffer whose first released index is `first`.
    #[must_use]
    pub fn new(first: usize) -> Self {
        Self {
            next: first,
            pending: BTreeMap::new(),
        }
    }

    /// Stores the item completed for `index`.
    ///
    /// Indices below the release point are ignored; a repeated index
    /// replaces the earlier item.
    pub fn push(&mut self, index: usize, item: T) {
        if index >= self.next {
            self.pending.insert(index, item);
        }
    }

    /// Removes and returns the contiguous run starting at the release point.
    pub fn pop_ready(&mut self) -> Vec<T> {
        let mut ready = Vec::new();
        while let Some(item) = self.pending.remove(&self.next) {
            ready.push(item);
            self.next += 1;
        }
        ready
    }

    /// Index the buffer is waiting on.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Items held back behind a gap.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
