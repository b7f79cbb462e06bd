//! A binary max-heap priority queue backed by a plain `Vec`.
//!
//! Unlike `std::collections::BinaryHeap` this queue exposes its elements
//! for in-place inspection and mutation (`iter`, `iter_mut`, `peek_mut`),
//! which the replicated maps in `docweave` rely on: entries are never
//! structurally removed, only flagged through interior state that does not
//! participate in `Ord`.

use serde::{Deserialize, Serialize};

/// A max-heap: `peek` returns the greatest element under `T`'s `Ord`.
///
/// Mutations through `peek_mut` / `iter_mut` must not change the result of
/// comparing the element against its neighbours, otherwise the heap order
/// is no longer maintained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityQueue<T: Ord> {
    items: Vec<T>,
}

impl<T: Ord> PriorityQueue<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert `value`, restoring the heap order by sifting it up.
    pub fn push(&mut self, value: T) {
        self.items.push(value);
        self.sift_up(self.items.len() - 1);
    }

    /// The greatest element, if any.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Mutable access to the greatest element.
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.items.first_mut()
    }

    /// All elements in internal heap order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Mutable iteration in internal heap order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.items[idx] <= self.items[parent] {
                break;
            }
            self.items.swap(idx, parent);
            idx = parent;
        }
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
