//! Pending row queue.
//!
//! Rows wait here in arrival order until a flush commits them. Items leave
//! the front of the queue only after they have been handled, so a failed
//! flush keeps the failing item and everything behind it.

use std::collections::vec_deque::{self, VecDeque};

/// First-in-first-out queue of items awaiting insertion.
#[derive(Debug, Clone)]
pub struct PendingQueue<T> {
    items: VecDeque<T>,
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append an item to the tail.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// The item that the next flush step will handle.
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Remove the front item once it has been handled.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Iterate in commit order.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
