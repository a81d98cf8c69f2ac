//! Bounded FIFO stream buffer
//!
//! The core bounded-memory guarantee: a stream's retained state is
//! O(capacity) no matter how long it runs or how fast the producer pushes.
//! Append goes to the tail; once the window is full the head is evicted.
//! Record content is never validated here — that is the producer's problem.

use std::collections::VecDeque;

use super::error::ConfigError;

/// Append-only window of the most recent `capacity` records
#[derive(Debug, Clone)]
pub struct StreamBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T: Clone> StreamBuffer<T> {
    /// Create a buffer holding at most `capacity` records (capacity ≥ 1)
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        })
    }

    /// Append to the tail, evicting the head if the window is full
    pub fn append(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Replace the window contents, keeping only the newest `capacity` items
    ///
    /// Used when (re)seeding from a fresh snapshot: the old window is
    /// discarded outright, never merged.
    pub fn reseed(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.clear();
        for item in items {
            self.append(item);
        }
    }

    /// The current window, oldest first
    pub fn window(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// The most recently appended record
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
