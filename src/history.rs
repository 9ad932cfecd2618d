//! Bounded command history.

use std::collections::VecDeque;

/// Capacity a fresh [`History`] starts with.
pub const DEFAULT_HISTORY_SIZE: usize = 5;

/// Bounded ring of command lines, most recent first.
///
/// Position 0 is the most recently recorded line. Storage grows with the
/// number of entries actually held, never with the configured capacity, so
/// any capacity up to `usize::MAX` is accepted. Recording into a full
/// buffer evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `record` can store anything at all.
    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Entry at logical position `pos` (0 = most recent).
    pub fn get(&self, pos: usize) -> Option<&str> {
        self.entries.get(pos).map(String::as_str)
    }

    /// Entry addressed the way users see it: `1` is the most recent.
    pub fn get_one_based(&self, index: usize) -> Option<&str> {
        index.checked_sub(1).and_then(|pos| self.get(pos))
    }

    /// Record `line` as the most recent entry.
    ///
    /// Empty lines, a line equal to the current most recent entry and any
    /// line while the capacity is zero are ignored. Returns whether the line
    /// was stored.
    pub fn record(&mut self, line: &str) -> bool {
        if line.is_empty() || !self.is_enabled() || self.get(0) == Some(line) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(line.to_owned());
        log::debug!(
            "history: recorded {line:?} ({}/{})",
            self.entries.len(),
            self.capacity
        );
        true
    }

    /// Change the capacity, keeping as many of the most recent entries as fit.
    pub fn resize(&mut self, capacity: usize) {
        let dropped = self.entries.len().saturating_sub(capacity);
        self.entries.truncate(capacity);
        self.entries.shrink_to_fit();
        log::debug!(
            "history: resized {} -> {capacity}, dropped {dropped} entries",
            self.capacity
        );
        self.capacity = capacity;
    }

    /// Entries from most recent to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }
}
