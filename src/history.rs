use std::collections::VecDeque;

use crate::engine::{Board, Score};

/// Maximum number of undo steps retained.
pub const HISTORY_CAPACITY: usize = 10;

/// Deep copy of the rewindable part of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub board: Board,
    pub score: Score,
    pub moves: u64,
}

/// Bounded undo stack; pushing past capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
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

    /// Record a snapshot, evicting the oldest one when full.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop_back()
    }

    /// Take the snapshot `steps` entries back, discarding everything newer.
    ///
    /// Asking for more steps than recorded rewinds to the oldest entry.
    pub fn pop_n(&mut self, steps: usize) -> Option<Snapshot> {
        if steps == 0 || self.entries.is_empty() {
            return None;
        }
        let keep = self.entries.len().saturating_sub(steps);
        self.entries.drain(keep..).next()
    }

    pub fn peek(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BoardSize;

    fn snap(moves: u64) -> Snapshot {
        Snapshot { board: Board::empty(BoardSize::DEFAULT), score: moves * 4, moves }
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut h = History::new();
        for m in 0..15 {
            h.push(snap(m));
        }
        assert_eq!(h.len(), HISTORY_CAPACITY);
        assert_eq!(h.iter().next().map(|s| s.moves), Some(5));
        assert_eq!(h.peek().map(|s| s.moves), Some(14));
    }

    #[test]
    fn pop_is_lifo_until_exhausted() {
        let mut h = History::new();
        h.push(snap(1));
        h.push(snap(2));
        assert_eq!(h.pop().map(|s| s.moves), Some(2));
        assert_eq!(h.pop().map(|s| s.moves), Some(1));
        assert_eq!(h.pop(), None);
        assert!(h.is_empty());
    }

    #[test]
    fn pop_n_rewinds_several_steps() {
        let mut h = History::new();
        for m in 0..6 {
            h.push(snap(m));
        }
        assert_eq!(h.pop_n(3).map(|s| s.moves), Some(3));
        assert_eq!(h.len(), 3);
        assert_eq!(h.pop_n(10).map(|s| s.moves), Some(0));
        assert!(h.is_empty());
        assert_eq!(h.pop_n(1), None);
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut h = History::with_capacity(0);
        h.push(snap(1));
        assert!(h.is_empty());
    }
}
