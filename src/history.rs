//! # Snapshot History
//!
//! Undo/redo as two stacks of full snapshots.
//!
//! ```text
//!   record(cur):  past.push(cur); future.clear()
//!   undo(cur):    s = past.pop();   future.push(cur); restore s
//!   redo(cur):    s = future.pop(); past.push(cur);   restore s
//! ```
//!
//! The caller owns the live state: `undo`/`redo` take the current state and
//! hand back the snapshot to restore, or `None` when the relevant stack is
//! empty (a no-op, never an error).

/// Snapshot stacks. `past` is ordered oldest → newest.
#[derive(Debug, Clone)]
pub struct History<S> {
    past: Vec<S>,
    future: Vec<S>,
    limit: usize,
}

impl<S> History<S> {
    /// Create an empty history holding at most `limit` undo steps.
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Push the state as it was before a mutation. Clears the redo stack.
    pub fn record(&mut self, current: S) {
        self.past.push(current);
        self.future.clear();
        if self.past.len() > self.limit {
            let excess = self.past.len() - self.limit;
            self.past.drain(..excess);
        }
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self, current: S) -> Option<S> {
        let previous = self.past.pop()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self, current: S) -> Option<S> {
        let next = self.future.pop()?;
        self.past.push(current);
        Some(next)
    }

    /// Take back the most recent record without touching the redo stack
    /// (an abandoned gesture).
    pub fn pop(&mut self) -> Option<S> {
        self.past.pop()
    }

    /// Drop both stacks (template load).
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_empty() {
        let history: History<u32> = History::new(10);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 0);
    }

    #[test]
    fn test_pop_discards_last_record() {
        let mut history = History::new(10);
        history.record(1);
        history.record(2);
        assert_eq!(history.pop(), Some(2));
        assert_eq!(history.undo_depth(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut history: History<u32> = History::new(10);
        assert_eq!(history.undo(5), None);
        assert_eq!(history.redo(5), None);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_undo_redo_sequence() {
        let mut history = History::new(10);
        let mut state = 0;
        for next in 1..=3 {
            history.record(state);
            state = next;
        }

        state = history.undo(state).unwrap();
        assert_eq!(state, 2);
        state = history.undo(state).unwrap();
        assert_eq!(state, 1);
        assert_eq!(history.redo_depth(), 2);

        state = history.redo(state).unwrap();
        assert_eq!(state, 2);
        state = history.redo(state).unwrap();
        assert_eq!(state, 3);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = History::new(10);
        history.record(0);
        let restored = history.undo(1).unwrap();
        assert_eq!(restored, 0);
        assert!(history.can_redo());

        history.record(restored);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(i);
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(history.undo(99), Some(4));
        assert_eq!(history.undo(4), Some(3));
        assert_eq!(history.undo(3), Some(2));
        assert_eq!(history.undo(2), None);
    }

    #[test]
    fn test_clear() {
        let mut history = History::new(3);
        history.record(1);
        history.undo(2);
        history.record(3);
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
