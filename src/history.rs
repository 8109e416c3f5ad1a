// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::trace;

/// Fixed-capacity circular log of changes, keeping track of how many of them can be undone and
/// redone.
///
/// Appending a change drops every change that could have been redone. Once the log is full the
/// oldest change is overwritten.
#[derive(Debug, Clone)]
pub struct History<T> {
    history: Vec<T>,
    history_length: usize,
    num_undo: usize,
    num_redo: usize,
    curr_index: usize,
}

impl<T: Clone> History<T> {
    /// Create an empty history that remembers up to `history_length` changes (at least 1).
    pub fn new(history_length: usize) -> History<T> {
        let history_length = history_length.max(1);
        History {
            history: Vec::with_capacity(history_length),
            history_length,
            num_undo: 0,
            num_redo: 0,
            curr_index: 0,
        }
    }

    /// Capacity of the log.
    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// Number of changes that can be undone.
    pub fn num_undo(&self) -> usize {
        self.num_undo
    }

    /// Number of changes that can be redone.
    pub fn num_redo(&self) -> usize {
        self.num_redo
    }

    /// `true` if `get_undo()` returns a change.
    pub fn has_undo(&self) -> bool {
        self.num_undo > 0
    }

    /// `true` if `get_redo()` returns a change.
    pub fn has_redo(&self) -> bool {
        self.num_redo > 0
    }

    /// Append a change; this invalidates all redos.
    pub fn append(&mut self, change: T) {
        // the slot at the cursor is either the next unused one or an overwritable one
        if self.curr_index < self.history.len() {
            self.history[self.curr_index] = change;
        } else {
            self.history.push(change);
        }
        self.curr_index = (self.curr_index + 1) % self.history_length;
        self.num_undo = (self.num_undo + 1).min(self.history_length);
        self.num_redo = 0;
        trace!("history: appended change, {} undo(s) available", self.num_undo);
    }

    /// Forget every change. The slots are kept but can no longer be read.
    pub fn reset(&mut self) {
        self.num_undo = 0;
        self.num_redo = 0;
        self.curr_index = 0;
    }

    /// Step back one change and return it, `None` if there is nothing to undo.
    pub fn get_undo(&mut self) -> Option<T> {
        if !self.has_undo() {
            return None;
        }
        let new_index = if self.curr_index == 0 { self.history_length - 1 } else { self.curr_index - 1 };
        let change = self.history[new_index].clone();
        self.curr_index = new_index;
        self.num_undo -= 1;
        self.num_redo += 1;
        trace!("history: undo, {} undo(s) and {} redo(s) left", self.num_undo, self.num_redo);
        Some(change)
    }

    /// Step forward one change and return it, `None` if there is nothing to redo.
    pub fn get_redo(&mut self) -> Option<T> {
        if !self.has_redo() {
            return None;
        }
        let change = self.history[self.curr_index].clone();
        self.curr_index = (self.curr_index + 1) % self.history_length;
        self.num_undo = (self.num_undo + 1).min(self.history_length);
        self.num_redo -= 1;
        trace!("history: redo, {} undo(s) and {} redo(s) left", self.num_undo, self.num_redo);
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::History;

    #[test]
    fn empty_history() {
        let mut history: History<u32> = History::new(3);
        assert!(!history.has_undo());
        assert!(!history.has_redo());
        assert_eq!(history.get_undo(), None);
        assert_eq!(history.get_redo(), None);
    }

    #[test]
    fn undo_and_redo_in_order() {
        let mut history = History::new(3);
        history.append(1);
        history.append(2);
        assert_eq!(history.get_undo(), Some(2));
        assert_eq!(history.get_undo(), Some(1));
        assert_eq!(history.get_undo(), None);
        assert_eq!(history.get_redo(), Some(1));
        assert_eq!(history.get_redo(), Some(2));
        assert_eq!(history.get_redo(), None);
        assert_eq!(history.num_undo(), 2);
    }

    #[test]
    fn oldest_changes_are_overwritten() {
        let mut history = History::new(3);
        for change in 1..=5 {
            history.append(change);
        }
        assert_eq!(history.num_undo(), 3);
        assert_eq!(history.get_undo(), Some(5));
        assert_eq!(history.get_undo(), Some(4));
        assert_eq!(history.get_undo(), Some(3));
        assert_eq!(history.get_undo(), None);
        assert_eq!(history.num_redo(), 3);
        assert_eq!(history.get_redo(), Some(3));
    }

    #[test]
    fn append_invalidates_redo() {
        let mut history = History::new(3);
        history.append(1);
        history.append(2);
        history.get_undo();
        assert!(history.has_redo());
        history.append(3);
        assert!(!history.has_redo());
        assert_eq!(history.get_undo(), Some(3));
        assert_eq!(history.get_undo(), Some(1));
    }

    #[test]
    fn reset_forgets_everything() {
        let mut history = History::new(2);
        history.append(1);
        history.get_undo();
        history.reset();
        assert!(!history.has_undo());
        assert!(!history.has_redo());
        history.append(7);
        assert_eq!(history.get_undo(), Some(7));
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut history = History::new(0);
        assert_eq!(history.history_length(), 1);
        history.append(1);
        history.append(2);
        assert_eq!(history.get_undo(), Some(2));
        assert_eq!(history.get_undo(), None);
    }
}
