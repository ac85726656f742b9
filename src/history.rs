//! Undo/Redo history over single-cell edits

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::grid::Grid;

/// Which value `redo` writes back into the stored snapshot.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RedoPolicy {
    /// Reapply the value that was committed by the edit.
    #[default]
    Recorded,
    /// Reapply whatever value is currently staged in the cell input,
    /// as the dashboard always did.
    StagedValue,
}

#[derive(Clone, Debug)]
pub struct EditRecord {
    /// The whole grid as it was immediately before the edit.
    pub snapshot: Grid,
    pub row: usize,
    pub col: usize,
    pub old_value: Cell,
    pub new_value: Cell,
}

/// Linear history with a cursor at the last applied edit.
///
/// `index` is `-1` when nothing is applied and never exceeds
/// `records.len() - 1`.
#[derive(Clone, Debug)]
pub struct History {
    records: Vec<EditRecord>,
    index: isize,
    policy: RedoPolicy,
}

impl History {
    pub fn new() -> Self {
        Self::with_policy(RedoPolicy::default())
    }

    pub fn with_policy(policy: RedoPolicy) -> Self {
        History {
            records: Vec::new(),
            index: -1,
            policy,
        }
    }

    /// Record a committed edit. Anything after the cursor is discarded.
    pub fn record(
        &mut self,
        snapshot: Grid,
        row: usize,
        col: usize,
        old_value: Cell,
        new_value: Cell,
    ) {
        self.records.truncate((self.index + 1) as usize);
        self.records.push(EditRecord {
            snapshot,
            row,
            col,
            old_value,
            new_value,
        });
        self.index = self.records.len() as isize - 1;
    }

    /// Step back one edit, returning the grid as it was before it.
    pub fn undo(&mut self) -> Option<Grid> {
        if self.index < 0 {
            return None;
        }

        let snapshot = self.records[self.index as usize].snapshot.clone();
        self.index -= 1;
        Some(snapshot)
    }

    /// Step forward one edit, returning the grid with that edit reapplied.
    ///
    /// `pending_edit_value` is only consulted under
    /// [`RedoPolicy::StagedValue`].
    pub fn redo(&mut self, pending_edit_value: &str) -> Option<Grid> {
        if !self.can_redo() {
            return None;
        }

        let next = (self.index + 1) as usize;
        let record = &self.records[next];
        let value = match self.policy {
            RedoPolicy::Recorded => record.new_value.clone(),
            RedoPolicy::StagedValue => pending_edit_value.to_string(),
        };

        let mut grid = record.snapshot.clone();
        grid.set(record.row, record.col, value);
        self.index = next as isize;
        Some(grid)
    }

    pub fn can_undo(&self) -> bool {
        self.index >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.records.len() as isize - 1
    }

    /// Cursor position, `-1` when empty or fully undone.
    pub fn index(&self) -> isize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EditRecord] {
        &self.records
    }
}

impl Default for History {
    fn default() -> Self {
        History::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::grid_from;

    fn edit(history: &mut History, grid: &mut Grid, row: usize, col: usize, value: &str) {
        let before = grid.clone();
        let old = grid.set(row, col, value).unwrap();
        history.record(before, row, col, old, value.to_string());
    }

    #[test]
    fn empty_history_is_a_noop() {
        let mut history = History::new();
        assert_eq!(history.index(), -1);
        assert!(history.undo().is_none());
        assert!(history.redo("x").is_none());
    }

    #[test]
    fn undo_returns_pre_edit_snapshot() {
        let mut history = History::new();
        let mut grid = grid_from([vec!["a", "b"]]);
        edit(&mut history, &mut grid, 0, 0, "x");
        edit(&mut history, &mut grid, 0, 1, "y");
        assert_eq!(history.index(), 1);

        assert_eq!(history.undo(), Some(grid_from([vec!["x", "b"]])));
        assert_eq!(history.index(), 0);
        assert_eq!(history.undo(), Some(grid_from([vec!["a", "b"]])));
        assert_eq!(history.index(), -1);
        assert!(history.undo().is_none());
    }

    #[test]
    fn recorded_redo_reapplies_committed_value() {
        let mut history = History::new();
        let mut grid = grid_from([vec!["a", "b"]]);
        edit(&mut history, &mut grid, 0, 1, "y");
        history.undo();

        assert_eq!(history.redo("ignored"), Some(grid_from([vec!["a", "y"]])));
        assert_eq!(history.index(), 0);
        assert!(history.redo("ignored").is_none());
    }

    #[test]
    fn staged_redo_writes_pending_value() {
        let mut history = History::with_policy(RedoPolicy::StagedValue);
        let mut grid = grid_from([vec!["a", "b"]]);
        edit(&mut history, &mut grid, 0, 1, "y");
        history.undo();

        assert_eq!(history.redo(""), Some(grid_from([vec!["a", ""]])));
    }

    #[test]
    fn new_record_truncates_redo_entries() {
        let mut history = History::new();
        let mut grid = grid_from([vec!["a", "b"]]);
        edit(&mut history, &mut grid, 0, 0, "x");
        edit(&mut history, &mut grid, 0, 1, "y");

        grid = history.undo().unwrap();
        edit(&mut history, &mut grid, 0, 0, "z");

        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert!(!history.can_redo());
        assert!(history.redo("y").is_none());
        assert_eq!(history.records()[1].new_value, "z");
    }
}
