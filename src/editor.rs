//! Grid editor: the cell-editing state machine behind the preview panel.
//!
//! The editor is either `Viewing` (at most one cell focused, nothing being
//! typed) or `Editing` one cell with a staged value that has not reached
//! the grid yet. Committing a staged value that differs from the cell
//! records one history entry and marks the grid modified; committing an
//! unchanged value does nothing at all.

use log::debug;
use serde::Serialize;

use crate::cell::{Cell, CellPos};
use crate::clipboard::{Clipboard, ClipboardError};
use crate::downloader::{self, DEFAULT_SHEET_NAME};
use crate::grid::Grid;
use crate::history::{History, RedoPolicy};
use crate::keys::{Key, KeyEvent, Shortcut};
use crate::loader::{CodecError, Workbook};

/// The cell currently in inline-edit mode and its uncommitted value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditingCursor {
    pub row: usize,
    pub col: usize,
    pub value: Cell,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Viewing,
    Editing(EditingCursor),
}

/// What a key press did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    /// Not meant for the editor in its current state.
    Ignored,
    /// A copy or paste could not reach the clipboard. Nothing changed.
    ClipboardFailed(ClipboardError),
}

#[derive(Clone, Debug)]
pub struct GridEditor {
    grid: Grid,
    history: History,
    state: EditorState,
    focus: Option<CellPos>,
    modified: bool,
    sheet_name: String,
}

impl GridEditor {
    pub fn new(grid: Grid, sheet_name: impl Into<String>, policy: RedoPolicy) -> Self {
        GridEditor {
            grid,
            history: History::with_policy(policy),
            state: EditorState::Viewing,
            focus: None,
            modified: false,
            sheet_name: sheet_name.into(),
        }
    }

    pub fn from_workbook(workbook: Workbook, policy: RedoPolicy) -> Self {
        Self::new(workbook.grid, workbook.active_sheet, policy)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn editing(&self) -> Option<&EditingCursor> {
        match &self.state {
            EditorState::Editing(cursor) => Some(cursor),
            EditorState::Viewing => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing().is_some()
    }

    pub fn focus(&self) -> Option<CellPos> {
        self.focus
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// The value in the cell input; empty when nothing is being edited.
    pub fn staged_value(&self) -> &str {
        self.editing().map_or("", |cursor| cursor.value.as_str())
    }

    /// Focus a cell without entering edit mode.
    pub fn select(&mut self, row: usize, col: usize) -> bool {
        if !self.grid.contains(row, col) {
            return false;
        }
        self.commit();
        self.focus = Some(CellPos::new(row, col));
        true
    }

    /// Click on a cell: commit whatever is being edited elsewhere, then
    /// start editing the clicked cell with its current value staged.
    pub fn click(&mut self, row: usize, col: usize) -> bool {
        if !self.grid.contains(row, col) {
            return false;
        }
        if let Some(cursor) = self.editing() {
            if (cursor.row, cursor.col) == (row, col) {
                return true;
            }
        }

        self.commit();
        self.begin_edit(row, col, None);
        true
    }

    /// Replace the staged value, as typing into the cell input does.
    pub fn input(&mut self, value: impl Into<Cell>) -> bool {
        match &mut self.state {
            EditorState::Editing(cursor) => {
                cursor.value = value.into();
                true
            }
            EditorState::Viewing => false,
        }
    }

    /// Commit the staged value (blur). Returns whether the grid changed.
    pub fn commit(&mut self) -> bool {
        let EditorState::Editing(cursor) = std::mem::take(&mut self.state) else {
            return false;
        };

        self.focus = Some(CellPos::new(cursor.row, cursor.col));
        self.apply_edit(cursor.row, cursor.col, cursor.value)
    }

    /// Leave edit mode without touching the grid (Escape).
    pub fn cancel(&mut self) -> bool {
        let EditorState::Editing(cursor) = std::mem::take(&mut self.state) else {
            return false;
        };

        self.focus = Some(CellPos::new(cursor.row, cursor.col));
        true
    }

    /// Undo the last recorded edit. Only available while viewing.
    pub fn undo(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let Some(grid) = self.history.undo() else {
            return false;
        };

        self.grid = grid;
        self.modified = self.history.index() >= 0;
        debug!("undo -> history index {}", self.history.index());
        true
    }

    /// Redo the next edit. Only available while viewing.
    pub fn redo(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let pending = self.staged_value().to_string();
        let Some(grid) = self.history.redo(&pending) else {
            return false;
        };

        self.grid = grid;
        self.modified = true;
        debug!("redo -> history index {}", self.history.index());
        true
    }

    /// Copy the focused cell to the clipboard.
    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> Result<bool, ClipboardError> {
        if self.is_editing() {
            return Ok(false);
        }
        let Some(pos) = self.focus else {
            return Ok(false);
        };

        clipboard.write_text(self.grid.get(pos.row, pos.col))?;
        Ok(true)
    }

    /// Overwrite the focused cell with the clipboard text.
    ///
    /// A failed read leaves the grid exactly as it was.
    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) -> Result<bool, ClipboardError> {
        if self.is_editing() {
            return Ok(false);
        }
        let Some(pos) = self.focus else {
            return Ok(false);
        };

        let text = clipboard.read_text()?;
        self.apply_edit(pos.row, pos.col, text);
        self.modified = true;
        Ok(true)
    }

    /// Blank the focused cell. Marks the grid modified even when the cell
    /// was already blank.
    pub fn delete(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let Some(pos) = self.focus else {
            return false;
        };

        self.apply_edit(pos.row, pos.col, String::new());
        self.modified = true;
        true
    }

    pub fn handle_key(&mut self, event: KeyEvent, clipboard: &mut dyn Clipboard) -> KeyOutcome {
        if self.is_editing() {
            self.handle_editing_key(event)
        } else {
            self.handle_viewing_key(event, clipboard)
        }
    }

    fn handle_editing_key(&mut self, event: KeyEvent) -> KeyOutcome {
        let Some(cursor) = self.editing() else {
            return KeyOutcome::Ignored;
        };
        let (row, col) = (cursor.row, cursor.col);

        match event.key {
            Key::Enter => {
                self.commit();
                self.move_to(row + 1, col);
            }
            Key::Tab => {
                self.commit();
                self.move_to(row, col + 1);
            }
            Key::Escape => {
                self.cancel();
            }
            Key::Char(c) if !event.command() => {
                if let EditorState::Editing(cursor) = &mut self.state {
                    cursor.value.push(c);
                }
            }
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    fn handle_viewing_key(&mut self, event: KeyEvent, clipboard: &mut dyn Clipboard) -> KeyOutcome {
        let done = |handled: bool| {
            if handled {
                KeyOutcome::Handled
            } else {
                KeyOutcome::Ignored
            }
        };

        if let Some(shortcut) = event.shortcut() {
            return match shortcut {
                Shortcut::Undo => done(self.undo()),
                Shortcut::Redo => done(self.redo()),
                Shortcut::Copy => match self.copy(clipboard) {
                    Ok(copied) => done(copied),
                    Err(err) => KeyOutcome::ClipboardFailed(err),
                },
                Shortcut::Paste => match self.paste(clipboard) {
                    Ok(pasted) => done(pasted),
                    Err(err) => KeyOutcome::ClipboardFailed(err),
                },
            };
        }

        match event.key {
            Key::Delete => done(self.delete()),
            Key::Char(c) if !event.command() => {
                let Some(pos) = self.focus else {
                    return KeyOutcome::Ignored;
                };
                self.begin_edit(pos.row, pos.col, Some(c.to_string()));
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Bytes of the current grid as a one-sheet workbook.
    pub fn export_current_grid(&self) -> Result<Vec<u8>, CodecError> {
        let sheet_name = if self.sheet_name.is_empty() {
            DEFAULT_SHEET_NAME
        } else {
            &self.sheet_name
        };
        downloader::to_xlsx(&self.grid, sheet_name)
    }

    /// A re-encoded workbook when the grid was edited, `None` when the
    /// original upload can be processed unchanged.
    pub fn grid_for_processing(&self) -> Result<Option<Vec<u8>>, CodecError> {
        if !self.modified {
            return Ok(None);
        }
        self.export_current_grid().map(Some)
    }

    fn begin_edit(&mut self, row: usize, col: usize, staged: Option<Cell>) {
        let value = staged.unwrap_or_else(|| self.grid.get(row, col).to_string());
        self.focus = Some(CellPos::new(row, col));
        self.state = EditorState::Editing(EditingCursor { row, col, value });
    }

    // Navigation past the edge of the grid stays in Viewing.
    fn move_to(&mut self, row: usize, col: usize) {
        if self.grid.contains(row, col) {
            self.begin_edit(row, col, None);
        }
    }

    fn apply_edit(&mut self, row: usize, col: usize, value: Cell) -> bool {
        if !self.grid.contains(row, col) || self.grid.get(row, col) == value {
            return false;
        }

        let before = self.grid.clone();
        let Some(old_value) = self.grid.set(row, col, value.clone()) else {
            return false;
        };
        debug!(
            "cell {} changed: {:?} -> {:?}",
            CellPos::new(row, col).name(),
            old_value,
            value
        );
        self.history.record(before, row, col, old_value, value);
        self.modified = true;
        true
    }
}
