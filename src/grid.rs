use serde::{Deserialize, Serialize};

use crate::cell::Cell;

/// Cell values of the active sheet, row-major.
///
/// Rows produced by the codec all have the same length, but nothing here
/// relies on that: a short row simply reads as blank past its end.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Grid { rows }
    }

    pub fn get(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replace one cell, returning its previous value.
    ///
    /// The grid is never resized: an index outside the row leaves the grid
    /// untouched and returns `None`.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<Cell>) -> Option<Cell> {
        let cell = self.rows.get_mut(row)?.get_mut(col)?;
        Some(std::mem::replace(cell, value.into()))
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        col < self.row_len(row)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

impl From<Vec<Vec<Cell>>> for Grid {
    fn from(rows: Vec<Vec<Cell>>) -> Self {
        Grid::new(rows)
    }
}

/// Build a grid from string literals. Handy in tests and fixtures.
pub fn grid_from<R, C>(rows: R) -> Grid
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: Into<Cell>,
{
    Grid::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect(),
    )
}
