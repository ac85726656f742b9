use serde::{Deserialize, Serialize};

/// A single cell value. Everything is text; `""` is a blank cell.
pub type Cell = String;

/// Zero-based coordinates of a cell in the grid.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        CellPos { row, col }
    }

    /// Spreadsheet-style name of the cell, e.g. `(0, 0)` is `A1`.
    pub fn name(&self) -> String {
        format!("{}{}", column_letter(self.col), self.row + 1)
    }
}

/// Convert a zero-based column index to its spreadsheet letter label.
///
/// `0 -> A`, `25 -> Z`, `26 -> AA`, `701 -> ZZ`, `702 -> AAA`.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index as i64;

    while n >= 0 {
        letters.push((b'A' + (n % 26) as u8) as char);
        n = n / 26 - 1;
    }

    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_follow_spreadsheet_labels() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn cell_names_print_one_based() {
        assert_eq!(CellPos::new(0, 0).name(), "A1");
        assert_eq!(CellPos::new(9, 9).name(), "J10");
    }
}
