use rust_xlsxwriter::Workbook;

use crate::grid::Grid;
use crate::loader::{CodecError, format_number};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// Excel's own sheet limits.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Convert a grid to an XLSX workbook holding a single sheet.
///
/// Cells that hold a plain number (one that prints back exactly as typed)
/// are written as numbers so formulas in the exported file keep working;
/// everything else is written as text. Blank cells are left out.
///
/// # Examples
/// ```
/// use ca_automation::downloader::to_xlsx;
/// use ca_automation::grid::grid_from;
///
/// let grid = grid_from([vec!["Invoice No.", "CGST"], vec!["INV-1", "90"]]);
/// let bytes = to_xlsx(&grid, "Sheet1").unwrap();
/// assert!(bytes.starts_with(b"PK"));
/// ```
pub fn to_xlsx(grid: &Grid, sheet_name: &str) -> Result<Vec<u8>, CodecError> {
    let rows = grid.row_count();
    let cols = grid.width();
    if rows > MAX_ROWS || cols > MAX_COLS {
        return Err(CodecError::TooLarge { rows, cols });
    }

    let sheet_name = if sheet_name.trim().is_empty() {
        DEFAULT_SHEET_NAME
    } else {
        sheet_name
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (r, row) in grid.rows().iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }

            // Bounds were checked above.
            let (r, c) = (r as u32, c as u16);
            match plain_number(value) {
                Some(n) => worksheet.write_number(r, c, n)?,
                None => worksheet.write_string(r, c, value.as_str())?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Parse `value` as a number only if it would print back unchanged, so
/// codes like `007` or `1e3` stay text.
pub fn plain_number(value: &str) -> Option<f64> {
    let n = value.parse::<f64>().ok()?;
    if n.is_finite() && format_number(n) == value {
        Some(n)
    } else {
        None
    }
}

/// Name offered for the edited workbook download.
pub fn modified_file_name(original: &str) -> String {
    format!("modified_{}", original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::grid_from;
    use crate::loader::from_excel;
    use pretty_assertions::assert_eq;

    #[test]
    fn xlsx_round_trips_through_the_loader() {
        let grid = grid_from([
            vec!["GSTIN NO.", "Invoice No.", "CGST"],
            vec!["27AAAPL1234C1Z5", "007", "90"],
            vec!["", "INV/2", "12.5"],
        ]);

        let bytes = to_xlsx(&grid, "Purchases").unwrap();
        let workbook = from_excel(&bytes).unwrap();

        assert_eq!(workbook.sheet_names, vec!["Purchases".to_string()]);
        assert_eq!(workbook.active_sheet, "Purchases");
        assert_eq!(workbook.grid, grid);
    }

    #[test]
    fn blank_sheet_name_falls_back_to_default() {
        let bytes = to_xlsx(&grid_from([vec!["x"]]), "  ").unwrap();
        assert_eq!(from_excel(&bytes).unwrap().active_sheet, DEFAULT_SHEET_NAME);
    }

    #[test]
    fn only_plain_numbers_are_numeric() {
        assert_eq!(plain_number("90"), Some(90.0));
        assert_eq!(plain_number("-12.5"), Some(-12.5));
        assert_eq!(plain_number("007"), None);
        assert_eq!(plain_number("1e3"), None);
        assert_eq!(plain_number("inf"), None);
        assert_eq!(plain_number("NaN"), None);
        assert_eq!(plain_number(""), None);
    }

    #[test]
    fn download_name_is_prefixed() {
        assert_eq!(modified_file_name("gst.xlsx"), "modified_gst.xlsx");
    }
}
