use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use log::debug;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::cell::Cell;
use crate::grid::Grid;

/// Errors raised while reading or writing spreadsheet files.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("file has no extension")]
    NoExtension,

    #[error("no sheets found in workbook")]
    NoSheets,

    #[error("failed to read workbook: {0}")]
    Excel(#[from] calamine::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("grid is too large to export ({rows} rows x {cols} columns)")]
    TooLarge { rows: usize, cols: usize },
}

/// The spreadsheet formats a preview can be built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Xlsx,
    Xls,
    Csv,
}

impl SpreadsheetKind {
    /// Detect the format from a file name's extension, ignoring case.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") => Some(SpreadsheetKind::Xlsx),
            Some("xls") => Some(SpreadsheetKind::Xls),
            Some("csv") => Some(SpreadsheetKind::Csv),
            _ => None,
        }
    }
}

/// A decoded workbook: the active sheet's grid plus every sheet name.
#[derive(Clone, Debug, PartialEq)]
pub struct Workbook {
    pub grid: Grid,
    pub sheet_names: Vec<String>,
    pub active_sheet: String,
}

/// Decode an uploaded file into a grid, picking the reader by extension.
///
/// Only the first sheet is materialised; the other names are kept so the
/// preview can list them.
pub fn decode(bytes: &[u8], file_name: &str) -> Result<Workbook, CodecError> {
    let kind = match SpreadsheetKind::from_file_name(file_name) {
        Some(kind) => kind,
        None => {
            return match Path::new(file_name).extension().and_then(|e| e.to_str()) {
                Some(ext) => Err(CodecError::UnsupportedExtension(ext.to_string())),
                None => Err(CodecError::NoExtension),
            };
        }
    };

    debug!("decoding {} ({:?}, {} bytes)", file_name, kind, bytes.len());
    match kind {
        SpreadsheetKind::Csv => from_csv(bytes),
        SpreadsheetKind::Xlsx | SpreadsheetKind::Xls => from_excel(bytes),
    }
}

/// Load a CSV file. A CSV always holds exactly one sheet, named `Sheet1`.
pub fn from_csv(bytes: &[u8]) -> Result<Workbook, CodecError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    pad_rows(&mut rows);
    let active_sheet = crate::downloader::DEFAULT_SHEET_NAME.to_string();

    Ok(Workbook {
        grid: Grid::new(rows),
        sheet_names: vec![active_sheet.clone()],
        active_sheet,
    })
}

/// Load an Excel workbook (`.xlsx` or legacy `.xls`) from memory.
pub fn from_excel(bytes: &[u8]) -> Result<Workbook, CodecError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let active_sheet = sheet_names.first().cloned().ok_or(CodecError::NoSheets)?;
    let range = workbook.worksheet_range(&active_sheet)?;

    Ok(Workbook {
        grid: Grid::new(range_to_rows(&range)),
        sheet_names,
        active_sheet,
    })
}

/// Read every sheet of an Excel workbook. Used by GST reconciliation,
/// which has to look for its header row across sheets.
pub fn excel_sheets(bytes: &[u8]) -> Result<Vec<(String, Grid)>, CodecError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_vec() {
        let range = workbook.worksheet_range(&name)?;
        sheets.push((name, Grid::new(range_to_rows(&range))));
    }

    if sheets.is_empty() {
        return Err(CodecError::NoSheets);
    }
    Ok(sheets)
}

// calamine ranges start at the first used cell; pad so that grid
// coordinates line up with the sheet's A1 origin.
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let (start_row, start_col) = (start_row as usize, start_col as usize);
    let width = start_col + range.width();

    let mut rows = vec![vec![String::new(); width]; start_row];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    rows
}

/// Render a calamine cell as the text the grid shows.
pub fn cell_text(cell: &Data) -> Cell {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        other => other.to_string(),
    }
}

/// Integers print without a decimal point, everything else as `f64` does.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn pad_rows(rows: &mut [Vec<Cell>]) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }
}
