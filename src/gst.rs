//! GSTIN match checking for GST reconciliation.
//!
//! The input workbook holds purchase entries from GSTR-3B (and opening
//! balances) next to the supplier-reported GSTR-2B entries. Every row gets a
//! remark saying whether its GSTIN + invoice pair reconciles, and the
//! result is written back out as `<name>_checked.xlsx`.

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use rust_xlsxwriter::{Color, Format, Workbook};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::cell::{Cell, column_letter};
use crate::downloader::{DEFAULT_SHEET_NAME, plain_number};
use crate::grid::Grid;
use crate::loader::{self, CodecError};

lazy_static! {
    static ref YEAR_SUFFIX: Regex = Regex::new(r"/\d{2,4}(-\d{2,4})?$").unwrap();
}

pub const FORMS: &str = "Forms";
pub const GSTIN: &str = "GSTIN NO.";
pub const INVOICE: &str = "Invoice No.";
pub const CGST: &str = "CGST";
pub const SGST: &str = "SGST";
pub const IGST: &str = "IGST";
pub const TAXABLE: &str = "Taxable Amt";
pub const REMARK: &str = "Remark";

const REQUIRED_COLUMNS: [&str; 6] = [FORMS, GSTIN, INVOICE, CGST, SGST, IGST];
const SUBTOTAL_COLUMNS: [&str; 4] = [TAXABLE, IGST, CGST, SGST];
const MISMATCH_FILL: u32 = 0xFFC7CE;

#[derive(Debug, Error)]
pub enum GstError {
    #[error("Unsupported file type. Please upload a .xlsx file.")]
    UnsupportedFileType,

    #[error("Could not find the header row. Make sure columns include 'Forms' and 'GSTIN NO.'")]
    HeaderNotFound,

    #[error("Missing required columns: [{}]. Please ensure your sheet has these columns.", quoted(.0))]
    MissingColumns(Vec<String>),

    #[error("Failed to read Excel: {0}")]
    Read(#[from] CodecError),

    #[error("Failed to write checked workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// How a row reconciles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Remark {
    Blank,
    R364,
    /// In 3B but not in 2B.
    NotIn2B,
    /// In 2B but not in 3B.
    NotIn3B,
    GstinMismatch,
    InvoiceMismatch,
    OpeningMatch,
    Matched,
    Mismatched,
}

impl Remark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Remark::Blank => "Blank",
            Remark::R364 => "R364",
            Remark::NotIn2B => "NI2B",
            Remark::NotIn3B => "NIB",
            Remark::GstinMismatch => "GSTIN Mismatch",
            Remark::InvoiceMismatch => "Invoice Mismatch",
            Remark::OpeningMatch => "Opening Match",
            Remark::Matched => "Matched",
            Remark::Mismatched => "Mismatched",
        }
    }
}

/// The reconciled table: canonical headers plus `Remark`, rows sorted by
/// invoice then GSTIN.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub remarks: Vec<Remark>,
}

impl Reconciliation {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// A finished `_checked.xlsx`.
#[derive(Clone, Debug)]
pub struct CheckedWorkbook {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Uppercase, trim, turn punctuation into spaces and collapse whitespace.
pub fn normalize_header_token(s: &str) -> String {
    let replaced: String = s
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '.' | ',' | '-' | '_' | '/' | '\\' | '(' | ')' | ':' | ';' => ' ',
            c => c,
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a raw header to its canonical column name, if it has one.
pub fn canonical_header(raw: &str) -> Option<&'static str> {
    let canonical = match normalize_header_token(raw).as_str() {
        "FORMS" | "FORM" | "OPENING" => FORMS,
        "GSTIN" | "GSTIN NO" | "GSTIN NUMBER" | "GST NO" => GSTIN,
        "INVOICE NO" | "INVOICE NUMBER" | "INV NO" | "INV NUMBER" | "INVOICE" => INVOICE,
        "CGST" => CGST,
        "SGST" => SGST,
        "IGST" => IGST,
        "TAXABLE AMT" | "TAXABLE AMOUNT" | "TAXABLE VALUE" | "TAXABLE" => TAXABLE,
        _ => return None,
    };
    Some(canonical)
}

/// Normalise an invoice number so that `INV/007/23-24` and `INV/7` compare
/// equal: a trailing financial-year suffix is dropped and numeric parts
/// lose their leading zeros.
pub fn normalize_invoice_number(invoice: &str) -> String {
    let upper = invoice.trim().to_uppercase();
    let inv = YEAR_SUFFIX.replace(&upper, "");

    let mut normalized = String::with_capacity(inv.len());
    let mut part = String::new();
    for ch in inv.chars() {
        if ch == '/' || ch == '-' {
            normalized.push_str(&normalize_part(&part));
            normalized.push(ch);
            part.clear();
        } else {
            part.push(ch);
        }
    }
    normalized.push_str(&normalize_part(&part));
    normalized
}

fn normalize_part(part: &str) -> String {
    if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) {
        let trimmed = part.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }.to_string()
    } else {
        part.to_string()
    }
}

fn is_header_row(row: &[Cell]) -> bool {
    let tokens: HashSet<String> = row.iter().map(|v| normalize_header_token(v)).collect();
    tokens.contains("FORMS") && (tokens.contains("GSTIN NO") || tokens.contains("GSTIN"))
}

fn header_row_index(grid: &Grid) -> Option<usize> {
    grid.rows().iter().position(|row| is_header_row(row))
}

/// Pick the sheet holding the GST table: the first one with a header row,
/// otherwise the first sheet.
pub fn find_sheet_with_headers(sheets: &[(String, Grid)]) -> Option<&(String, Grid)> {
    sheets
        .iter()
        .find(|(_, grid)| header_row_index(grid).is_some())
        .or_else(|| sheets.first())
}

fn amount(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(0.0)
}

struct Columns {
    forms: usize,
    gstin: usize,
    invoice: usize,
    cgst: usize,
    sgst: usize,
    igst: usize,
}

/// Reconcile the GST table found in `sheets`.
pub fn reconcile(sheets: &[(String, Grid)]) -> Result<Reconciliation, GstError> {
    let (sheet_name, grid) = find_sheet_with_headers(sheets).ok_or(GstError::HeaderNotFound)?;
    let header_idx = header_row_index(grid).ok_or(GstError::HeaderNotFound)?;
    debug!("GST header row found on sheet {:?} at row {}", sheet_name, header_idx + 1);

    let width = grid.width();
    let headers: Vec<String> = (0..width)
        .map(|c| {
            let raw = grid.get(header_idx, c).trim();
            match canonical_header(raw) {
                Some(canonical) => canonical.to_string(),
                None if raw.is_empty() => format!("Unnamed: {}", c),
                None => raw.to_string(),
            }
        })
        .collect();

    let find = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|&name| find(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(GstError::MissingColumns(missing));
    }
    // All present, checked above.
    let cols = Columns {
        forms: find(FORMS).unwrap_or_default(),
        gstin: find(GSTIN).unwrap_or_default(),
        invoice: find(INVOICE).unwrap_or_default(),
        cgst: find(CGST).unwrap_or_default(),
        sgst: find(SGST).unwrap_or_default(),
        igst: find(IGST).unwrap_or_default(),
    };

    let mut rows: Vec<Vec<Cell>> = grid.rows()[header_idx + 1..]
        .iter()
        .filter(|row| row.iter().any(|v| !v.trim().is_empty()))
        .map(|row| {
            let mut row = row.clone();
            row.resize(width, String::new());
            row[cols.forms] = row[cols.forms].trim().to_string();
            row[cols.gstin] = row[cols.gstin].trim().to_string();
            row[cols.invoice] = row[cols.invoice].trim().to_uppercase();
            row
        })
        .collect();

    unify_invoice_numbers(&mut rows, &cols);
    let remarks_by_row = remarks(&rows, &cols);

    let mut paired: Vec<(Vec<Cell>, Remark)> = rows.into_iter().zip(remarks_by_row).collect();
    paired.sort_by(|(a, _), (b, _)| sort_key(a, &cols).cmp(&sort_key(b, &cols)));

    let mut headers = headers;
    headers.push(REMARK.to_string());
    let mut rows = Vec::with_capacity(paired.len());
    let mut remarks = Vec::with_capacity(paired.len());
    for (mut row, remark) in paired {
        row.push(remark.as_str().to_string());
        rows.push(row);
        remarks.push(remark);
    }

    info!(
        "reconciled {} rows, {} mismatched",
        rows.len(),
        remarks.iter().filter(|r| **r == Remark::Mismatched).count()
    );

    Ok(Reconciliation {
        sheet_name: sheet_name.clone(),
        headers,
        rows,
        remarks,
    })
}

// Invoice then GSTIN, blanks after every value.
fn sort_key<'r>(row: &'r [Cell], cols: &Columns) -> (bool, &'r str, bool, &'r str) {
    let (invoice, gstin) = (row[cols.invoice].as_str(), row[cols.gstin].as_str());
    (invoice.is_empty(), invoice, gstin.is_empty(), gstin)
}

// 2B invoice numbers written without a `/` are the supplier's canonical
// spelling; rewrite every row whose normalised number matches one.
fn unify_invoice_numbers(rows: &mut [Vec<Cell>], cols: &Columns) {
    let mut canonical: HashMap<String, String> = HashMap::new();
    for row in rows.iter().filter(|row| row[cols.forms] == "2B") {
        let original = &row[cols.invoice];
        if !original.contains('/') {
            canonical.insert(normalize_invoice_number(original), original.clone());
        }
    }

    for row in rows.iter_mut() {
        let normalized = normalize_invoice_number(&row[cols.invoice]);
        if let Some(original) = canonical.get(&normalized) {
            row[cols.invoice] = original.clone();
        }
    }
}

fn remarks(rows: &[Vec<Cell>], cols: &Columns) -> Vec<Remark> {
    let pair = |row: &Vec<Cell>| -> (String, String) {
        (row[cols.gstin].clone(), row[cols.invoice].clone())
    };
    let is_3b = |row: &&Vec<Cell>| matches!(row[cols.forms].as_str(), "3B" | "Opening");
    let is_2b = |row: &&Vec<Cell>| row[cols.forms] == "2B";
    let is_opening = |row: &&Vec<Cell>| row[cols.forms] == "Opening";

    let pairs_3b: HashSet<(String, String)> = rows.iter().filter(is_3b).map(pair).collect();
    let pairs_2b: HashSet<(String, String)> = rows.iter().filter(is_2b).map(pair).collect();
    let pairs_opening: HashSet<(String, String)> = rows.iter().filter(is_opening).map(pair).collect();

    let mut invoices_by_gstin_3b: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut invoices_by_gstin_2b: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut gstins_by_invoice_3b: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut gstins_by_invoice_2b: HashMap<&str, HashSet<&str>> = HashMap::new();
    for row in rows {
        let g = row[cols.gstin].as_str();
        let i = row[cols.invoice].as_str();
        if is_3b(&row) {
            invoices_by_gstin_3b.entry(g).or_default().insert(i);
            gstins_by_invoice_3b.entry(i).or_default().insert(g);
        }
        if is_2b(&row) {
            invoices_by_gstin_2b.entry(g).or_default().insert(i);
            gstins_by_invoice_2b.entry(i).or_default().insert(g);
        }
    }

    let mut totals: HashMap<(&str, &str), f64> = HashMap::new();
    for row in rows {
        let total = amount(&row[cols.cgst]) + amount(&row[cols.sgst]) + amount(&row[cols.igst]);
        let key = (row[cols.gstin].as_str(), row[cols.invoice].as_str());
        *totals.entry(key).or_default() += total;
    }

    fn lacks(index: &HashMap<&str, HashSet<&str>>, key: &str, value: &str) -> bool {
        !index.get(key).is_some_and(|set| set.contains(value))
    }

    rows.iter()
        .map(|row| {
            let gstin = row[cols.gstin].as_str();
            let invoice = row[cols.invoice].as_str();
            let form = row[cols.forms].as_str();

            if gstin.is_empty() || invoice.is_empty() {
                return Remark::Blank;
            }
            if gstin == "R364" {
                return Remark::R364;
            }

            let key = (gstin.to_string(), invoice.to_string());
            let in_3b = pairs_3b.contains(&key);
            let in_2b = pairs_2b.contains(&key);
            if form != "Opening" {
                if in_3b && !in_2b {
                    return Remark::NotIn2B;
                }
                if in_2b && !in_3b {
                    return Remark::NotIn3B;
                }
            }

            if (invoices_by_gstin_3b.contains_key(gstin) && lacks(&invoices_by_gstin_2b, gstin, invoice))
                || (invoices_by_gstin_2b.contains_key(gstin)
                    && lacks(&invoices_by_gstin_3b, gstin, invoice))
            {
                return Remark::GstinMismatch;
            }
            if (gstins_by_invoice_3b.contains_key(invoice) && lacks(&gstins_by_invoice_2b, invoice, gstin))
                || (gstins_by_invoice_2b.contains_key(invoice)
                    && lacks(&gstins_by_invoice_3b, invoice, gstin))
            {
                return Remark::InvoiceMismatch;
            }

            let total = totals.get(&(gstin, invoice)).copied().unwrap_or(0.0);
            if total > -1.0 && total < 1.0 {
                if pairs_opening.contains(&key) {
                    Remark::OpeningMatch
                } else {
                    Remark::Matched
                }
            } else {
                Remark::Mismatched
            }
        })
        .collect()
}

/// Write the reconciliation as a workbook: a bold SUBTOTAL row, the header
/// row, then the data with `Mismatched` rows highlighted.
pub fn write_checked_workbook(recon: &Reconciliation) -> Result<Vec<u8>, GstError> {
    let bold = Format::new().set_bold();
    let mismatch = Format::new().set_background_color(Color::RGB(MISMATCH_FILL));
    let amount_columns: Vec<usize> = SUBTOTAL_COLUMNS
        .iter()
        .filter_map(|name| recon.column(name))
        .collect();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DEFAULT_SHEET_NAME)?;

    worksheet.write_string_with_format(0, 0, "SUBTOTAL", &bold)?;
    if !recon.rows.is_empty() {
        let last_row = recon.rows.len() + 2;
        for &col in &amount_columns {
            let letter = column_letter(col);
            let formula = format!("=SUBTOTAL(9, {letter}3:{letter}{last_row})");
            worksheet.write_formula_with_format(0, col as u16, formula.as_str(), &bold)?;
        }
    }

    for (c, header) in recon.headers.iter().enumerate() {
        worksheet.write_string_with_format(1, c as u16, header.as_str(), &bold)?;
    }

    for (r, (row, remark)) in recon.rows.iter().zip(&recon.remarks).enumerate() {
        let r = (r + 2) as u32;
        let highlight = *remark == Remark::Mismatched;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            let number = if amount_columns.contains(&(c as usize)) {
                plain_number(value.trim())
            } else {
                None
            };

            match (number, highlight) {
                (Some(n), true) => worksheet.write_number_with_format(r, c, n, &mismatch)?,
                (Some(n), false) => worksheet.write_number(r, c, n)?,
                (None, true) if value.is_empty() => worksheet.write_blank(r, c, &mismatch)?,
                (None, true) => worksheet.write_string_with_format(r, c, value.as_str(), &mismatch)?,
                (None, false) if value.is_empty() => continue,
                (None, false) => worksheet.write_string(r, c, value.as_str())?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Name of the checked output for an uploaded file.
pub fn checked_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("uploaded");
    format!("{}_checked.xlsx", stem)
}

/// Run the full GSTIN match check over an uploaded `.xlsx`.
pub fn check_gstin_matching(bytes: &[u8], file_name: &str) -> Result<CheckedWorkbook, GstError> {
    let is_xlsx = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if !is_xlsx {
        return Err(GstError::UnsupportedFileType);
    }

    let sheets = loader::excel_sheets(bytes)?;
    let recon = reconcile(&sheets)?;
    let bytes = write_checked_workbook(&recon)?;

    Ok(CheckedWorkbook {
        file_name: checked_file_name(file_name),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::grid_from;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_tokens_normalise() {
        assert_eq!(normalize_header_token("  gstin no. "), "GSTIN NO");
        assert_eq!(normalize_header_token("Taxable_Amt (Rs)"), "TAXABLE AMT RS");
        assert_eq!(canonical_header("Inv. No."), Some(INVOICE));
        assert_eq!(canonical_header("GST No"), Some(GSTIN));
        assert_eq!(canonical_header("Taxable Value"), Some(TAXABLE));
        assert_eq!(canonical_header("Party Name"), None);
    }

    #[test]
    fn invoice_numbers_normalise() {
        assert_eq!(normalize_invoice_number("inv/007/23-24"), "INV/7");
        assert_eq!(normalize_invoice_number("INV/0042/2024"), "INV/42");
        assert_eq!(normalize_invoice_number("0001-A"), "1-A");
        assert_eq!(normalize_invoice_number("000"), "0");
        assert_eq!(normalize_invoice_number(" abc "), "ABC");
        assert_eq!(normalize_invoice_number(""), "");
    }

    #[test]
    fn missing_columns_are_reported() {
        let sheets = vec![(
            "Sheet1".to_string(),
            grid_from([vec!["Forms", "GSTIN", "Invoice No", "CGST"]]),
        )];
        let err = reconcile(&sheets).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required columns: ['SGST', 'IGST']. Please ensure your sheet has these columns."
        );
    }

    #[test]
    fn sheet_without_header_row_is_rejected() {
        let sheets = vec![("Sheet1".to_string(), grid_from([vec!["a", "b"], vec!["1", "2"]]))];
        assert!(matches!(reconcile(&sheets), Err(GstError::HeaderNotFound)));
    }

    #[test]
    fn header_sheet_is_found_past_cover_sheets() {
        let sheets = vec![
            ("Cover".to_string(), grid_from([vec!["Client", "Acme"]])),
            (
                "Data".to_string(),
                grid_from([
                    vec!["GST working", "", "", "", "", ""],
                    vec!["FORMS", "GSTIN No.", "Invoice No.", "CGST", "SGST", "IGST"],
                    vec!["3B", "G1", "1", "5", "5", "0"],
                    vec!["2B", "G1", "1", "-5", "-5", "0"],
                ]),
            ),
        ];
        let recon = reconcile(&sheets).unwrap();
        assert_eq!(recon.sheet_name, "Data");
        assert_eq!(recon.remarks, vec![Remark::Matched, Remark::Matched]);
    }

    #[test]
    fn remarks_follow_match_rules() {
        let grid = grid_from([
            vec!["Forms", "GSTIN NO.", "Invoice No.", "CGST", "SGST", "IGST"],
            // Reconciles to zero.
            vec!["3B", "G1", "INV-001/23-24", "9", "9", "0"],
            vec!["2B", "G1", "INV-1", "-9", "-9", "0"],
            // Present in both but amounts differ.
            vec!["3B", "G2", "7", "0", "0", "18"],
            vec!["2B", "G2", "7", "0", "0", "-10"],
            // Only claimed in 3B.
            vec!["3B", "G3", "8", "1", "1", "0"],
            // Only reported in 2B.
            vec!["2B", "G4", "9", "1", "1", "0"],
            vec!["3B", "R364", "10", "1", "1", "0"],
            vec!["3B", "", "11", "1", "1", "0"],
            // Opening balance matched in 2B.
            vec!["Opening", "G5", "12", "3", "0", "0"],
            vec!["2B", "G5", "12", "-3", "0", "0"],
        ]);
        let recon = reconcile(&[("Sheet1".to_string(), grid)]).unwrap();

        let remark_of = |gstin: &str, form: &str| {
            let g = recon.column(GSTIN).unwrap();
            let f = recon.column(FORMS).unwrap();
            recon
                .rows
                .iter()
                .zip(&recon.remarks)
                .find(|(row, _)| row[g] == gstin && row[f] == form)
                .map(|(_, remark)| *remark)
                .unwrap()
        };

        assert_eq!(remark_of("G1", "3B"), Remark::Matched);
        assert_eq!(remark_of("G1", "2B"), Remark::Matched);
        assert_eq!(remark_of("G2", "3B"), Remark::Mismatched);
        assert_eq!(remark_of("G3", "3B"), Remark::NotIn2B);
        assert_eq!(remark_of("G4", "2B"), Remark::NotIn3B);
        assert_eq!(remark_of("R364", "3B"), Remark::R364);
        assert_eq!(remark_of("", "3B"), Remark::Blank);
        assert_eq!(remark_of("G5", "Opening"), Remark::OpeningMatch);
        // The 2B side of an opening balance is an opening match as well.
        assert_eq!(remark_of("G5", "2B"), Remark::OpeningMatch);

        // The 3B row took the 2B spelling of the invoice number.
        let i = recon.column(INVOICE).unwrap();
        assert_eq!(recon.rows.iter().filter(|row| row[i] == "INV-1").count(), 2);
        assert_eq!(recon.headers.last().map(String::as_str), Some(REMARK));
    }

    #[test]
    fn rows_are_sorted_by_invoice_then_gstin() {
        let grid = grid_from([
            vec!["Forms", "GSTIN", "Invoice", "CGST", "SGST", "IGST"],
            vec!["3B", "GB", "2", "0", "0", "0"],
            vec!["3B", "GA", "2", "0", "0", "0"],
            vec!["3B", "GC", "1", "0", "0", "0"],
        ]);
        let recon = reconcile(&[("Sheet1".to_string(), grid)]).unwrap();
        let g = recon.column(GSTIN).unwrap();
        let order: Vec<&str> = recon.rows.iter().map(|row| row[g].as_str()).collect();
        assert_eq!(order, vec!["GC", "GA", "GB"]);
    }

    #[test]
    fn blank_invoices_and_gstins_sort_last() {
        let grid = grid_from([
            vec!["Forms", "GSTIN", "Invoice", "CGST", "SGST", "IGST"],
            vec!["3B", "GA", "", "0", "0", "0"],
            vec!["3B", "", "1", "0", "0", "0"],
            vec!["3B", "GB", "1", "0", "0", "0"],
            vec!["3B", "GC", "2", "0", "0", "0"],
        ]);
        let recon = reconcile(&[("Sheet1".to_string(), grid)]).unwrap();
        let (g, i) = (recon.column(GSTIN).unwrap(), recon.column(INVOICE).unwrap());
        let order: Vec<(&str, &str)> = recon
            .rows
            .iter()
            .map(|row| (row[i].as_str(), row[g].as_str()))
            .collect();
        assert_eq!(order, vec![("1", "GB"), ("1", ""), ("2", "GC"), ("", "GA")]);
        assert_eq!(recon.remarks[1], Remark::Blank);
        assert_eq!(recon.remarks[3], Remark::Blank);
    }

    #[test]
    fn checked_names_use_the_upload_stem() {
        assert_eq!(checked_file_name("march gst.xlsx"), "march gst_checked.xlsx");
        assert_eq!(checked_file_name(".xlsx"), ".xlsx_checked.xlsx");
    }

    #[test]
    fn non_xlsx_uploads_are_refused() {
        assert!(matches!(
            check_gstin_matching(b"a,b", "gst.csv"),
            Err(GstError::UnsupportedFileType)
        ));
    }
}
