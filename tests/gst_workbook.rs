use calamine::{Reader, Xlsx};
use ca_automation::downloader::to_xlsx;
use ca_automation::grid::grid_from;
use ca_automation::gst::{self, GstError, REMARK};
use ca_automation::loader::from_excel;
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read};

fn returns_workbook() -> Vec<u8> {
    let grid = grid_from([
        vec!["GST working", "", "", "", "", "", ""],
        vec!["Forms", "GSTIN No", "Invoice Number", "Taxable Value", "CGST", "SGST", "IGST"],
        vec!["2B", "29BBB", "INV2", "500", "0", "0", "90"],
        vec!["2B", "27AAA", "INV1", "1000", "90", "90", "0"],
        vec!["3B", "27AAA", "INV1", "-1000", "-90", "-90", "0"],
        vec!["3B", "29BBB", "INV2", "-500", "0", "0", "-50"],
    ]);
    to_xlsx(&grid, "Returns").unwrap()
}

#[test]
fn checked_workbook_has_subtotal_header_and_remarks() {
    let checked = gst::check_gstin_matching(&returns_workbook(), "march.xlsx").unwrap();
    assert_eq!(checked.file_name, "march_checked.xlsx");

    let decoded = from_excel(&checked.bytes).unwrap();
    let grid = decoded.grid;
    assert_eq!(decoded.active_sheet, "Sheet1");
    assert_eq!(grid.get(0, 0), "SUBTOTAL");

    let header: Vec<&str> = (0..grid.row_len(1)).map(|c| grid.get(1, c)).collect();
    assert_eq!(
        header,
        vec!["Forms", "GSTIN NO.", "Invoice No.", "Taxable Amt", "CGST", "SGST", "IGST", REMARK]
    );

    let rows: Vec<(&str, &str, &str)> = (2..grid.row_count())
        .map(|r| (grid.get(r, 0), grid.get(r, 2), grid.get(r, 7)))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2B", "INV1", "Matched"),
            ("3B", "INV1", "Matched"),
            ("2B", "INV2", "Mismatched"),
            ("3B", "INV2", "Mismatched"),
        ]
    );

    // Amounts come back as numbers.
    assert_eq!(grid.get(2, 3), "1000");
    assert_eq!(grid.get(5, 6), "-50");
}

#[test]
fn subtotal_row_sums_every_amount_column() {
    let checked = gst::check_gstin_matching(&returns_workbook(), "march.xlsx").unwrap();
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(checked.bytes)).unwrap();
    let formulas = workbook.worksheet_formula("Sheet1").unwrap();

    let row: Vec<String> = (3..7)
        .map(|c| {
            let formula = formulas.get_value((0, c)).cloned().unwrap_or_default();
            formula.trim_start_matches('=').to_string()
        })
        .collect();
    assert_eq!(
        row,
        vec![
            "SUBTOTAL(9, D3:D6)",
            "SUBTOTAL(9, E3:E6)",
            "SUBTOTAL(9, F3:F6)",
            "SUBTOTAL(9, G3:G6)",
        ]
    );
    assert!(formulas.get_value((0, 2)).is_none_or(|f| f.is_empty()));
}

fn zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut text = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut text).unwrap();
    text
}

#[test]
fn mismatched_rows_are_filled() {
    let checked = gst::check_gstin_matching(&returns_workbook(), "march.xlsx").unwrap();

    let styles = zip_entry(&checked.bytes, "xl/styles.xml");
    assert!(styles.contains("FFC7CE"), "{}", styles);

    // Rows 3 and 4 hold the matched INV1 pair, rows 5 and 6 the INV2 pair.
    let sheet = zip_entry(&checked.bytes, "xl/worksheets/sheet1.xml");
    assert!(!sheet.contains(r#"<c r="A3" s=""#), "{}", sheet);
    assert!(!sheet.contains(r#"<c r="A4" s=""#), "{}", sheet);
    assert!(sheet.contains(r#"<c r="A5" s=""#), "{}", sheet);
    assert!(sheet.contains(r#"<c r="D6" s=""#), "{}", sheet);
}

#[test]
fn workbook_without_required_columns_is_rejected() {
    let grid = grid_from([vec!["Forms", "GSTIN NO.", "Invoice No."], vec!["2B", "27AAA", "INV1"]]);
    let bytes = to_xlsx(&grid, "Sheet1").unwrap();

    let err = gst::check_gstin_matching(&bytes, "short.xlsx").unwrap_err();
    assert!(matches!(err, GstError::MissingColumns(ref cols) if cols == &["CGST", "SGST", "IGST"]));
    assert_eq!(
        err.to_string(),
        "Missing required columns: ['CGST', 'SGST', 'IGST']. Please ensure your sheet has these columns."
    );
}
