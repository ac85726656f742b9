//! Upload and process orchestration.
//!
//! Each dashboard tool is a [`Processor`]. Uploading builds a fresh
//! [`PreviewState`]; processing hands the processor either the edited grid
//! (re-encoded) or the original upload, and stores the outcome on the
//! preview.

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::downloader::XLSX_MIME;
use crate::editor::GridEditor;
use crate::gst::{self, GstError};
use crate::history::RedoPolicy;
use crate::loader::{self, CodecError, SpreadsheetKind};
use crate::preview::{DownloadFile, PreviewBody, PreviewState, ProcessResult, UploadedFile};

/// Message shown in the preview when a spreadsheet upload cannot be decoded.
pub const DECODE_FAILED: &str = "Failed to read Excel file";

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Please upload an .xlsx file for GST reconciliation.")]
    NotXlsx,

    #[error(transparent)]
    Gst(#[from] GstError),

    #[error("Failed to encode edited grid: {0}")]
    Codec(#[from] CodecError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Gst,
    Tds,
    Invoice,
    Ledger,
}

impl Tool {
    pub fn all() -> [Tool; 4] {
        [Tool::Gst, Tool::Tds, Tool::Invoice, Tool::Ledger]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Tool::Gst => "gst",
            Tool::Tds => "tds",
            Tool::Invoice => "invoice",
            Tool::Ledger => "ledger",
        }
    }

    pub fn from_id(id: &str) -> Option<Tool> {
        Tool::all().into_iter().find(|tool| tool.id() == id)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tool::Gst => "GST Reconciliation",
            Tool::Tds => "TDS Calculation",
            Tool::Invoice => "Invoice Extraction",
            Tool::Ledger => "Ledger Classification",
        }
    }

    /// File-picker hint for the tool's upload control.
    pub fn accept(&self) -> &'static str {
        match self {
            Tool::Gst => ".xlsx",
            Tool::Tds | Tool::Ledger => ".csv,.xlsx",
            Tool::Invoice => ".pdf,.png,.jpg,.jpeg",
        }
    }

    pub fn processor(&self) -> Box<dyn Processor> {
        match self {
            Tool::Gst => Box::new(GstProcessor),
            Tool::Tds => Box::new(TdsProcessor),
            Tool::Invoice => Box::new(InvoiceProcessor),
            Tool::Ledger => Box::new(LedgerProcessor),
        }
    }
}

/// What a processor works on: a file name and the bytes to process.
#[derive(Clone, Debug)]
pub struct ProcessInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ProcessInput {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    // Name length as the browser counts it.
    fn name_len(&self) -> u64 {
        self.file_name.encode_utf16().count() as u64
    }
}

#[derive(Clone, Debug)]
pub struct ProcessOutput {
    pub text: String,
    pub download: Option<DownloadFile>,
}

impl ProcessOutput {
    fn text(text: String) -> Self {
        ProcessOutput {
            text,
            download: None,
        }
    }
}

pub trait Processor: Send + Sync {
    /// How long the tool pretends to work before its result appears.
    fn delay(&self, _input: &ProcessInput) -> Duration {
        Duration::ZERO
    }

    fn process(&self, input: &ProcessInput) -> Result<ProcessOutput, ProcessError>;
}

/// The one real tool: GSTIN matching over an uploaded workbook.
pub struct GstProcessor;

impl Processor for GstProcessor {
    fn process(&self, input: &ProcessInput) -> Result<ProcessOutput, ProcessError> {
        if SpreadsheetKind::from_file_name(&input.file_name) != Some(SpreadsheetKind::Xlsx) {
            return Err(ProcessError::NotXlsx);
        }

        let checked = gst::check_gstin_matching(&input.bytes, &input.file_name)?;
        Ok(ProcessOutput {
            text: format!("Downloaded {}", checked.file_name),
            download: Some(DownloadFile {
                name: checked.file_name,
                mime_type: XLSX_MIME.to_string(),
                bytes: checked.bytes,
            }),
        })
    }
}

pub struct TdsProcessor;

impl Processor for TdsProcessor {
    fn delay(&self, input: &ProcessInput) -> Duration {
        Duration::from_millis(2000 + (input.name_len() % 5) * 350)
    }

    fn process(&self, input: &ProcessInput) -> Result<ProcessOutput, ProcessError> {
        let estimate = (input.size() % 10_000) as f64 / 100.0;
        Ok(ProcessOutput::text(format!(
            "TDS calculated for {}. Estimated TDS: ₹{:.2}.",
            input.file_name, estimate
        )))
    }
}

const INVOICE_FIELDS: [&str; 5] = ["Invoice No", "Date", "GSTIN", "Total", "Tax"];

pub struct InvoiceProcessor;

impl Processor for InvoiceProcessor {
    fn delay(&self, input: &ProcessInput) -> Duration {
        Duration::from_millis(2400 + (input.name_len() % 7) * 250)
    }

    fn process(&self, input: &ProcessInput) -> Result<ProcessOutput, ProcessError> {
        let count = 3 + (input.size() % 3) as usize;
        Ok(ProcessOutput::text(format!(
            "Invoice fields extracted from {}: {}.",
            input.file_name,
            INVOICE_FIELDS[..count].join(", ")
        )))
    }
}

const LEDGER_GROUPS: [&str; 5] = ["Revenue", "Expense", "Assets", "Liabilities", "Equity"];

pub struct LedgerProcessor;

impl Processor for LedgerProcessor {
    fn delay(&self, input: &ProcessInput) -> Duration {
        Duration::from_millis(2100 + (input.name_len() % 6) * 310)
    }

    fn process(&self, input: &ProcessInput) -> Result<ProcessOutput, ProcessError> {
        let count = 3 + (input.size() % 2) as usize;
        Ok(ProcessOutput::text(format!(
            "Ledger classification done for {}. Groups identified: {}.",
            input.file_name,
            LEDGER_GROUPS[..count].join(", ")
        )))
    }
}

/// Build the preview for a newly selected file.
///
/// Spreadsheet extensions are decoded into an editable grid; a decode
/// failure yields an errored preview. Everything else is opaque.
pub fn on_file_selected(file: UploadedFile, tool: Tool, policy: RedoPolicy) -> PreviewState {
    let body = match SpreadsheetKind::from_file_name(&file.name) {
        Some(_) => match loader::decode(&file.bytes, &file.name) {
            Ok(workbook) => {
                info!(
                    "loaded {} ({} rows, sheet {:?})",
                    file.name,
                    workbook.grid.row_count(),
                    workbook.active_sheet
                );
                let sheet_names = workbook.sheet_names.clone();
                PreviewBody::Spreadsheet {
                    editor: GridEditor::from_workbook(workbook, policy),
                    sheet_names,
                }
            }
            Err(e) => {
                warn!("failed to decode {}: {}", file.name, e);
                PreviewBody::Errored {
                    message: DECODE_FAILED.to_string(),
                }
            }
        },
        None => PreviewBody::Opaque,
    };

    PreviewState::new(tool, file, body)
}

/// The input processing should see: the edited grid when there are edits,
/// otherwise the upload as it arrived.
pub fn prepare_input(preview: &PreviewState) -> Result<ProcessInput, ProcessError> {
    let edited = match preview.editor() {
        Some(editor) => editor.grid_for_processing()?,
        None => None,
    };

    Ok(ProcessInput {
        file_name: preview.meta.name.clone(),
        bytes: edited.unwrap_or_else(|| preview.original.clone()),
    })
}

/// Store a processor's output on the preview.
pub fn apply_output(preview: &mut PreviewState, output: ProcessOutput) -> &ProcessResult {
    preview.result.insert(ProcessResult {
        text: output.text,
        download: output.download,
        completed_at: Utc::now(),
    })
}

/// Run `processor` over the preview right away, ignoring its delay.
pub fn on_process_requested<'a>(
    preview: &'a mut PreviewState,
    processor: &dyn Processor,
) -> Result<&'a ProcessResult, ProcessError> {
    let input = prepare_input(preview)?;
    let output = processor.process(&input)?;
    info!("processed {} with {}", input.file_name, preview.tool.id());
    Ok(apply_output(preview, output))
}
