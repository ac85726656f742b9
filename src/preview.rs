use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cell::{CellPos, column_letter};
use crate::editor::{EditingCursor, GridEditor};
use crate::process::Tool;

static NEXT_PREVIEW_ID: AtomicU64 = AtomicU64::new(1);

/// A file as the browser handed it over.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl FileMeta {
    /// Size as the dashboard shows it, e.g. `12.50 KB`.
    pub fn size_label(&self) -> String {
        size_label(self.size)
    }
}

pub fn size_label(size: u64) -> String {
    format!("{:.2} KB", size as f64 / 1024.0)
}

/// A file produced by processing, ready to download.
#[derive(Clone, Debug)]
pub struct DownloadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct ProcessResult {
    pub text: String,
    pub download: Option<DownloadFile>,
    pub completed_at: DateTime<Utc>,
}

/// What the preview panel can show for an upload.
#[derive(Clone, Debug)]
pub enum PreviewBody {
    /// A spreadsheet that decoded: an editable grid of its first sheet.
    Spreadsheet {
        editor: GridEditor,
        sheet_names: Vec<String>,
    },
    /// Not a spreadsheet; passed to processing untouched.
    Opaque,
    /// Looked like a spreadsheet but could not be read.
    Errored { message: String },
}

/// Everything the preview panel knows about the current upload.
#[derive(Clone, Debug)]
pub struct PreviewState {
    id: u64,
    pub tool: Tool,
    pub meta: FileMeta,
    pub original: Vec<u8>,
    pub body: PreviewBody,
    pub result: Option<ProcessResult>,
}

impl PreviewState {
    pub fn new(tool: Tool, file: UploadedFile, body: PreviewBody) -> Self {
        PreviewState {
            id: NEXT_PREVIEW_ID.fetch_add(1, Ordering::Relaxed),
            tool,
            meta: FileMeta {
                size: file.size(),
                name: file.name,
                mime_type: file.mime_type,
                uploaded_at: Utc::now(),
            },
            original: file.bytes,
            body,
            result: None,
        }
    }

    /// Identifies this upload; a new upload always gets a new id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn editor(&self) -> Option<&GridEditor> {
        match &self.body {
            PreviewBody::Spreadsheet { editor, .. } => Some(editor),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut GridEditor> {
        match &mut self.body {
            PreviewBody::Spreadsheet { editor, .. } => Some(editor),
            _ => None,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.editor().is_some_and(GridEditor::is_modified)
    }

    pub fn is_processed(&self) -> bool {
        self.result.is_some()
    }

    pub fn view(&self) -> PreviewView {
        let body = match &self.body {
            PreviewBody::Spreadsheet {
                editor,
                sheet_names,
            } => BodyView::Spreadsheet(SheetView {
                sheet_names: sheet_names.clone(),
                active_sheet: editor.sheet_name().to_string(),
                columns: (0..editor.grid().width()).map(column_letter).collect(),
                rows: editor.grid().rows().to_vec(),
                editing: editor.editing().cloned(),
                focus: editor.focus(),
                can_undo: editor.history().can_undo(),
                can_redo: editor.history().can_redo(),
            }),
            PreviewBody::Opaque => BodyView::Opaque,
            PreviewBody::Errored { message } => BodyView::Errored {
                error: message.clone(),
            },
        };

        PreviewView {
            id: self.id,
            tool: self.tool,
            title: self.tool.title(),
            file: FileView {
                name: self.meta.name.clone(),
                size: self.meta.size,
                size_label: self.meta.size_label(),
                mime_type: self.meta.mime_type.clone(),
                uploaded_at: self.meta.uploaded_at,
            },
            status: if self.is_processed() {
                PreviewStatus::Processed
            } else {
                PreviewStatus::Uploaded
            },
            modified: self.is_modified(),
            body,
            result: self.result.as_ref().map(|result| ResultView {
                text: result.text.clone(),
                processed_at: result.completed_at,
                download_name: result.download.as_ref().map(|d| d.name.clone()),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    Uploaded,
    Processed,
}

/// JSON shape of the preview panel.
#[derive(Clone, Debug, Serialize)]
pub struct PreviewView {
    pub id: u64,
    pub tool: Tool,
    pub title: &'static str,
    pub file: FileView,
    pub status: PreviewStatus,
    pub modified: bool,
    #[serde(flatten)]
    pub body: BodyView,
    pub result: Option<ResultView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FileView {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyView {
    Spreadsheet(SheetView),
    Opaque,
    Errored { error: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct SheetView {
    pub sheet_names: Vec<String>,
    pub active_sheet: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub editing: Option<EditingCursor>,
    pub focus: Option<CellPos>,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResultView {
    pub text: String,
    pub processed_at: DateTime<Utc>,
    pub download_name: Option<String>,
}
