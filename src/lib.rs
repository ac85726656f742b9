/*!
# CA Automation

Back end of a small dashboard for chartered accountants. A user picks one of
four tools, uploads a file, optionally edits it in an inline spreadsheet
grid, and runs the tool over it.

## Architecture

### Frontend Layer
- **Technologies**: HTML, CSS, JavaScript served as static files
- **Key Components**:
  - Tool cards - one upload control per tool
  - Preview panel - file details and, for spreadsheets, the editable grid
  - Shell - theme toggle, splash screen and mobile menu

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Grid model and editor - cell editing state machine with undo/redo
  - Codec - `.xlsx`/`.xls`/`.csv` decoding and `.xlsx` encoding
  - Orchestrator - upload handling and the per-tool processors
  - GST reconciliation - remarks and a highlighted checked workbook

## Modules

- **cell**: cell values, positions and column letters
- **grid**: the rectangular-ish grid of cells
- **history**: undo/redo stack of single-cell edits
- **keys**: keyboard events and editor shortcuts
- **clipboard**: clipboard abstraction used by copy and paste
- **editor**: the grid editor state machine
- **loader**: decoding uploads into grids
- **downloader**: encoding grids as `.xlsx`
- **gst**: GSTIN matching over GSTR-2B / 3B workbooks
- **preview**: what the preview panel holds for an upload
- **process**: tools, processors and the upload/process flow
- **shell**: theme, splash and menu state
- **config**: server configuration
- **app**: HTTP routes and sessions (feature `web`)

## REST API Endpoints

- `/api/gst/check` - GSTIN match check, returns the checked workbook
- `/api/tools/{tool}/upload` - Uploads a file into the preview
- `/api/preview/...` - Grid editing, download and processing
- `/api/shell/...` - Theme, splash and menu toggles
*/

pub mod cell;
pub mod clipboard;
pub mod config;
pub mod downloader;
pub mod editor;
pub mod grid;
pub mod gst;
pub mod history;
pub mod keys;
pub mod loader;
pub mod preview;
pub mod process;
pub mod shell;

#[cfg(feature = "web")]
pub mod app;

pub use cell::{Cell, CellPos, column_letter};
pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard};
pub use config::{AppConfig, ConfigError};
pub use editor::{EditorState, GridEditor, KeyOutcome};
pub use grid::Grid;
pub use gst::{GstError, Remark, check_gstin_matching};
pub use history::{History, RedoPolicy};
pub use keys::{Key, KeyEvent};
pub use loader::{CodecError, Workbook};
pub use preview::{PreviewBody, PreviewState, UploadedFile};
pub use process::{ProcessError, Processor, Tool};
pub use shell::{ShellState, Theme};
