//! Viewer state
//!
//! Holds what the user has selected and what the service has returned for
//! that selection:
//!
//! ```text
//! NoFileSelected -> FileSelected -> SheetSelected -> DataLoaded
//! ```
//!
//! Selecting a file clears the sheet, the sheet list and the rows. Selecting a
//! sheet clears the rows. Each selection hands out a ticket for the request it
//! triggers; a result is only applied if its ticket still matches the current
//! selection, so a slow response for an old selection can never overwrite a
//! newer one.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{ViewerError, ViewerResult};
use crate::export::{ExportColumns, ExportedWorkbook, SheetExporter};
use crate::types::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NoFileSelected,
    FileSelected,
    SheetSelected,
    DataLoaded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::NoFileSelected => "no file selected",
            Stage::FileSelected => "file selected",
            Stage::SheetSelected => "sheet selected",
            Stage::DataLoaded => "data loaded",
        };
        f.write_str(name)
    }
}

/// Issued for a sheet-list request; valid until the file selection changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsTicket {
    generation: u64,
    pub file: String,
}

/// Issued for a row-data request; valid until the file or sheet changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTicket {
    generation: u64,
    pub file: String,
    pub sheet: String,
}

/// A request the viewer can issue again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListFiles,
    Upload { name: String },
    ListSheets { file: String },
    LoadData { file: String, sheet: String },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ListFiles => write!(f, "list files"),
            Operation::Upload { name } => write!(f, "upload '{}'", name),
            Operation::ListSheets { file } => write!(f, "list sheets of '{}'", file),
            Operation::LoadData { file, sheet } => {
                write!(f, "load '{}' / '{}'", file, sheet)
            }
        }
    }
}

/// The most recent failure, kept until the same operation succeeds or the
/// user moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedOperation {
    pub operation: Operation,
    pub message: String,
}

/// Busy indicator for uploads. Counts uploads in flight; cloning shares the
/// count.
#[derive(Debug, Clone, Default)]
pub struct UploadIndicator {
    pending: Arc<AtomicUsize>,
}

impl UploadIndicator {
    pub fn is_uploading(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Count one upload as in flight until the returned guard is dropped.
    pub fn begin(&self) -> UploadGuard {
        self.pending.fetch_add(1, Ordering::SeqCst);
        UploadGuard {
            pending: Arc::clone(&self.pending),
        }
    }
}

/// Releases one in-flight upload on drop, whatever the upload's outcome.
#[derive(Debug)]
pub struct UploadGuard {
    pending: Arc<AtomicUsize>,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct Viewer {
    files: Vec<String>,
    sheets: Vec<String>,
    selected_file: String,
    selected_sheet: String,
    data: Dataset,
    file_generation: u64,
    selection_generation: u64,
    uploading: UploadIndicator,
    last_error: Option<FailedOperation>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        if self.selected_file.is_empty() {
            Stage::NoFileSelected
        } else if self.selected_sheet.is_empty() {
            Stage::FileSelected
        } else if self.data.is_empty() {
            Stage::SheetSelected
        } else {
            Stage::DataLoaded
        }
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn sheets(&self) -> &[String] {
        &self.sheets
    }

    pub fn selected_file(&self) -> Option<&str> {
        Some(self.selected_file.as_str()).filter(|s| !s.is_empty())
    }

    pub fn selected_sheet(&self) -> Option<&str> {
        Some(self.selected_sheet.as_str()).filter(|s| !s.is_empty())
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.is_uploading()
    }

    pub fn upload_indicator(&self) -> UploadIndicator {
        self.uploading.clone()
    }

    pub fn last_error(&self) -> Option<&FailedOperation> {
        self.last_error.as_ref()
    }

    /// Hand the failed operation back for another attempt.
    pub fn take_retry(&mut self) -> Option<Operation> {
        self.last_error.take().map(|failed| failed.operation)
    }

    /// Select a file (empty string deselects). Returns the ticket for the
    /// sheet-list request to issue, if any.
    pub fn select_file(&mut self, file: &str) -> Option<SheetsTicket> {
        self.selected_file = file.to_string();
        self.selected_sheet.clear();
        self.sheets.clear();
        self.data = Dataset::default();
        self.file_generation += 1;
        self.selection_generation += 1;
        self.clear_error_for_selection();

        if file.is_empty() {
            return None;
        }
        Some(SheetsTicket {
            generation: self.file_generation,
            file: file.to_string(),
        })
    }

    /// Select a sheet of the current file (empty string deselects). Returns
    /// the ticket for the row-data request to issue, if any.
    pub fn select_sheet(&mut self, sheet: &str) -> Option<DataTicket> {
        self.selected_sheet = sheet.to_string();
        self.data = Dataset::default();
        self.selection_generation += 1;
        if matches!(
            self.last_error,
            Some(FailedOperation {
                operation: Operation::LoadData { .. },
                ..
            })
        ) {
            self.last_error = None;
        }

        if self.selected_file.is_empty() || sheet.is_empty() {
            return None;
        }
        Some(DataTicket {
            generation: self.selection_generation,
            file: self.selected_file.clone(),
            sheet: sheet.to_string(),
        })
    }

    /// Ticket for the current (file, sheet), used to reload rows.
    pub fn data_ticket(&self) -> Option<DataTicket> {
        if self.selected_file.is_empty() || self.selected_sheet.is_empty() {
            return None;
        }
        Some(DataTicket {
            generation: self.selection_generation,
            file: self.selected_file.clone(),
            sheet: self.selected_sheet.clone(),
        })
    }

    /// Ticket for the current file's sheet list.
    pub fn sheets_ticket(&self) -> Option<SheetsTicket> {
        if self.selected_file.is_empty() {
            return None;
        }
        Some(SheetsTicket {
            generation: self.file_generation,
            file: self.selected_file.clone(),
        })
    }

    pub fn apply_files(&mut self, result: ViewerResult<Vec<String>>) {
        match result {
            Ok(files) => {
                debug!(count = files.len(), "file list updated");
                self.files = files;
                self.clear_error(&Operation::ListFiles);
            }
            Err(err) => self.record(Operation::ListFiles, err),
        }
    }

    pub fn apply_upload(&mut self, name: &str, result: ViewerResult<Value>) {
        let operation = Operation::Upload {
            name: name.to_string(),
        };
        match result {
            Ok(_) => {
                info!(file = %name, "upload finished");
                self.clear_error(&operation);
            }
            Err(err) => self.record(operation, err),
        }
    }

    /// Apply a sheet list. Returns false when the ticket is stale and the
    /// result was dropped.
    pub fn apply_sheets(
        &mut self,
        ticket: &SheetsTicket,
        result: ViewerResult<Vec<String>>,
    ) -> bool {
        if ticket.generation != self.file_generation {
            debug!(file = %ticket.file, "dropping stale sheet list");
            return false;
        }
        let operation = Operation::ListSheets {
            file: ticket.file.clone(),
        };
        match result {
            Ok(sheets) => {
                debug!(file = %ticket.file, count = sheets.len(), "sheet list updated");
                self.sheets = sheets;
                self.clear_error(&operation);
            }
            Err(err) => self.record(operation, err),
        }
        true
    }

    /// Apply row data. Returns false when the ticket is stale and the result
    /// was dropped.
    pub fn apply_rows(&mut self, ticket: &DataTicket, result: ViewerResult<Dataset>) -> bool {
        if ticket.generation != self.selection_generation {
            debug!(file = %ticket.file, sheet = %ticket.sheet, "dropping stale rows");
            return false;
        }
        let operation = Operation::LoadData {
            file: ticket.file.clone(),
            sheet: ticket.sheet.clone(),
        };
        match result {
            Ok(data) => {
                debug!(file = %ticket.file, sheet = %ticket.sheet, rows = data.len(), "rows loaded");
                self.data = data;
                self.clear_error(&operation);
            }
            Err(err) => self.record(operation, err),
        }
        true
    }

    /// Encode the loaded rows for download. `None` when nothing is loaded.
    pub fn export(&self, columns: ExportColumns) -> ViewerResult<Option<ExportedWorkbook>> {
        SheetExporter::new(&self.data, self.selected_sheet())
            .with_columns(columns)
            .export()
    }

    fn record(&mut self, operation: Operation, err: ViewerError) {
        error!(operation = %operation, "{}", err);
        self.last_error = Some(FailedOperation {
            operation,
            message: err.to_string(),
        });
    }

    fn clear_error(&mut self, operation: &Operation) {
        if self
            .last_error
            .as_ref()
            .is_some_and(|failed| &failed.operation == operation)
        {
            self.last_error = None;
        }
    }

    fn clear_error_for_selection(&mut self) {
        if matches!(
            self.last_error,
            Some(FailedOperation {
                operation: Operation::ListSheets { .. } | Operation::LoadData { .. },
                ..
            })
        ) {
            self.last_error = None;
        }
    }
}
