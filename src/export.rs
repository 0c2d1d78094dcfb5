//! Excel export of the loaded dataset

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;
use tracing::debug;

use crate::error::{ViewerError, ViewerResult};
use crate::table::visible_columns;
use crate::types::Dataset;

/// Worksheet name used when no sheet is selected.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// File stem used when no sheet is selected.
pub const DEFAULT_FILE_STEM: &str = "data";

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Which columns end up in the exported worksheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportColumns {
    /// Every column of every row, including ones hidden in the table.
    #[default]
    All,
    /// Only the columns the table shows.
    Visible,
}

/// An encoded workbook ready to be saved.
#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub file_name: String,
    pub sheet_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedWorkbook {
    pub fn save(&self, path: &Path) -> ViewerResult<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// `<sheet>.xlsx`, or `data.xlsx` without a sheet.
pub fn default_file_name(sheet: Option<&str>) -> String {
    let stem = sheet.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_FILE_STEM);
    format!("{}.xlsx", stem)
}

/// Worksheet name for `sheet`, made acceptable to Excel.
pub fn worksheet_name(sheet: Option<&str>) -> String {
    let raw = sheet.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SHEET_NAME);
    let cleaned: String = raw
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    // Excel also rejects names that start or end with an apostrophe.
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Serializes a dataset into a single-sheet workbook.
pub struct SheetExporter<'a> {
    data: &'a Dataset,
    sheet: Option<&'a str>,
    columns: ExportColumns,
}

impl<'a> SheetExporter<'a> {
    pub fn new(data: &'a Dataset, sheet: Option<&'a str>) -> Self {
        Self {
            data,
            sheet,
            columns: ExportColumns::All,
        }
    }

    pub fn with_columns(mut self, columns: ExportColumns) -> Self {
        self.columns = columns;
        self
    }

    fn column_names(&self) -> Vec<String> {
        match self.columns {
            ExportColumns::All => self.data.all_columns(),
            ExportColumns::Visible => visible_columns(self.data),
        }
    }

    /// Encode the workbook. Returns `None` when there are no rows.
    pub fn export(&self) -> ViewerResult<Option<ExportedWorkbook>> {
        if self.data.is_empty() {
            return Ok(None);
        }

        let sheet_name = worksheet_name(self.sheet);
        let columns = self.column_names();
        debug!(
            sheet = %sheet_name,
            rows = self.data.len(),
            columns = columns.len(),
            "encoding workbook"
        );

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet_name)?;

        let header_format = Format::new().set_bold();
        for (col_idx, name) in columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, name, &header_format)?;
        }

        for (row_idx, row) in self.data.rows().iter().enumerate() {
            let excel_row = (row_idx + 1) as u32;
            for (col_idx, name) in columns.iter().enumerate() {
                let col = col_idx as u16;
                match row.get(name) {
                    None | Some(Value::Null) => {}
                    Some(Value::Number(n)) => match n.as_f64() {
                        Some(f) => {
                            worksheet.write_number(excel_row, col, f)?;
                        }
                        None => {
                            worksheet.write_string(excel_row, col, n.to_string())?;
                        }
                    },
                    Some(Value::String(s)) => {
                        worksheet.write_string(excel_row, col, s)?;
                    }
                    Some(Value::Bool(b)) => {
                        worksheet.write_boolean(excel_row, col, *b)?;
                    }
                    Some(other) => {
                        worksheet.write_string(excel_row, col, other.to_string())?;
                    }
                }
            }
        }

        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| ViewerError::Export(format!("Failed to encode workbook: {}", e)))?;

        Ok(Some(ExportedWorkbook {
            file_name: default_file_name(self.sheet),
            sheet_name,
            bytes,
        }))
    }
}
