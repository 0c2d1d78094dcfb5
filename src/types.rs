//! Row and dataset types
//!
//! Rows arrive as JSON objects whose shape varies per sheet. Column order is
//! the order the service sent the keys in (`serde_json` is built with
//! `preserve_order`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One record of a sheet: column name → scalar value.
///
/// A key that is missing from the map is "undefined"; a key mapped to
/// `Value::Null` is null. Both count as empty.
pub type Row = Map<String, Value>;

/// The rows of one (file, sheet) selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the first row, in order.
    pub fn first_row_columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every column name that appears in any row, in first-seen order.
    pub fn all_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// True if at least one row carries a meaningful value for `column`.
    pub fn column_has_content(&self, column: &str) -> bool {
        self.rows.iter().any(|row| is_meaningful(row.get(column)))
    }
}

impl From<Vec<Row>> for Dataset {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

/// A cell is meaningful when it is present, not null, and its text form is
/// not blank after trimming.
pub fn is_meaningful(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !joined_text(items).trim().is_empty(),
        Some(Value::Number(_)) | Some(Value::Bool(_)) | Some(Value::Object(_)) => true,
    }
}

/// Comma-joined text of a list cell. Nulls contribute nothing, so `[null]`
/// and `[" "]` read as blank while `[null, null]` reads as `","`.
fn joined_text(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(inner) => joined_text(inner),
            Value::Object(_) => "[object]".to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Text shown for a cell in the table. Null and missing cells are blank.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => format_number(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Whole floats print without a trailing `.0`.
fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}
