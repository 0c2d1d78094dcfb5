//! Table view of a dataset
//!
//! Columns with no content in any row are hidden. The leading `No` column is
//! a 1-based row index.

use colored::Colorize;

use crate::types::{display_value, Dataset};

/// Label of the row index column.
pub const INDEX_HEADER: &str = "No";

/// Columns of the first row that carry a meaningful value in at least one
/// row, in first-row order. Recomputed on every call.
pub fn visible_columns(data: &Dataset) -> Vec<String> {
    data.first_row_columns()
        .into_iter()
        .filter(|col| data.column_has_content(col))
        .collect()
}

/// Display label for a column name.
pub fn header_label(column: &str) -> String {
    match column {
        "no_das" => "No DAS".to_string(),
        "nama_das" => "Wilayah".to_string(),
        "luas_das" => "Luas DAS".to_string(),
        other => other.replacen("hari", "Hari ", 1),
    }
}

/// Rendered table: header labels plus one line of cell text per row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    /// Build the view for `data`. Returns `None` for an empty dataset.
    pub fn build(data: &Dataset) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let columns = visible_columns(data);
        let mut headers = Vec::with_capacity(columns.len() + 1);
        headers.push(INDEX_HEADER.to_string());
        headers.extend(columns.iter().map(|c| header_label(c)));

        let rows = data
            .rows()
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut cells = Vec::with_capacity(columns.len() + 1);
                cells.push((idx + 1).to_string());
                cells.extend(columns.iter().map(|c| display_value(row.get(c))));
                cells
            })
            .collect();

        Some(Self {
            columns,
            headers,
            rows,
        })
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        widths
    }

    /// Plain text rendering with padded, centered cells.
    pub fn to_text(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        out.push_str(&format_line(&self.headers, &widths));
        out.push('\n');
        out.push_str(&separator(&widths));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format_line(row, &widths));
            out.push('\n');
        }
        out
    }

    /// Print to stdout with a bold header and shaded alternate rows.
    pub fn print(&self) {
        let widths = self.widths();
        println!("{}", format_line(&self.headers, &widths).bold());
        println!("{}", separator(&widths));
        for (idx, row) in self.rows.iter().enumerate() {
            let line = format_line(row, &widths);
            if idx % 2 == 0 {
                println!("{}", line);
            } else {
                println!("{}", line.dimmed());
            }
        }
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let pad = width.saturating_sub(len);
    let left = pad / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(pad - left))
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| center(cell, w))
        .collect();
    format!("| {} |", parts.join(" | "))
}

fn separator(widths: &[usize]) -> String {
    let parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    format!("|-{}-|", parts.join("-|-"))
}
