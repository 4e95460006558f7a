//! Tabular data egress
//!
//! Pure, deterministic encoders over row sets (CSV, XLSX workbook,
//! pretty-printed JSON, tab-separated clipboard text) plus the thin
//! boundary actions that write them to a file or the system clipboard.
//!
//! Empty input is a soft no-op everywhere: no file is written, nothing
//! touches the clipboard, and the caller gets a `false` outcome to
//! surface as a warning.

use crate::backend::Row;
use crate::error::{Result, TabletalkError};

use indexmap::IndexSet;
use std::path::Path;

/// Ordered union of column names across all rows
///
/// First-seen order is preserved so encodings are stable for a given
/// input.
fn column_set(rows: &[Row]) -> Vec<String> {
    let mut columns: IndexSet<String> = IndexSet::new();
    for row in rows {
        for key in row.keys() {
            columns.insert(key.clone());
        }
    }
    columns.into_iter().collect()
}

/// Render a JSON value as a bare cell string
///
/// Strings lose their quotes, null becomes empty, everything else uses
/// its JSON representation.
fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Encode rows as delimited text (RFC 4180 quoting)
pub fn rows_to_csv(rows: &[Row]) -> Result<String> {
    let columns = column_set(rows);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in rows {
        let record: Vec<String> = columns.iter().map(|c| cell_text(row.get(c))).collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TabletalkError::Export(format!("CSV buffer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| TabletalkError::Export(format!("CSV is not UTF-8: {}", e)).into())
}

/// Encode rows as tab-separated text for the clipboard
///
/// Spreadsheet applications paste TSV straight into cells.
pub fn rows_to_clipboard_text(rows: &[Row]) -> String {
    let columns = column_set(rows);

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(columns.join("\t"));
    for row in rows {
        let record: Vec<String> = columns.iter().map(|c| cell_text(row.get(c))).collect();
        lines.push(record.join("\t"));
    }
    lines.join("\n")
}

/// Encode rows as pretty-printed JSON
pub fn rows_to_json_pretty(rows: &[Row]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Encode rows as an XLSX workbook
pub fn rows_to_workbook(rows: &[Row]) -> Result<Vec<u8>> {
    let columns = column_set(rows);

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Data")
        .map_err(|e| TabletalkError::Export(format!("Workbook error: {}", e)))?;

    for (col, name) in columns.iter().enumerate() {
        worksheet
            .write(0, col as u16, name.as_str())
            .map_err(|e| TabletalkError::Export(format!("Workbook error: {}", e)))?;
    }

    for (r, row) in rows.iter().enumerate() {
        for (c, name) in columns.iter().enumerate() {
            let cell = (r + 1) as u32;
            let col = c as u16;
            match row.get(name) {
                Some(serde_json::Value::Number(n)) if n.as_f64().is_some() => {
                    // Checked above; default keeps the write infallible
                    let value = n.as_f64().unwrap_or_default();
                    worksheet
                        .write(cell, col, value)
                        .map_err(|e| TabletalkError::Export(format!("Workbook error: {}", e)))?;
                }
                Some(serde_json::Value::Bool(b)) => {
                    worksheet
                        .write(cell, col, *b)
                        .map_err(|e| TabletalkError::Export(format!("Workbook error: {}", e)))?;
                }
                other => {
                    worksheet
                        .write(cell, col, cell_text(other))
                        .map_err(|e| TabletalkError::Export(format!("Workbook error: {}", e)))?;
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| TabletalkError::Export(format!("Workbook error: {}", e)).into())
}

/// Write the CSV encoding to a file
///
/// Returns `false` without touching the filesystem when `rows` is empty.
pub fn export_csv(rows: &[Row], path: impl AsRef<Path>) -> Result<bool> {
    if rows.is_empty() {
        tracing::warn!("No data to export");
        return Ok(false);
    }
    std::fs::write(path, rows_to_csv(rows)?)?;
    Ok(true)
}

/// Write the XLSX encoding to a file
///
/// Returns `false` without touching the filesystem when `rows` is empty.
pub fn export_workbook(rows: &[Row], path: impl AsRef<Path>) -> Result<bool> {
    if rows.is_empty() {
        tracing::warn!("No data to export");
        return Ok(false);
    }
    std::fs::write(path, rows_to_workbook(rows)?)?;
    Ok(true)
}

/// Write the pretty-printed JSON encoding to a file
///
/// Returns `false` without touching the filesystem when `rows` is empty.
pub fn export_json(rows: &[Row], path: impl AsRef<Path>) -> Result<bool> {
    if rows.is_empty() {
        tracing::warn!("No data to export");
        return Ok(false);
    }
    std::fs::write(path, rows_to_json_pretty(rows)?)?;
    Ok(true)
}

/// Copy the tab-separated encoding to the system clipboard
///
/// Returns `false` without touching the clipboard when `rows` is empty.
pub fn copy_to_clipboard(rows: &[Row]) -> Result<bool> {
    if rows.is_empty() {
        tracing::warn!("No data to copy");
        return Ok(false);
    }

    let text = rows_to_clipboard_text(rows);
    set_clipboard_text(&text)?;
    Ok(true)
}

/// Copy an arbitrary string (e.g. a SQL statement) to the clipboard
pub fn copy_text_to_clipboard(text: &str) -> Result<()> {
    set_clipboard_text(text)
}

fn set_clipboard_text(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| TabletalkError::Clipboard(format!("Clipboard unavailable: {}", e)))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| TabletalkError::Clipboard(format!("Failed to write clipboard: {}", e)))?;
    Ok(())
}
