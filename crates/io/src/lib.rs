// Roster file I/O

use std::path::Path;

use census_recon::TabularRecord;

pub mod csv;
pub mod json;
pub mod xlsx;

/// Supported roster formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Tsv,
    Excel,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Format::Csv),
            "tsv" => Some(Format::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Format::Excel),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

fn format_of(path: &Path) -> Result<Format, String> {
    Format::from_path(path).ok_or_else(|| {
        format!(
            "unsupported file type: {} (expected .csv, .tsv, .xlsx, .xls, .ods or .json)",
            path.display()
        )
    })
}

/// Read a roster file into records. First worksheet only for spreadsheets.
pub fn read_rows(path: &Path) -> Result<Vec<TabularRecord>, String> {
    let rows = match format_of(path)? {
        Format::Csv => csv::import(path)?,
        Format::Tsv => csv::import_tsv(path)?,
        Format::Excel => xlsx::import(path)?,
        Format::Json => json::import(path)?,
    };
    log::debug!("{}: {} rows", path.display(), rows.len());
    Ok(rows)
}

/// Write records under the given column order. Columns absent from a record
/// are written as empty cells.
pub fn write_rows(path: &Path, columns: &[String], rows: &[TabularRecord]) -> Result<(), String> {
    match format_of(path)? {
        Format::Csv => csv::export(columns, rows, path),
        Format::Tsv => csv::export_tsv(columns, rows, path),
        Format::Excel => xlsx::export(columns, rows, path),
        Format::Json => json::export(columns, rows, path),
    }
}
