// Excel import/export (xlsx, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use census_recon::engine::{header_columns, record_from_cells};
use census_recon::{CellValue, TabularRecord};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

// Excel limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Import the first worksheet of a spreadsheet. The first non-empty row is
/// the header row; blank rows are skipped.
pub fn import(path: &Path) -> Result<Vec<TabularRecord>, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "Excel file contains no sheets".to_string())?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let (height, width) = range.get_size();
    if height > MAX_ROWS || width > MAX_COLS {
        log::warn!(
            "sheet '{}' is {}x{}, beyond Excel limits; extra cells ignored",
            sheet_name,
            height,
            width
        );
    }

    let mut columns: Option<Vec<Option<String>>> = None;
    let mut rows = Vec::new();

    for row in range.rows().take(MAX_ROWS) {
        let row = &row[..row.len().min(MAX_COLS)];
        if row.iter().all(is_blank) {
            continue;
        }
        match columns {
            None => {
                let headers: Vec<String> = row.iter().map(cell_text).collect();
                columns = Some(header_columns(headers.iter().map(String::as_str)));
            }
            Some(ref cols) => {
                let record = record_from_cells(cols, row.iter().map(cell_value));
                if !record.is_empty() {
                    rows.push(record);
                }
            }
        }
    }

    Ok(rows)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_text(cell: &Data) -> String {
    cell_value(cell).map(|v| v.to_string()).unwrap_or_default()
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(CellValue::Text(s.clone()))
            }
        }
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::Error(e) => {
            log::warn!("cell error #{:?} read as text", e);
            Some(CellValue::Text(format!("#{:?}", e)))
        }
        // Dates keep their serial number, like the sheet stores them
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

/// Export records as a single worksheet: bold header row, then one row per
/// record in column order.
pub fn export(columns: &[String], rows: &[TabularRecord], path: &Path) -> Result<(), String> {
    if rows.len() + 1 > MAX_ROWS || columns.len() > MAX_COLS {
        return Err(format!(
            "{} rows x {} columns exceeds Excel limits",
            rows.len(),
            columns.len()
        ));
    }

    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name("Roster")
        .map_err(|e| format!("Failed to create sheet: {}", e))?;

    let header_format = Format::new().set_bold();
    for (col, name) in columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header_format)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let target_row = (idx + 1) as u32;
        for (col, name) in columns.iter().enumerate() {
            let target_col = col as u16;
            let written = match row.get(name) {
                None => continue,
                Some(CellValue::Text(s)) => worksheet.write_string(target_row, target_col, s),
                Some(CellValue::Number(n)) => worksheet.write_number(target_row, target_col, *n),
                Some(CellValue::Bool(b)) => worksheet.write_boolean(target_row, target_col, *b),
            };
            written.map_err(|e| format!("Failed to write cell ({}, {}): {}", target_row, col, e))?;
        }
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}
