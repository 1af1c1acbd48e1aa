// JSON import/export

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use census_recon::TabularRecord;

/// Export records as a JSON array of objects, keys in column order.
/// Columns a record lacks are left out of its object.
pub fn export(columns: &[String], rows: &[TabularRecord], path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);

    let projected: Vec<TabularRecord> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .filter_map(|col| row.get(col).map(|v| (col.as_str(), v.clone())))
                .collect()
        })
        .collect();

    serde_json::to_writer_pretty(writer, &projected).map_err(|e| e.to_string())?;
    Ok(())
}

/// Import a JSON array of flat objects. `null` members are treated as absent.
pub fn import(path: &Path) -> Result<Vec<TabularRecord>, String> {
    let file = File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let rows: Vec<TabularRecord> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("{}: expected an array of flat objects: {e}", path.display()))?;
    Ok(rows.into_iter().filter(|r| !r.is_empty()).collect())
}
