use std::collections::{HashMap, HashSet};

use crate::authority::group;
use crate::compose::compose;
use crate::config::{CensusConfig, SourceConfig, SourceRole};
use crate::diff::reconcile;
use crate::error::ReconError;
use crate::merge::merge_with_policy;
use crate::model::{MergedView, ReconInput, ReconMeta, ReconResult};
use crate::record::{CellValue, TabularRecord};
use crate::summary::compute_summary;

/// Run the full pipeline per config: merge reference sources, diff the
/// current source against the combined view, route differences to managers
/// and compose one draft per manager.
pub fn run(config: &CensusConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let reference_sets = config
        .sources_with_role(SourceRole::Reference)
        .map(|source| rows_of(input, source))
        .collect::<Result<Vec<_>, _>>()?;
    let current_source = config
        .sources_with_role(SourceRole::Current)
        .next()
        .ok_or_else(|| ReconError::ConfigValidation("no current source configured".into()))?;
    let current = rows_of(input, current_source)?;

    // Every reference source must contribute rows
    let merged_rows =
        merge_with_policy(&reference_sets, reference_sets.len(), config.merge, &config.identifier)?;
    let merged = MergedView::from_rows(merged_rows);

    let outcome = reconcile(current, &merged.rows, &config.identifier);

    // Managers are looked up in the directory source, falling back to the
    // first reference roster.
    let directory = match config.sources_with_role(SourceRole::Directory).next() {
        Some(source) => rows_of(input, source)?,
        None => reference_sets.first().copied().unwrap_or(&[]),
    };

    let groups = group(&outcome.records, directory, &config.identifier, &config.directory);
    let drafts = compose(&groups, &config.compose_options());

    let summary = compute_summary(
        reference_sets.iter().map(|rows| rows.len()).sum(),
        current.len(),
        merged.rows.len(),
        &outcome,
        &groups,
        &config.directory.unknown_manager,
    );

    log::info!(
        "{}: {} merged rows, {} of {} current rows matched, {} with differences",
        config.name,
        summary.merged_rows,
        summary.matched,
        summary.current_rows,
        summary.records_with_differences,
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            merge_policy: config.merge.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        merged,
        differences: outcome.records,
        groups,
        drafts,
    })
}

fn rows_of<'a>(input: &'a ReconInput, source: &SourceConfig) -> Result<&'a [TabularRecord], ReconError> {
    input
        .sources
        .get(&source.name)
        .map(|rows| rows.as_slice())
        .ok_or_else(|| ReconError::MissingSource(source.name.clone()))
}

// ---------------------------------------------------------------------------
// Row building
// ---------------------------------------------------------------------------

/// Header cells -> column names. Blank headers drop their column. Every
/// distinct header keeps its own name; a repeat gets the lowest free `_1`,
/// `_2`, ... suffix, skipping names already present in the header row.
pub fn header_columns<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<Option<String>> {
    let names: Vec<&str> = cells.into_iter().map(str::trim).collect();
    let mut used: HashSet<String> = names
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();

    names
        .iter()
        .map(|&name| {
            if name.is_empty() {
                return None;
            }
            if seen.insert(name) {
                return Some(name.to_string());
            }
            let suffix = next_suffix.entry(name).or_insert(1);
            loop {
                let candidate = format!("{name}_{suffix}");
                *suffix += 1;
                if used.insert(candidate.clone()) {
                    return Some(candidate);
                }
            }
        })
        .collect()
}

/// Build one record from a data row. Empty cells and cells under a dropped
/// header are omitted.
pub fn record_from_cells(
    columns: &[Option<String>],
    cells: impl IntoIterator<Item = Option<CellValue>>,
) -> TabularRecord {
    let mut record = TabularRecord::new();
    for (column, cell) in columns.iter().zip(cells) {
        if let (Some(column), Some(value)) = (column, cell) {
            if !matches!(value, CellValue::Text(ref s) if s.is_empty()) {
                record.insert(column.as_str(), value);
            }
        }
    }
    record
}

/// CSV text cell -> value. Canonical numbers (`42`, `-3.5`) become numbers so
/// CSV and spreadsheet sources compare alike; anything else (`007`, `1e5`)
/// stays text.
pub fn parse_text_cell(field: &str) -> Option<CellValue> {
    if field.is_empty() {
        return None;
    }
    if let Ok(n) = field.parse::<f64>() {
        let number = CellValue::Number(n);
        if n.is_finite() && number.to_string() == field {
            return Some(number);
        }
    }
    Some(CellValue::Text(field.to_string()))
}

/// Parse delimited text into records: first non-blank row is the header.
pub fn load_csv_rows(csv_data: &str, delimiter: u8) -> Result<Vec<TabularRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let mut columns: Option<Vec<Option<String>>> = None;
    let mut rows = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ReconError::Io(format!("line {}: {e}", line + 1)))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        match columns {
            None => columns = Some(header_columns(record.iter())),
            Some(ref cols) => {
                let row = record_from_cells(cols, record.iter().map(parse_text_cell));
                if !row.is_empty() {
                    rows.push(row);
                }
            }
        }
    }

    Ok(rows)
}
