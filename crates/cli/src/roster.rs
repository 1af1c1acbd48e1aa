//! `census merge` / `census diff`: roster merging and field-level differences.

use std::path::PathBuf;

use census_recon::diff::{field_count, reconcile};
use census_recon::{merge_with_policy, DifferenceRecord, Identifier, MergePolicy, MergedView, TabularRecord};

use crate::exit_codes::EXIT_DIFFERENCES;
use crate::util::render_table;
use crate::{load_roster, load_rosters, to_json, CliError};

// Widest cell shown in human tables
const MAX_CELL_WIDTH: usize = 32;

pub fn cmd_merge(
    files: Vec<PathBuf>,
    min_sources: Option<usize>,
    policy: MergePolicy,
    id_column: String,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let required = min_sources.unwrap_or(files.len());
    if required > files.len() {
        return Err(CliError::args(format!(
            "--min-sources {} exceeds the {} file(s) given",
            required,
            files.len()
        )));
    }

    let identifier = Identifier::new(id_column);
    let sets = load_rosters(&files)?;

    let rows = merge_with_policy(&sets, required, policy, &identifier).map_err(CliError::engine)?;
    let view = MergedView::from_rows(rows);

    if let Some(ref path) = output {
        census_io::write_rows(path, &view.columns, &view.rows)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if json {
        println!("{}", to_json(&view)?);
    } else if output.is_none() {
        println!("{}", merged_table(&view));
    }

    eprintln!(
        "merged {} row(s) from {} roster(s) into {} column(s) ({})",
        view.rows.len(),
        files.len(),
        view.columns.len(),
        policy,
    );
    Ok(())
}

fn merged_table(view: &MergedView) -> String {
    let header: Vec<&str> = view.columns.iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            view.columns
                .iter()
                .map(|col| row.get(col).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();
    render_table(&header, &rows, MAX_CELL_WIDTH)
}

/// `--json` shape of `census diff`.
#[derive(serde::Serialize)]
struct DiffReport<'a> {
    current_rows: usize,
    matched: usize,
    unmatched: usize,
    field_differences: usize,
    differences: &'a [DifferenceRecord],
}

pub fn cmd_diff(
    current: PathBuf,
    reference: Vec<PathBuf>,
    policy: MergePolicy,
    id_column: String,
    json: bool,
) -> Result<(), CliError> {
    let identifier = Identifier::new(id_column);
    let sets = load_rosters(&reference)?;
    let combined = combined_reference(&sets, policy, &identifier)?;
    let current_rows = load_roster(&current)?;

    let outcome = reconcile(&current_rows, &combined, &identifier);
    let report = DiffReport {
        current_rows: current_rows.len(),
        matched: outcome.matched,
        unmatched: outcome.unmatched,
        field_differences: field_count(&outcome.records),
        differences: &outcome.records,
    };

    if json {
        println!("{}", to_json(&report)?);
    } else if !outcome.records.is_empty() {
        println!("{}", differences_table(&outcome.records));
    }

    eprintln!(
        "{} current row(s): {} matched, {} unmatched, {} with differences ({} field(s))",
        report.current_rows,
        report.matched,
        report.unmatched,
        outcome.records.len(),
        report.field_differences,
    );

    if outcome.records.is_empty() {
        Ok(())
    } else {
        Err(CliError { code: EXIT_DIFFERENCES, message: String::new(), hint: None })
    }
}

/// Combine the reference rosters in order under `policy`. Every roster must
/// contribute rows.
pub(crate) fn combined_reference(
    sets: &[Vec<TabularRecord>],
    policy: MergePolicy,
    identifier: &Identifier,
) -> Result<Vec<TabularRecord>, CliError> {
    merge_with_policy(sets, sets.len(), policy, identifier).map_err(CliError::engine)
}

pub(crate) fn differences_table(records: &[DifferenceRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .flat_map(|record| {
            record.differences.iter().map(move |entry| {
                vec![
                    record.employee_id.clone(),
                    entry.field.clone(),
                    entry.current_value.to_string(),
                    entry
                        .combined_value
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
        })
        .collect();
    render_table(
        &["Employee ID", "Field", "Current Week Value", "Combined Data Value"],
        &rows,
        MAX_CELL_WIDTH,
    )
}
