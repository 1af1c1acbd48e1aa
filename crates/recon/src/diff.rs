// Field-level reconciliation: current rows vs. a reference (combined) view.
// Pure functions, no IO.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::{CellValue, Identifier, TabularRecord};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One field whose current value differs from the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceEntry {
    pub field: String,
    pub current_value: CellValue,
    /// `None` when the reference record has no such column.
    pub combined_value: Option<CellValue>,
}

/// All differing fields of one matched employee, in the current row's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceRecord {
    pub employee_id: String,
    pub differences: Vec<DifferenceEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct DiffOutcome {
    pub records: Vec<DifferenceRecord>,
    /// Current rows that found a reference counterpart.
    pub matched: usize,
    /// Current rows skipped for lack of a counterpart or an identifier.
    pub unmatched: usize,
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Compare `current` against `reference`, one record per matched identifier
/// with at least one differing field. Output follows `current` order.
pub fn diff(
    current: &[TabularRecord],
    reference: &[TabularRecord],
    identifier: &Identifier,
) -> Vec<DifferenceRecord> {
    reconcile(current, reference, identifier).records
}

/// [`diff`] plus match counts.
pub fn reconcile(
    current: &[TabularRecord],
    reference: &[TabularRecord],
    identifier: &Identifier,
) -> DiffOutcome {
    // First reference row wins for duplicate identifiers
    let mut lookup: HashMap<String, &TabularRecord> = HashMap::new();
    for row in reference {
        if let Some(id) = identifier.of(row) {
            lookup.entry(id).or_insert(row);
        }
    }

    let mut outcome = DiffOutcome::default();
    for row in current {
        let Some(id) = identifier.of(row) else {
            outcome.unmatched += 1;
            continue;
        };
        let Some(counterpart) = lookup.get(&id) else {
            log::debug!("employee '{id}': no reference record, skipped");
            outcome.unmatched += 1;
            continue;
        };
        outcome.matched += 1;

        let differences = compare_fields(row, counterpart, &identifier.column);
        if !differences.is_empty() {
            outcome.records.push(DifferenceRecord {
                employee_id: id,
                differences,
            });
        }
    }
    outcome
}

/// Strict comparison over the current row's columns only. The identifier
/// column is skipped: both rows already share its normalized value.
fn compare_fields(current: &TabularRecord, reference: &TabularRecord, id_column: &str) -> Vec<DifferenceEntry> {
    current
        .iter()
        .filter(|(field, _)| *field != id_column)
        .filter_map(|(field, value)| {
            let other = reference.get(field);
            if other == Some(value) {
                return None;
            }
            Some(DifferenceEntry {
                field: field.to_string(),
                current_value: value.clone(),
                combined_value: other.cloned(),
            })
        })
        .collect()
}

/// Total number of field entries across records.
pub fn field_count(records: &[DifferenceRecord]) -> usize {
    records.iter().map(|r| r.differences.len()).sum()
}
