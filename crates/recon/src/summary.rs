use crate::authority::AuthorityGroups;
use crate::diff::{field_count, DiffOutcome};
use crate::model::ReconSummary;

/// Compute summary statistics for one pipeline run.
pub fn compute_summary(
    reference_rows: usize,
    current_rows: usize,
    merged_rows: usize,
    outcome: &DiffOutcome,
    groups: &AuthorityGroups,
    unknown_manager: &str,
) -> ReconSummary {
    ReconSummary {
        reference_rows,
        current_rows,
        merged_rows,
        matched: outcome.matched,
        unmatched: outcome.unmatched,
        records_with_differences: outcome.records.len(),
        field_differences: field_count(&outcome.records),
        authorities: groups.len(),
        unresolved_owners: groups
            .get(unknown_manager)
            .map(|g| g.records.len())
            .unwrap_or(0),
    }
}
