use std::collections::HashMap;

use serde::Serialize;

use crate::authority::AuthorityGroups;
use crate::compose::DraftEmail;
use crate::diff::DifferenceRecord;
use crate::record::{column_union, TabularRecord};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pre-loaded row-sets keyed by source name.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub sources: HashMap<String, Vec<TabularRecord>>,
}

impl ReconInput {
    pub fn insert(&mut self, name: impl Into<String>, rows: Vec<TabularRecord>) {
        self.sources.insert(name.into(), rows);
    }
}

// ---------------------------------------------------------------------------
// Merged view
// ---------------------------------------------------------------------------

/// A merged row-set with the column list used to render it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedView {
    /// Union of columns across all rows, first-appearance order.
    pub columns: Vec<String>,
    pub rows: Vec<TabularRecord>,
}

impl MergedView {
    pub fn from_rows(rows: Vec<TabularRecord>) -> Self {
        Self {
            columns: column_union(&rows),
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub reference_rows: usize,
    pub current_rows: usize,
    pub merged_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub records_with_differences: usize,
    pub field_differences: usize,
    pub authorities: usize,
    /// Difference records routed to the unknown-manager group.
    pub unresolved_owners: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub merge_policy: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub merged: MergedView,
    pub differences: Vec<DifferenceRecord>,
    pub groups: AuthorityGroups,
    pub drafts: Vec<DraftEmail>,
}
