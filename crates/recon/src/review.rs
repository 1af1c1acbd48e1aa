//! Review overlays on top of diff output.
//!
//! A reviewer can drop a field from every record, edit current values of the
//! employees covered by an [`EditGrant`], and mark entries approved or
//! rejected. None of this re-runs the diff; it only rewrites the session's own
//! copy of the records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::authority::EditGrant;
use crate::diff::DifferenceRecord;
use crate::error::ReconError;
use crate::record::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Approved => write!(f, "Approved"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Employee id -> field -> edited value.
pub type ChangeSet = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    NoChanges,
    Saved(ChangeSet),
}

#[derive(Debug, Default)]
pub struct ReviewSession {
    records: Vec<DifferenceRecord>,
    grant: Option<EditGrant>,
    changes: ChangeSet,
    statuses: BTreeMap<(String, String), ApprovalStatus>,
}

impl ReviewSession {
    pub fn new(records: Vec<DifferenceRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[DifferenceRecord] {
        &self.records
    }

    pub fn grant(&mut self, grant: EditGrant) {
        self.grant = Some(grant);
    }

    pub fn active_grant(&self) -> Option<&EditGrant> {
        self.grant.as_ref()
    }

    pub fn is_editable(&self, employee_id: &str) -> bool {
        self.grant.as_ref().is_some_and(|g| g.permits(employee_id))
    }

    /// Remove `field` from every record; records left empty are dropped.
    pub fn remove_field(&mut self, field: &str) {
        for record in &mut self.records {
            record.differences.retain(|d| d.field != field);
        }
        self.records.retain(|r| !r.differences.is_empty());
    }

    /// Replace the current value of one entry. Requires an active grant that
    /// covers `employee_id`.
    pub fn edit(&mut self, employee_id: &str, field: &str, value: &str) -> Result<(), ReconError> {
        if !self.is_editable(employee_id) {
            return Err(ReconError::NotEditable {
                employee_id: employee_id.to_string(),
            });
        }

        let record = self
            .records
            .iter_mut()
            .find(|r| r.employee_id == employee_id)
            .ok_or_else(|| ReconError::UnresolvedIdentifier(employee_id.to_string()))?;

        let entry = record
            .differences
            .iter_mut()
            .find(|d| d.field == field)
            .ok_or_else(|| ReconError::UnknownField {
                employee_id: employee_id.to_string(),
                field: field.to_string(),
            })?;

        entry.current_value = CellValue::Text(value.to_string());
        self.changes
            .entry(employee_id.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    pub fn set_status(&mut self, employee_id: &str, field: &str, status: ApprovalStatus) -> Result<(), ReconError> {
        let known = self
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .any(|r| r.differences.iter().any(|d| d.field == field));
        if !known {
            return Err(ReconError::UnknownField {
                employee_id: employee_id.to_string(),
                field: field.to_string(),
            });
        }
        self.statuses
            .insert((employee_id.to_string(), field.to_string()), status);
        Ok(())
    }

    pub fn status(&self, employee_id: &str, field: &str) -> ApprovalStatus {
        self.statuses
            .get(&(employee_id.to_string(), field.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Close the edit window. The grant is cleared either way.
    pub fn save(&mut self) -> SaveOutcome {
        self.grant = None;
        if self.changes.is_empty() {
            SaveOutcome::NoChanges
        } else {
            SaveOutcome::Saved(std::mem::take(&mut self.changes))
        }
    }
}
