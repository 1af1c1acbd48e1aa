//! Routing of differences to the manager (authority) who owns each employee,
//! and the reverse lookup that grants a manager edit rights during review.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::diff::{DifferenceEntry, DifferenceRecord};
use crate::error::ReconError;
use crate::record::{Identifier, TabularRecord};

// ---------------------------------------------------------------------------
// Directory columns
// ---------------------------------------------------------------------------

/// Column names read from the employee directory, plus the fallbacks used
/// when a lookup fails.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectoryColumns {
    pub manager: String,
    pub name: String,
    pub email: String,
    pub unknown_manager: String,
    pub unknown_employee: String,
}

impl Default for DirectoryColumns {
    fn default() -> Self {
        Self {
            manager: "Manager".into(),
            name: "Name".into(),
            email: "email".into(),
            unknown_manager: "Unknown Manager".into(),
            unknown_employee: "Unknown Employee".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedDifferenceRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub manager_name: String,
    pub manager_email: String,
    pub differences: Vec<DifferenceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorityGroup {
    pub owner_name: String,
    /// Email of the group's first record.
    pub owner_email: String,
    pub records: Vec<EnrichedDifferenceRecord>,
}

/// Owner name -> records, in first-appearance order of owners.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AuthorityGroups {
    groups: Vec<AuthorityGroup>,
}

impl AuthorityGroups {
    fn push(&mut self, record: EnrichedDifferenceRecord) {
        match self.groups.iter_mut().find(|g| g.owner_name == record.manager_name) {
            Some(group) => group.records.push(record),
            None => self.groups.push(AuthorityGroup {
                owner_name: record.manager_name.clone(),
                owner_email: record.manager_email.clone(),
                records: vec![record],
            }),
        }
    }

    pub fn get(&self, owner_name: &str) -> Option<&AuthorityGroup> {
        self.groups.iter().find(|g| g.owner_name == owner_name)
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.owner_name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AuthorityGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Records across all groups.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }
}

impl<'a> IntoIterator for &'a AuthorityGroups {
    type Item = &'a AuthorityGroup;
    type IntoIter = std::slice::Iter<'a, AuthorityGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Partition `diffs` by the manager each employee resolves to in `directory`.
/// Unresolved employees land under `columns.unknown_manager`.
pub fn group(
    diffs: &[DifferenceRecord],
    directory: &[TabularRecord],
    identifier: &Identifier,
    columns: &DirectoryColumns,
) -> AuthorityGroups {
    let mut lookup: HashMap<String, &TabularRecord> = HashMap::new();
    for row in directory {
        if let Some(id) = identifier.of(row) {
            lookup.entry(id).or_insert(row);
        }
    }

    let mut groups = AuthorityGroups::default();
    for diff in diffs {
        let entry = lookup.get(&diff.employee_id).copied();
        if entry.is_none() {
            log::debug!("employee '{}': not in directory", diff.employee_id);
        }
        let text = |column: &str| entry.and_then(|row| row.text(column));

        groups.push(EnrichedDifferenceRecord {
            employee_id: diff.employee_id.clone(),
            employee_name: text(&columns.name).unwrap_or_else(|| columns.unknown_employee.clone()),
            manager_name: text(&columns.manager).unwrap_or_else(|| columns.unknown_manager.clone()),
            manager_email: text(&columns.email).unwrap_or_default(),
            differences: diff.differences.clone(),
        });
    }
    groups
}

// ---------------------------------------------------------------------------
// Edit grant
// ---------------------------------------------------------------------------

/// Employees a manager may edit during one review session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditGrant {
    pub manager_name: String,
    pub manager_email: String,
    pub employee_ids: Vec<String>,
}

impl EditGrant {
    pub fn permits(&self, employee_id: &str) -> bool {
        self.employee_ids.iter().any(|id| id == employee_id)
    }
}

/// Resolve `email` to a manager and collect the identifiers of everyone that
/// manager manages. Email matching is exact: case-sensitive, untrimmed.
pub fn grant_edit(
    email: &str,
    directory: &[TabularRecord],
    identifier: &Identifier,
    columns: &DirectoryColumns,
) -> Result<EditGrant, ReconError> {
    let manager = directory
        .iter()
        .find(|row| row.get(&columns.email).and_then(|v| v.as_text()) == Some(email))
        .ok_or_else(|| ReconError::UnknownAuthority {
            email: email.to_string(),
        })?;

    let manager_name = manager.text(&columns.name).ok_or_else(|| ReconError::NoManagedEmployees {
        manager: email.to_string(),
    })?;

    let mut seen = HashSet::new();
    let employee_ids: Vec<String> = directory
        .iter()
        .filter(|row| row.text(&columns.manager).as_deref() == Some(manager_name.as_str()))
        .filter_map(|row| identifier.of(row))
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if employee_ids.is_empty() {
        return Err(ReconError::NoManagedEmployees {
            manager: manager_name,
        });
    }

    log::info!("edit grant for {manager_name}: {} employee(s)", employee_ids.len());
    Ok(EditGrant {
        manager_name,
        manager_email: email.to_string(),
        employee_ids,
    })
}
