use std::collections::HashMap;

use crate::config::MergePolicy;
use crate::error::ReconError;
use crate::record::{Identifier, TabularRecord};

// ---------------------------------------------------------------------------
// Keyed accumulator
// ---------------------------------------------------------------------------

/// Key of a row inside [`KeyedRows`]. Rows without a usable identifier get a
/// synthetic key so they never collide with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Id(String),
    Anonymous(usize),
}

/// Insertion-ordered map from row key to record.
///
/// Iteration order is the order in which each key was first inserted. This is
/// the only ordering the merge output promises.
#[derive(Debug, Default)]
pub struct KeyedRows {
    keys: Vec<RowKey>,
    rows: Vec<TabularRecord>,
    index: HashMap<String, usize>,
    anonymous: usize,
}

impl KeyedRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row under `id`, or overlay it onto the row already there.
    pub fn upsert(&mut self, id: Option<String>, row: &TabularRecord) {
        match id {
            Some(id) => match self.index.get(&id) {
                Some(&pos) => self.rows[pos].overlay(row),
                None => {
                    self.index.insert(id.clone(), self.rows.len());
                    self.keys.push(RowKey::Id(id));
                    self.rows.push(row.clone());
                }
            },
            None => {
                self.keys.push(RowKey::Anonymous(self.anonymous));
                self.anonymous += 1;
                self.rows.push(row.clone());
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&TabularRecord> {
        self.index.get(id).map(|&pos| &self.rows[pos])
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<TabularRecord> {
        self.rows
    }
}

// ---------------------------------------------------------------------------
// Merge policies
// ---------------------------------------------------------------------------

/// Fold row-sets by identifier. Later sources overwrite earlier ones field by
/// field; fields present in only one source are kept. Output order is the
/// first appearance of each identifier across all inputs.
pub fn merge<S: AsRef<[TabularRecord]>>(row_sets: &[S], identifier: &Identifier) -> Vec<TabularRecord> {
    let mut acc = KeyedRows::new();
    for (set_idx, rows) in row_sets.iter().enumerate() {
        for (row_idx, row) in rows.as_ref().iter().enumerate() {
            let id = identifier.of(row);
            if id.is_none() {
                log::warn!(
                    "row-set {set_idx}, row {row_idx}: no '{}' value, kept as its own record",
                    identifier.column
                );
            }
            acc.upsert(id, row);
        }
    }
    log::debug!("merged {} row-set(s) into {} record(s)", row_sets.len(), acc.len());
    acc.into_rows()
}

/// Fail unless at least `required` of the row-sets are non-empty.
pub fn require_sources<S: AsRef<[TabularRecord]>>(row_sets: &[S], required: usize) -> Result<(), ReconError> {
    let supplied = row_sets.iter().filter(|rows| !rows.as_ref().is_empty()).count();
    if supplied < required {
        return Err(ReconError::MissingInput { required, supplied });
    }
    Ok(())
}

/// [`merge`], refusing when fewer than `required` non-empty row-sets are supplied.
pub fn merge_required<S: AsRef<[TabularRecord]>>(
    row_sets: &[S],
    required: usize,
    identifier: &Identifier,
) -> Result<Vec<TabularRecord>, ReconError> {
    require_sources(row_sets, required)?;
    Ok(merge(row_sets, identifier))
}

/// Combine row-sets under `policy` once `required` of them are non-empty.
pub fn merge_with_policy<S: AsRef<[TabularRecord]>>(
    row_sets: &[S],
    required: usize,
    policy: MergePolicy,
    identifier: &Identifier,
) -> Result<Vec<TabularRecord>, ReconError> {
    require_sources(row_sets, required)?;
    Ok(match policy {
        MergePolicy::Overlay => merge(row_sets, identifier),
        MergePolicy::FillMissing => combine_all(row_sets, identifier),
    })
}

/// Primary-driven left join. Each primary row takes only the columns it lacks
/// from the first secondary row with the same identifier. Primary rows with
/// no identifier or no match pass through; secondary-only rows are dropped.
pub fn combine(
    primary: &[TabularRecord],
    secondary: &[TabularRecord],
    identifier: &Identifier,
) -> Vec<TabularRecord> {
    let mut lookup: HashMap<String, &TabularRecord> = HashMap::new();
    for row in secondary {
        if let Some(id) = identifier.of(row) {
            lookup.entry(id).or_insert(row);
        }
    }

    primary
        .iter()
        .map(|row| {
            let mut combined = row.clone();
            match identifier.of(row) {
                Some(id) => {
                    if let Some(other) = lookup.get(&id) {
                        combined.fill_missing(other);
                    }
                }
                None => log::warn!(
                    "primary row has no '{}' value, passed through as-is",
                    identifier.column
                ),
            }
            combined
        })
        .collect()
}

/// [`combine`] folded across several row-sets: the first is primary, each
/// later set fills in columns still missing.
pub fn combine_all<S: AsRef<[TabularRecord]>>(row_sets: &[S], identifier: &Identifier) -> Vec<TabularRecord> {
    let mut iter = row_sets.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    iter.fold(first.as_ref().to_vec(), |acc, rows| combine(&acc, rows.as_ref(), identifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;

    fn rec(pairs: &[(&str, &str)]) -> TabularRecord {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn id() -> Identifier {
        Identifier::default()
    }

    #[test]
    fn later_source_adds_fields() {
        let merged = merge(
            &[
                vec![rec(&[("Employee ID", "1"), ("Name", "A")])],
                vec![rec(&[("Employee ID", "1"), ("Dept", "X")])],
            ],
            &id(),
        );
        assert_eq!(merged, vec![rec(&[("Employee ID", "1"), ("Name", "A"), ("Dept", "X")])]);
        assert_eq!(merged[0].columns(), &["Employee ID", "Name", "Dept"]);
    }

    #[test]
    fn later_source_wins() {
        let merged = merge(
            &[
                vec![rec(&[("Employee ID", "1"), ("Dept", "X")])],
                vec![rec(&[("Employee ID", "1"), ("Dept", "Y")])],
            ],
            &id(),
        );
        assert_eq!(merged, vec![rec(&[("Employee ID", "1"), ("Dept", "Y")])]);
    }

    #[test]
    fn first_appearance_order() {
        let merged = merge(
            &[
                vec![rec(&[("Employee ID", "3")]), rec(&[("Employee ID", "1")])],
                vec![rec(&[("Employee ID", "2")]), rec(&[("Employee ID", "3")])],
            ],
            &id(),
        );
        let ids: Vec<_> = merged.iter().map(|r| id().of(r).unwrap()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn identifier_is_trimmed_and_stringified() {
        let mut numeric = TabularRecord::new();
        numeric.insert("Employee ID", 7i64);
        numeric.insert("Dept", "X");
        let merged = merge(
            &[vec![numeric], vec![rec(&[("Employee ID", " 7 "), ("Site", "S")])]],
            &id(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get("Site"), Some(&CellValue::from("S")));
        // Later source overwrote the raw id value
        assert_eq!(merged[0].get("Employee ID"), Some(&CellValue::from(" 7 ")));
    }

    #[test]
    fn rows_without_identifier_never_collide() {
        let merged = merge(
            &[
                vec![rec(&[("Name", "A")]), rec(&[("Employee ID", ""), ("Name", "B")])],
                vec![rec(&[("Name", "C")])],
            ],
            &id(),
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[2].get("Name"), Some(&CellValue::from("C")));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(merge::<Vec<TabularRecord>>(&[], &id()).is_empty());
        assert!(merge(&[Vec::<TabularRecord>::new(), Vec::new()], &id()).is_empty());
    }

    #[test]
    fn merge_required_counts_non_empty_sets() {
        let sets = vec![vec![rec(&[("Employee ID", "1")])], vec![], vec![rec(&[("Employee ID", "2")])]];
        let err = merge_required(&sets, 3, &id()).unwrap_err();
        assert_eq!(err, ReconError::MissingInput { required: 3, supplied: 2 });
        assert_eq!(merge_required(&sets, 2, &id()).unwrap().len(), 2);
    }

    #[test]
    fn policy_merge_checks_sources_first() {
        let sets = vec![
            vec![rec(&[("Employee ID", "1"), ("Dept", "X")])],
            vec![rec(&[("Employee ID", "1"), ("Dept", "Y"), ("Site", "S")]), rec(&[("Employee ID", "2")])],
        ];
        let overlay = merge_with_policy(&sets, 2, MergePolicy::Overlay, &id()).unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay[0].get("Dept"), Some(&CellValue::from("Y")));

        let filled = merge_with_policy(&sets, 2, MergePolicy::FillMissing, &id()).unwrap();
        assert_eq!(filled, vec![rec(&[("Employee ID", "1"), ("Dept", "X"), ("Site", "S")])]);

        let with_empty = vec![sets[0].clone(), Vec::new()];
        assert_eq!(
            merge_with_policy(&with_empty, 2, MergePolicy::FillMissing, &id()).unwrap_err(),
            ReconError::MissingInput { required: 2, supplied: 1 }
        );
        assert!(require_sources(&with_empty, 1).is_ok());
    }

    #[test]
    fn keyed_rows_tracks_keys() {
        let mut acc = KeyedRows::new();
        acc.upsert(Some("1".into()), &rec(&[("a", "x")]));
        acc.upsert(None, &rec(&[("a", "y")]));
        acc.upsert(None, &rec(&[("a", "z")]));
        acc.upsert(Some("1".into()), &rec(&[("b", "w")]));
        assert_eq!(
            acc.keys(),
            &[RowKey::Id("1".into()), RowKey::Anonymous(0), RowKey::Anonymous(1)]
        );
        assert_eq!(acc.get("1"), Some(&rec(&[("a", "x"), ("b", "w")])));
    }

    #[test]
    fn combine_primary_wins_and_fills_gaps() {
        let resources = vec![
            rec(&[("Employee ID", "1"), ("Name", "Ann"), ("Dept", "X")]),
            rec(&[("Employee ID", "2"), ("Name", "Bob")]),
            rec(&[("Name", "NoId")]),
        ];
        let managers = vec![
            rec(&[("Employee ID", "1 "), ("Dept", "Y"), ("Manager", "Jane")]),
            rec(&[("Employee ID", "9"), ("Manager", "Zed")]),
        ];
        let combined = combine(&resources, &managers, &id());
        assert_eq!(combined.len(), 3);
        assert_eq!(combined[0].get("Dept"), Some(&CellValue::from("X")));
        assert_eq!(combined[0].get("Manager"), Some(&CellValue::from("Jane")));
        assert_eq!(combined[1], resources[1]);
        assert_eq!(combined[2], resources[2]);
    }

    #[test]
    fn combine_all_folds_in_order() {
        let sets = vec![
            vec![rec(&[("Employee ID", "1")])],
            vec![rec(&[("Employee ID", "1"), ("a", "first")])],
            vec![rec(&[("Employee ID", "1"), ("a", "second"), ("b", "b")])],
        ];
        let combined = combine_all(&sets, &id());
        assert_eq!(combined, vec![rec(&[("Employee ID", "1"), ("a", "first"), ("b", "b")])]);
        assert!(combine_all::<Vec<TabularRecord>>(&[], &id()).is_empty());
    }
}
