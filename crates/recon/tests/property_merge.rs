// Property-based tests for merge, diff and grouping.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, BTreeSet};

use census_recon::authority::{group, DirectoryColumns};
use census_recon::diff::diff;
use census_recon::merge::merge;
use census_recon::record::{CellValue, Identifier, TabularRecord};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const ID: &str = "Employee ID";

/// Arbitrary cell: mostly text, sometimes numeric.
fn arb_value() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        3 => "[a-zA-Z]{1,6}".prop_map(CellValue::Text),
        1 => (0i64..500).prop_map(CellValue::from),
    ]
}

/// A row with an id drawn from a small pool (so ids repeat across sets) and
/// a sparse subset of columns.
fn arb_row() -> impl Strategy<Value = TabularRecord> {
    (
        0u8..12,
        proptest::collection::btree_map("[a-e]", arb_value(), 0..4),
    )
        .prop_map(|(id, fields)| {
            let mut row = TabularRecord::new();
            row.insert(ID, id.to_string());
            for (column, value) in fields {
                row.insert(column, value);
            }
            row
        })
}

/// Rows with unique ids inside one set.
fn arb_row_set() -> impl Strategy<Value = Vec<TabularRecord>> {
    proptest::collection::vec(arb_row(), 0..10).prop_map(|rows| {
        let mut seen = BTreeSet::new();
        rows.into_iter()
            .filter(|r| seen.insert(Identifier::new(ID).of(r)))
            .collect()
    })
}

fn ids(rows: &[TabularRecord]) -> BTreeSet<String> {
    rows.iter().filter_map(|r| Identifier::new(ID).of(r)).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn merge_is_union_with_last_writer_wins(sets in proptest::collection::vec(arb_row_set(), 0..4)) {
        let identifier = Identifier::new(ID);
        let merged = merge(&sets, &identifier);

        let expected_ids: BTreeSet<String> = sets.iter().flat_map(|s| ids(s)).collect();
        prop_assert_eq!(ids(&merged), expected_ids.clone());
        prop_assert_eq!(merged.len(), expected_ids.len());

        // Expected value of every (id, column): last set defining it
        let mut expected: BTreeMap<(String, String), CellValue> = BTreeMap::new();
        for set in &sets {
            for row in set {
                let id = identifier.of(row).unwrap();
                for (column, value) in row.iter() {
                    expected.insert((id.clone(), column.to_string()), value.clone());
                }
            }
        }
        for row in &merged {
            let id = identifier.of(row).unwrap();
            for (column, value) in row.iter() {
                prop_assert_eq!(Some(value), expected.get(&(id.clone(), column.to_string())));
            }
        }
        let field_total: usize = merged.iter().map(|r| r.len()).sum();
        prop_assert_eq!(field_total, expected.len());
    }

    #[test]
    fn merge_of_one_set_is_identity(set in arb_row_set()) {
        let merged = merge(&[set.clone()], &Identifier::new(ID));
        prop_assert_eq!(merged, set);
    }

    #[test]
    fn self_diff_is_empty(set in arb_row_set()) {
        prop_assert!(diff(&set, &set, &Identifier::new(ID)).is_empty());
    }

    #[test]
    fn diff_never_reports_reference_only_fields(current in arb_row_set(), reference in arb_row_set()) {
        let identifier = Identifier::new(ID);
        for record in diff(&current, &reference, &identifier) {
            prop_assert!(!record.differences.is_empty());
            let row = current
                .iter()
                .find(|r| identifier.of(r).as_deref() == Some(record.employee_id.as_str()))
                .unwrap();
            for entry in &record.differences {
                prop_assert!(row.contains(&entry.field));
            }
        }
    }

    #[test]
    fn grouping_partitions_every_record(
        current in arb_row_set(),
        reference in arb_row_set(),
        directory in arb_row_set(),
    ) {
        let identifier = Identifier::new(ID);
        let diffs = diff(&current, &reference, &identifier);
        let groups = group(&diffs, &directory, &identifier, &DirectoryColumns::default());
        prop_assert_eq!(groups.record_count(), diffs.len());
    }
}
