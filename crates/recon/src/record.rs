use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Column used as the join/merge key when a config does not name one.
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "Employee ID";

// ---------------------------------------------------------------------------
// Cell values
// ---------------------------------------------------------------------------

/// A scalar spreadsheet cell. An undefined cell is an absent column.
///
/// Equality is strict: `Number(5.0)` and `Text("5")` are different values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            // Integers without decimals
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One spreadsheet row: column name -> cell value, in column insertion order.
///
/// Rows carry no schema. Two rows from the same file may hold different
/// column sets. Setting an existing column keeps its position; a new column
/// is appended.
#[derive(Debug, Clone, Default)]
pub struct TabularRecord {
    columns: Vec<String>,
    values: HashMap<String, CellValue>,
}

impl TabularRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Set a column, returning the previous value if there was one.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Option<CellValue> {
        let column = column.into();
        let value = value.into();
        if let Some(slot) = self.values.get_mut(&column) {
            return Some(std::mem::replace(slot, value));
        }
        self.columns.push(column.clone());
        self.values.insert(column, value);
        None
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns
            .iter()
            .filter_map(move |c| self.values.get(c).map(|v| (c.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Display text of a column, `None` when absent or blank.
    pub fn text(&self, column: &str) -> Option<String> {
        let value = self.get(column)?;
        let text = value.to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Copy every column of `other` into `self`; `other` wins on conflicts.
    pub fn overlay(&mut self, other: &TabularRecord) {
        for (column, value) in other.iter() {
            self.insert(column, value.clone());
        }
    }

    /// Copy only the columns of `other` that `self` does not have yet.
    pub fn fill_missing(&mut self, other: &TabularRecord) {
        for (column, value) in other.iter() {
            if !self.contains(column) {
                self.insert(column, value.clone());
            }
        }
    }
}

/// Records compare by content: same columns with equal values. Column order
/// is not part of equality.
impl PartialEq for TabularRecord {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<K, V> FromIterator<(K, V)> for TabularRecord
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = TabularRecord::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

impl Serialize for TabularRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TabularRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = TabularRecord;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column name to scalar cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut record = TabularRecord::new();
                while let Some((column, value)) = access.next_entry::<String, Option<CellValue>>()? {
                    // null is an undefined cell
                    if let Some(value) = value {
                        record.insert(column, value);
                    }
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// The designated key column plus the single normalization policy used by
/// merge, diff, grouping and the edit grant: stringify, then trim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identifier {
    #[serde(default = "default_identifier_column")]
    pub column: String,
}

fn default_identifier_column() -> String {
    DEFAULT_IDENTIFIER_COLUMN.into()
}

impl Default for Identifier {
    fn default() -> Self {
        Self {
            column: default_identifier_column(),
        }
    }
}

impl Identifier {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Normalized identifier of `record`, `None` when missing or blank.
    pub fn of(&self, record: &TabularRecord) -> Option<String> {
        record.get(&self.column).and_then(normalize_identifier)
    }
}

pub fn normalize_identifier(value: &CellValue) -> Option<String> {
    let text = value.to_string();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Union of column names across all rows, in first-appearance order.
pub fn column_union(rows: &[TabularRecord]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for column in row.columns() {
            if seen.insert(column.as_str()) {
                columns.push(column.clone());
            }
        }
    }
    columns
}
