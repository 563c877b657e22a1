//! Output records and run-level reporting.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::convergence::LoadReport;
use crate::schema::Field;

/// Placeholder for fields the row did not yield.
pub const NOT_AVAILABLE: &str = "N/A";

/// One extracted issue: a flat field → string mapping.
///
/// Created per row, normalized in place, then never mutated again.
/// Serialization always emits all canonical fields, with
/// [`NOT_AVAILABLE`] standing in for anything the row did not carry, so
/// downstream tabular consumers see a stable column set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueRecord {
    fields: BTreeMap<Field, String>,
}

impl IssueRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value, empty string when absent.
    pub fn get(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Value as exported: [`NOT_AVAILABLE`] when absent.
    pub fn value_or_na(&self, field: Field) -> &str {
        let value = self.get(field);
        if value.is_empty() { NOT_AVAILABLE } else { value }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
    }

    pub fn clear(&mut self, field: Field) {
        self.fields.remove(&field);
    }

    /// Exchange the values of two fields (either may be absent).
    pub fn swap(&mut self, a: Field, b: Field) {
        let va = self.fields.remove(&a);
        let vb = self.fields.remove(&b);
        if let Some(v) = vb {
            self.fields.insert(a, v);
        }
        if let Some(v) = va {
            self.fields.insert(b, v);
        }
    }

    pub fn title(&self) -> &str {
        self.get(Field::Title)
    }

    /// Fields that actually carry a value.
    pub fn populated(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

impl Serialize for IssueRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Field::ALL.len()))?;
        for field in Field::ALL {
            map.serialize_entry(field.display_name(), self.value_or_na(field))?;
        }
        map.end()
    }
}

/// Number of distinct titles appearing on more than one record.
///
/// Duplicate-titled rows are retained in the output on purpose (the target
/// application legitimately shows them), but the collision count is
/// reported so downstream upsert-by-title consumers can decide policy.
pub fn duplicate_title_count(records: &[IssueRecord]) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.title()).or_default() += 1;
    }
    counts.values().filter(|&&n| n > 1).count()
}

/// Everything a run produced, including enough state for the caller to
/// judge completeness.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    /// Normalized records in render order.
    pub records: Vec<IssueRecord>,
    /// Rows the extractor attempted.
    pub rows_seen: usize,
    /// Rows that yielded no usable record.
    pub rows_skipped: usize,
    /// Distinct titles occurring more than once.
    pub duplicate_titles: usize,
    /// How the load loop ended.
    pub load: LoadReport,
}
