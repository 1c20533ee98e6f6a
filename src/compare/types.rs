//! Core types for snapshot comparison

use std::fmt;

/// Key identifying a table across snapshots
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey {
    pub schema: String,
    pub table_id: String,
}

impl TableKey {
    pub fn new(schema: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table_id)
    }
}

/// Overall result of comparing a baseline snapshot with a candidate
#[derive(Debug, Clone, Default)]
pub struct CompareResult {
    pub total_baseline: usize,
    pub total_candidate: usize,
    /// Target versions when they differ: (baseline, candidate)
    pub version_difference: Option<(String, String)>,
    pub missing_in_candidate: Vec<TableKey>,
    pub extra_in_candidate: Vec<TableKey>,
    /// Per-table detail lines for tables present on both sides
    pub differences: Vec<(TableKey, Vec<String>)>,
    /// Seed row differences, one line each
    pub row_differences: Vec<String>,
}

impl CompareResult {
    /// Returns true if any differences were found.
    pub fn has_differences(&self) -> bool {
        self.version_difference.is_some()
            || !self.missing_in_candidate.is_empty()
            || !self.extra_in_candidate.is_empty()
            || !self.differences.is_empty()
            || !self.row_differences.is_empty()
    }
}
