//! Compare two schema snapshots and report differences

pub mod report;
mod tables;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;

use crate::output::{read_snapshot, SchemaSnapshot, TableSnapshot};
pub use tables::compare_tables;
use types::{CompareResult, TableKey};

fn index_tables(snapshot: &SchemaSnapshot) -> BTreeMap<TableKey, &TableSnapshot> {
    snapshot
        .namespaces
        .iter()
        .flat_map(|ns| ns.tables.iter())
        .map(|t| (TableKey::new(t.schema.clone(), t.table_id.clone()), t))
        .collect()
}

/// Seed rows as `schema.name: description` lines
fn row_lines(snapshot: &SchemaSnapshot) -> BTreeSet<String> {
    let mut lines = BTreeSet::new();
    for namespace in &snapshot.namespaces {
        for row in &namespace.enumeration_rows {
            lines.insert(format!("{}.{}: {}", row.schema, row.name, row.description));
        }
        for row in &namespace.school_year_rows {
            lines.insert(format!("{}.{}: {} ({})", row.schema, row.name, row.description, row.school_year));
        }
    }
    lines
}

/// Compare two in-memory snapshots.
pub fn compare(baseline: &SchemaSnapshot, candidate: &SchemaSnapshot) -> CompareResult {
    let baseline_tables = index_tables(baseline);
    let candidate_tables = index_tables(candidate);

    let mut result = CompareResult {
        total_baseline: baseline_tables.len(),
        total_candidate: candidate_tables.len(),
        ..CompareResult::default()
    };
    if baseline.target_version != candidate.target_version {
        result.version_difference = Some((baseline.target_version.clone(), candidate.target_version.clone()));
    }

    for (key, table) in &baseline_tables {
        let Some(other) = candidate_tables.get(key) else {
            result.missing_in_candidate.push(key.clone());
            continue;
        };
        let diffs = compare_tables(table, other);
        if !diffs.is_empty() {
            result.differences.push((key.clone(), diffs));
        }
    }
    result.extra_in_candidate = candidate_tables
        .keys()
        .filter(|key| !baseline_tables.contains_key(*key))
        .cloned()
        .collect();

    let baseline_rows = row_lines(baseline);
    let candidate_rows = row_lines(candidate);
    for line in baseline_rows.difference(&candidate_rows) {
        result.row_differences.push(format!("missing in candidate: {}", line));
    }
    for line in candidate_rows.difference(&baseline_rows) {
        result.row_differences.push(format!("extra in candidate: {}", line));
    }
    result
}

/// Compare two snapshot files and return a structured result.
pub fn compare_snapshots(baseline_path: &Path, candidate_path: &Path) -> Result<CompareResult> {
    let baseline = read_snapshot(baseline_path)?;
    let candidate = read_snapshot(candidate_path)?;
    Ok(compare(&baseline, &candidate))
}
