//! Semantic comparison of tables present in both snapshots

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::output::{ColumnSnapshot, ForeignKeySnapshot, TableSnapshot};

/// Push a detail line when a field differs
fn field<T: PartialEq + Debug>(diffs: &mut Vec<String>, label: &str, baseline: &T, candidate: &T) {
    if baseline != candidate {
        diffs.push(format!("{}: {:?} -> {:?}", label, baseline, candidate));
    }
}

fn compare_column(diffs: &mut Vec<String>, a: &ColumnSnapshot, b: &ColumnSnapshot) {
    let label = |name: &str| format!("column {} {}", a.column_id, name);
    field(diffs, &label("dataType"), &a.data_type, &b.data_type);
    field(diffs, &label("maxLength"), &a.max_length, &b.max_length);
    field(diffs, &label("precision"), &a.precision, &b.precision);
    field(diffs, &label("scale"), &a.scale, &b.scale);
    field(diffs, &label("isNullable"), &a.is_nullable, &b.is_nullable);
    field(diffs, &label("isPartOfPrimaryKey"), &a.is_part_of_primary_key, &b.is_part_of_primary_key);
    field(diffs, &label("isUniqueIndex"), &a.is_unique_index, &b.is_unique_index);
    field(
        diffs,
        &label("isIdentityDatabaseType"),
        &a.is_identity_database_type,
        &b.is_identity_database_type,
    );
    field(diffs, &label("isDeprecated"), &a.is_deprecated, &b.is_deprecated);
}

fn compare_foreign_key(diffs: &mut Vec<String>, a: &ForeignKeySnapshot, b: &ForeignKeySnapshot) {
    let label = |name: &str| format!("foreign key {} {}", a.name, name);
    field(diffs, &label("foreignTable"), &a.foreign_table_id, &b.foreign_table_id);
    field(diffs, &label("foreignSchema"), &a.foreign_table_schema, &b.foreign_table_schema);
    let pairs = |fk: &ForeignKeySnapshot| -> Vec<String> {
        fk.column_pairs
            .iter()
            .map(|p| format!("{}={}", p.parent_table_column_id, p.foreign_table_column_id))
            .collect()
    };
    field(diffs, &label("columns"), &pairs(a), &pairs(b));
    field(diffs, &label("withDeleteCascade"), &a.with_delete_cascade, &b.with_delete_cascade);
    field(diffs, &label("withUpdateCascade"), &a.with_update_cascade, &b.with_update_cascade);
    field(
        diffs,
        &label("withReverseForeignKeyIndex"),
        &a.with_reverse_foreign_key_index,
        &b.with_reverse_foreign_key_index,
    );
    field(diffs, &label("isIdentifying"), &a.is_identifying, &b.is_identifying);
}

/// Report items present on only one side, then hand matched pairs to `matched`
fn compare_keyed<'a, T>(
    diffs: &mut Vec<String>,
    kind: &str,
    baseline: impl Iterator<Item = (&'a str, &'a T)>,
    candidate: impl Iterator<Item = (&'a str, &'a T)>,
    mut matched: impl FnMut(&mut Vec<String>, &T, &T),
) where
    T: 'a,
{
    let baseline: BTreeMap<&str, &T> = baseline.collect();
    let candidate: BTreeMap<&str, &T> = candidate.collect();
    for (key, a) in &baseline {
        match candidate.get(key) {
            Some(b) => matched(diffs, a, b),
            None => diffs.push(format!("{} {} missing in candidate", kind, key)),
        }
    }
    for key in candidate.keys().filter(|k| !baseline.contains_key(*k)) {
        diffs.push(format!("{} {} extra in candidate", kind, key));
    }
}

/// Detail lines for one table; empty when the tables match
pub fn compare_tables(a: &TableSnapshot, b: &TableSnapshot) -> Vec<String> {
    let mut diffs = Vec::new();
    field(&mut diffs, "existenceReason", &a.existence_reason, &b.existence_reason);
    field(&mut diffs, "parentTableId", &a.parent_table_id, &b.parent_table_id);
    field(&mut diffs, "primaryKey", &a.primary_key, &b.primary_key);

    compare_keyed(
        &mut diffs,
        "column",
        a.columns.iter().map(|c| (c.column_id.as_str(), c)),
        b.columns.iter().map(|c| (c.column_id.as_str(), c)),
        compare_column,
    );
    let column_order = |t: &TableSnapshot| -> Vec<String> { t.columns.iter().map(|c| c.column_id.clone()).collect() };
    if diffs.is_empty() {
        field(&mut diffs, "columnOrder", &column_order(a), &column_order(b));
    }

    compare_keyed(
        &mut diffs,
        "foreign key",
        a.foreign_keys.iter().map(|fk| (fk.name.as_str(), fk)),
        b.foreign_keys.iter().map(|fk| (fk.name.as_str(), fk)),
        compare_foreign_key,
    );

    field(
        &mut diffs,
        "isRequiredCollectionTable",
        &a.is_required_collection_table,
        &b.is_required_collection_table,
    );
    field(&mut diffs, "isAggregateRootTable", &a.is_aggregate_root_table, &b.is_aggregate_root_table);
    field(&mut diffs, "hasDiscriminatorColumn", &a.has_discriminator_column, &b.has_discriminator_column);
    field(
        &mut diffs,
        "hasOwnershipTokenColumn",
        &a.has_ownership_token_column,
        &b.has_ownership_token_column,
    );
    field(&mut diffs, "isDeprecated", &a.is_deprecated, &b.is_deprecated);
    field(&mut diffs, "edOrgIdColumns", &a.ed_org_id_columns, &b.ed_org_id_columns);
    diffs
}
