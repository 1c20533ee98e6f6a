//! Table column ordering tests

use pretty_assertions::assert_eq;
use rust_relschema::database::{Column, ColumnDataType, ColumnTransform, PrimaryKeyOrdering, Table, TableExistenceReason};
use semver::Version;

fn column(id: &str, primary_key: bool) -> Column {
    let mut c = Column::new(id, ColumnDataType::Integer);
    c.is_part_of_primary_key = primary_key;
    c
}

fn table(version: &Version, columns: &[(&str, bool)]) -> Table {
    let mut table = Table::new("Session", "edfi", "EdFi", TableExistenceReason::Main, version);
    for (id, pk) in columns {
        table.columns.push(column(id, *pk));
    }
    table
}

fn ids(columns: Vec<&Column>) -> Vec<&str> {
    columns.into_iter().map(|c| c.column_id.as_str()).collect()
}

#[test]
fn test_primary_keys_come_first() {
    let v7 = Version::new(7, 1, 0);
    let table = table(&v7, &[("A", false), ("B", true), ("C", false), ("D", true)]);
    assert_eq!(ids(table.get_all_columns()), vec!["B", "D", "A", "C"]);
}

#[test]
fn test_primary_key_order_follows_layout_version() {
    let columns = [("Zeta", true), ("Alpha", true), ("Notes", false)];

    let v6 = Version::new(6, 1, 0);
    let old = table(&v6, &columns);
    assert_eq!(old.primary_key_ordering, PrimaryKeyOrdering::Alphabetical);
    assert_eq!(ids(old.get_all_columns()), vec!["Alpha", "Zeta", "Notes"]);

    let v7 = Version::new(7, 0, 0);
    let new = table(&v7, &columns);
    assert_eq!(new.primary_key_ordering, PrimaryKeyOrdering::Declaration);
    assert_eq!(ids(new.get_all_columns()), vec!["Zeta", "Alpha", "Notes"]);
}

#[test]
fn test_merged_duplicate_keeps_single_column() {
    let v7 = Version::new(7, 1, 0);
    let mut table = table(&v7, &[]);
    let mut nullable = column("SchoolId", false);
    nullable.is_nullable = true;
    table.add_column(nullable, &v7);
    table.add_column(column("SessionName", true), &v7);
    table.add_column(column("SchoolId", true), &v7);

    assert_eq!(table.columns.len(), 2);
    let school = table.get_column("SchoolId").unwrap();
    assert!(school.is_part_of_primary_key);
    assert!(!school.is_nullable);
    assert_eq!(table.primary_key_ids(), vec!["SchoolId", "SessionName"]);
}

#[test]
fn test_role_name_transform_prefixes_and_keys() {
    let v7 = Version::new(7, 1, 0);
    let mut table = table(&v7, &[]);
    table.add_columns_without_sort(
        vec![column("SchoolId", false)],
        &ColumnTransform::PrimaryKey.with_role_name("Responsible"),
        &v7,
    );

    let c = &table.columns[0];
    assert_eq!(c.column_id, "ResponsibleSchoolId");
    assert!(c.is_part_of_primary_key);
    assert!(!c.is_nullable);
}

#[test]
fn test_make_null_drops_key_status() {
    let v7 = Version::new(7, 1, 0);
    let mut table = table(&v7, &[]);
    table.add_columns_without_sort(
        vec![column("SchoolId", true)],
        &ColumnTransform::PrimaryKey.make_null(),
        &v7,
    );

    let c = &table.columns[0];
    assert!(c.is_nullable);
    assert!(!c.is_part_of_primary_key);
}
