//! Build pipeline integration tests
//!
//! Each test copies a fixture project to a temp directory, runs the full build
//! and inspects the written snapshot.

use std::fs;

use pretty_assertions::assert_eq;
use rust_relschema::output::{checksum, ForeignKeySnapshot, Manifest, SchemaSnapshot, TableSnapshot};

use crate::common::{column_ids, table, TestContext};

fn foreign_key<'a>(table: &'a TableSnapshot, foreign_table: &str) -> &'a ForeignKeySnapshot {
    table
        .foreign_keys
        .iter()
        .find(|fk| fk.foreign_table_id == foreign_table)
        .unwrap_or_else(|| panic!("{} has no foreign key to {}", table.table_id, foreign_table))
}

fn pairs(fk: &ForeignKeySnapshot) -> Vec<(&str, &str)> {
    fk.column_pairs
        .iter()
        .map(|p| (p.parent_table_column_id.as_str(), p.foreign_table_column_id.as_str()))
        .collect()
}

fn table_ids(snapshot: &SchemaSnapshot, schema: &str) -> Vec<String> {
    let mut ids: Vec<String> = snapshot
        .namespaces
        .iter()
        .filter(|ns| ns.schema == schema)
        .flat_map(|ns| ns.tables.iter().map(|t| t.table_id.clone()))
        .collect();
    ids.sort();
    ids
}

#[test]
fn test_build_school_core_tables() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    assert_eq!(
        table_ids(&snapshot, "edfi"),
        vec![
            "AddressType",
            "CourseOffering",
            "Descriptor",
            "EducationOrganization",
            "GradeLevelDescriptor",
            "School",
            "SchoolGradeLevel",
            "SchoolYearType",
            "Session",
            "Student",
            "StudentAddress",
            "StudentSchoolAssociation",
            "TermDescriptor",
        ]
    );
    assert_eq!(table_ids(&snapshot, "sample"), vec!["SchoolExtension"]);
    assert_eq!(snapshot.table_count(), 14);
}

#[test]
fn test_target_version_falls_back_to_core_namespace_version() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    assert_eq!(snapshot.target_version, "7.0.0");
    let student = table(&snapshot, "edfi", "Student");
    assert!(!student.has_ownership_token_column);
    let enrollment = table(&snapshot, "edfi", "StudentSchoolAssociation");
    assert_eq!(enrollment.ed_org_id_columns, vec!["SchoolId"]);
}

#[test]
fn test_explicit_target_version_overrides_project() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(Some("7.1"));

    assert_eq!(snapshot.target_version, "7.1.0");
    let student = table(&snapshot, "edfi", "Student");
    assert!(student.has_ownership_token_column);
    assert_eq!(column_ids(student).last(), Some(&"CreatedByOwnershipTokenId"));
    // Only aggregate roots carry the token
    let address = table(&snapshot, "edfi", "StudentAddress");
    assert!(!address.has_ownership_token_column);
}

#[test]
fn test_student_identity_uses_usi() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    let student = table(&snapshot, "edfi", "Student");
    assert_eq!(student.primary_key, vec!["StudentUSI"]);
    let usi = &student.columns[0];
    assert_eq!(usi.column_id, "StudentUSI");
    assert!(usi.is_identity_database_type);
    let unique_id = student.columns.iter().find(|c| c.column_id == "StudentUniqueId").unwrap();
    assert!(unique_id.is_unique_index);
    assert_eq!(unique_id.max_length, Some(32));

    let address = table(&snapshot, "edfi", "StudentAddress");
    assert_eq!(address.primary_key, vec!["StudentUSI", "AddressTypeId", "StreetNumberName"]);
    assert_eq!(address.parent_table_id.as_deref(), Some("Student"));
    assert_eq!(pairs(foreign_key(address, "Student")), vec![("StudentUSI", "StudentUSI")]);
    assert_eq!(pairs(foreign_key(address, "AddressType")), vec![("AddressTypeId", "AddressTypeId")]);
}

#[test]
fn test_merge_directive_collapses_school_id() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    let offering = table(&snapshot, "edfi", "CourseOffering");
    assert_eq!(offering.primary_key, vec!["LocalCourseCode", "SchoolId", "SessionName"]);
    assert_eq!(
        column_ids(offering).iter().filter(|id| **id == "SchoolId").count(),
        1
    );

    let to_session = foreign_key(offering, "Session");
    assert_eq!(
        pairs(to_session),
        vec![("SchoolId", "SchoolId"), ("SessionName", "SessionName")]
    );
    assert!(to_session.with_update_cascade);
    assert!(to_session.is_identifying);
    assert_eq!(to_session.name, "FK_CourseOffering_Session");

    let to_school = foreign_key(offering, "School");
    assert_eq!(pairs(to_school), vec![("SchoolId", "SchoolId")]);
    assert!(!to_school.with_update_cascade);
}

#[test]
fn test_subclass_links_to_base_through_renamed_key() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    let school = table(&snapshot, "edfi", "School");
    assert_eq!(school.primary_key, vec!["SchoolId"]);
    assert!(!school.has_discriminator_column);
    let to_base = foreign_key(school, "EducationOrganization");
    assert_eq!(pairs(to_base), vec![("SchoolId", "EducationOrganizationId")]);
    assert!(to_base.with_delete_cascade);

    let ed_org = table(&snapshot, "edfi", "EducationOrganization");
    assert!(ed_org.has_discriminator_column);
    assert_eq!(ed_org.ed_org_id_columns, vec!["EducationOrganizationId"]);

    let grade_levels = table(&snapshot, "edfi", "SchoolGradeLevel");
    assert_eq!(grade_levels.primary_key, vec!["SchoolId", "GradeLevelDescriptorId"]);
    assert!(grade_levels.is_required_collection_table);
    assert_eq!(
        pairs(foreign_key(grade_levels, "GradeLevelDescriptor")),
        vec![("GradeLevelDescriptorId", "GradeLevelDescriptorId")]
    );
}

#[test]
fn test_role_named_lookups_on_association() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    let enrollment = table(&snapshot, "edfi", "StudentSchoolAssociation");
    assert_eq!(enrollment.primary_key, vec!["EntryDate", "SchoolId", "StudentUSI"]);
    assert!(enrollment.has_discriminator_column);

    let class_of = enrollment
        .columns
        .iter()
        .find(|c| c.column_id == "ClassOfSchoolYear")
        .unwrap();
    assert!(class_of.is_nullable);
    foreign_key(enrollment, "SchoolYearType");

    assert_eq!(
        pairs(foreign_key(enrollment, "GradeLevelDescriptor")),
        vec![("EntryGradeLevelDescriptorId", "GradeLevelDescriptorId")]
    );
    assert_eq!(
        pairs(foreign_key(enrollment, "Student")),
        vec![("StudentUSI", "StudentUSI")]
    );
}

#[test]
fn test_extension_table_in_extension_schema() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    let extension = table(&snapshot, "sample", "SchoolExtension");
    assert_eq!(column_ids(extension), vec!["SchoolId", "Mascot"]);
    let mascot = &extension.columns[1];
    assert!(mascot.is_nullable);
    assert_eq!(mascot.max_length, Some(50));

    let to_school = foreign_key(extension, "School");
    assert_eq!(to_school.foreign_table_schema, "edfi");
    assert!(to_school.with_delete_cascade);
    assert_eq!(to_school.name, "FK_SchoolExtension_School");
}

#[test]
fn test_seed_rows_are_written() {
    let ctx = TestContext::with_fixture("school_core");
    let snapshot = ctx.build_successfully(None);

    let edfi = snapshot.namespaces.iter().find(|ns| ns.schema == "edfi").unwrap();
    let descriptions: Vec<&str> = edfi
        .enumeration_rows
        .iter()
        .map(|r| r.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["Home", "Mailing"]);
    let years: Vec<i32> = edfi.school_year_rows.iter().map(|r| r.school_year).collect();
    assert_eq!(years, vec![2023, 2024]);
}

#[test]
fn test_manifest_matches_snapshot() {
    let ctx = TestContext::with_fixture("school_core");
    let result = ctx.build();
    assert!(result.success, "Build failed: {:?}", result.errors);

    let snapshot_path = result.snapshot_path.unwrap();
    let manifest_path = result.manifest_path.unwrap();
    assert_eq!(snapshot_path, ctx.output_dir().join("SchoolCore.schema.json"));

    let manifest: Manifest = serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.checksum, checksum(&fs::read(&snapshot_path).unwrap()));
    assert_eq!(manifest.snapshot_file, "SchoolCore.schema.json");
    assert_eq!(manifest.target_version, "7.0.0");
    assert_eq!(manifest.table_count, 14);
    assert!(uuid::Uuid::parse_str(&manifest.build_id).is_ok());
}

#[test]
fn test_rebuild_ignores_previous_output() {
    let ctx = TestContext::with_fixture("school_core");
    let first = ctx.build_successfully(None);
    let second = ctx.build_successfully(None);
    assert_eq!(first, second);
}

#[test]
fn test_unresolved_reference_fails_build() {
    let ctx = TestContext::with_fixture("unresolved_reference");
    let result = ctx.build();

    assert!(!result.success);
    let error = &result.errors[0];
    assert!(error.contains("Unresolved referenced entity 'School'"), "{}", error);
    assert!(!ctx.output_dir().exists());
}

#[test]
fn test_namespace_cycle_fails_build() {
    let ctx = TestContext::with_fixture("namespace_cycle");
    let result = ctx.build();

    assert!(!result.success);
    let error = &result.errors[0];
    assert!(error.contains("Circular namespace dependency"), "{}", error);
}

#[test]
fn test_invalid_target_version_fails_build() {
    let ctx = TestContext::with_fixture("school_core");
    let result = ctx.build_with_version(Some("latest"));

    assert!(!result.success);
    assert!(result.errors[0].contains("latest"), "{}", result.errors[0]);
}
