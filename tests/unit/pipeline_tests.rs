//! End-to-end pipeline behavior over in-memory models

use pretty_assertions::assert_eq;
use rust_relschema::database::{ForeignKey, TableExistenceReason};
use rust_relschema::enhancer::{compile, compile_through, EnhancerGroup};
use rust_relschema::model::{Entity, EntityKind, MetaModel, Property, PropertyKind};
use rust_relschema::output::SchemaSnapshot;
use semver::Version;

use crate::common::{compile_model, core_model, identity_reference, keyed_entity};

fn pairs(fk: &ForeignKey) -> Vec<(&str, &str)> {
    fk.column_pairs
        .iter()
        .map(|p| (p.parent_table_column_id.as_str(), p.foreign_table_column_id.as_str()))
        .collect()
}

/// School <- Session (updatable key) <- CourseOffering <- Section
fn chained_model() -> MetaModel {
    let (mut model, ns) = core_model();
    let school = keyed_entity(&mut model, ns, "School", "SchoolId");
    let session = keyed_entity(&mut model, ns, "Session", "SessionName");
    model.entity_mut(session).allow_primary_key_updates = true;
    identity_reference(&mut model, session, school);
    let offering = keyed_entity(&mut model, ns, "CourseOffering", "LocalCourseCode");
    identity_reference(&mut model, offering, session);
    let section = keyed_entity(&mut model, ns, "Section", "SectionIdentifier");
    identity_reference(&mut model, section, offering);
    model
}

#[test]
fn test_update_cascade_spreads_through_identity_chain() {
    let ctx = compile_model(chained_model(), "7.1.0");
    let cascade = |table: &str| {
        let t = ctx.schema.find_table("EdFi", table).unwrap();
        assert_eq!(t.foreign_keys.len(), 1, "{} foreign keys", table);
        t.foreign_keys[0].with_update_cascade
    };

    assert!(!cascade("Session"));
    assert!(cascade("CourseOffering"));
    assert!(cascade("Section"));
}

#[test]
fn test_identity_columns_flatten_through_chain() {
    let ctx = compile_model(chained_model(), "7.1.0");
    let section = ctx.schema.find_table("EdFi", "Section").unwrap();
    assert_eq!(
        section.primary_key_ids(),
        vec!["LocalCourseCode", "SchoolId", "SectionIdentifier", "SessionName"]
    );
    assert_eq!(
        pairs(&section.foreign_keys[0]),
        vec![
            ("LocalCourseCode", "LocalCourseCode"),
            ("SchoolId", "SchoolId"),
            ("SessionName", "SessionName"),
        ]
    );
    assert_eq!(section.foreign_keys[0].name, "FK_Section_CourseOffering");
    assert!(section.foreign_keys[0].source_reference.is_identifying);
}

#[test]
fn test_usi_flows_into_referencing_tables() {
    let (mut model, ns) = core_model();
    let student = model.add_entity(ns, Entity::new(EntityKind::DomainEntity, "Student"));
    model.add_property(
        student,
        Property::new(PropertyKind::String, "UniqueId")
            .identity()
            .with_role_name("Student")
            .with_max_length(32),
    );
    let school = keyed_entity(&mut model, ns, "School", "SchoolId");
    let enrollment = model.add_entity(ns, Entity::new(EntityKind::Association, "StudentSchoolAssociation"));
    identity_reference(&mut model, enrollment, student);
    identity_reference(&mut model, enrollment, school);
    model.add_property(enrollment, Property::new(PropertyKind::Date, "EntryDate").identity());

    let ctx = compile_model(model, "7.1.0");
    let table = ctx.schema.find_table("EdFi", "StudentSchoolAssociation").unwrap();
    assert_eq!(table.primary_key_ids(), vec!["EntryDate", "SchoolId", "StudentUSI"]);
    assert!(table.get_column("StudentUniqueId").is_none());

    let to_student = table
        .foreign_keys
        .iter()
        .find(|fk| fk.foreign_table_id == "Student")
        .unwrap();
    assert_eq!(pairs(to_student), vec![("StudentUSI", "StudentUSI")]);
    assert!(!table.get_column("StudentUSI").unwrap().is_identity_database_type);
}

#[test]
fn test_extension_namespace_gets_its_own_schema() {
    let (mut model, core) = core_model();
    let school = keyed_entity(&mut model, core, "School", "SchoolId");
    let sample = model.add_namespace("Sample", true);
    model.add_dependency(sample, core);
    let extension = model.add_entity(sample, Entity::new(EntityKind::DomainEntityExtension, "School"));
    model.set_base_entity(extension, school);
    model.add_property(
        extension,
        Property::new(PropertyKind::String, "Mascot").optional().with_max_length(50),
    );

    let ctx = compile_model(model, "7.1.0");
    let table = ctx.schema.find_table("Sample", "SchoolExtension").unwrap();
    assert_eq!(table.schema, "sample");
    assert_eq!(table.existence_reason, TableExistenceReason::Extension);
    assert_eq!(table.primary_key_ids(), vec!["SchoolId"]);
    assert!(table.get_column("Mascot").unwrap().is_nullable);

    let fk = &table.foreign_keys[0];
    assert_eq!(fk.foreign_table_schema, "edfi");
    assert_eq!(fk.foreign_table_id, "School");
    assert!(fk.with_delete_cascade);
}

#[test]
fn test_compile_through_stops_after_group() {
    let (ctx, report) = compile_through(chained_model(), Version::new(7, 1, 0), EnhancerGroup::TableCreation).unwrap();
    assert!(report.is_complete());
    let session = ctx.schema.find_table("EdFi", "Session").unwrap();
    assert!(session.foreign_keys.is_empty());
    assert!(!report.results.iter().any(|r| r.enhancer_name == "ForeignKeyCreatingTableEnhancer"));
}

#[test]
fn test_compilation_is_deterministic() {
    let version = Version::new(7, 1, 0);
    let snapshot = || {
        let (ctx, _) = compile(chained_model(), version.clone()).unwrap();
        serde_json::to_string(&SchemaSnapshot::from_schema(&ctx.schema, &version)).unwrap()
    };
    assert_eq!(snapshot(), snapshot());
}

#[test]
fn test_descriptor_reference_gets_lookup_foreign_key() {
    let (mut model, ns) = core_model();
    let term = model.add_entity(ns, Entity::new(EntityKind::Descriptor, "Term"));
    let session = keyed_entity(&mut model, ns, "Session", "SessionName");
    model.add_property(session, Property::new(PropertyKind::Descriptor, "Term").references(term));

    let ctx = compile_model(model, "7.1.0");
    let descriptor = ctx.schema.find_table("EdFi", "TermDescriptor").unwrap();
    assert_eq!(descriptor.primary_key_ids(), vec!["TermDescriptorId"]);
    assert!(ctx.schema.find_table("EdFi", "Descriptor").is_some());

    let session = ctx.schema.find_table("EdFi", "Session").unwrap();
    let fk = session
        .foreign_keys
        .iter()
        .find(|fk| fk.foreign_table_id == "TermDescriptor")
        .unwrap();
    assert_eq!(pairs(fk), vec![("TermDescriptorId", "TermDescriptorId")]);
    assert!(!session.get_column("TermDescriptorId").unwrap().is_nullable);
}
