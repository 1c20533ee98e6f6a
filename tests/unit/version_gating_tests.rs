//! Version-gated passes at the edges of their ranges

use pretty_assertions::assert_eq;
use rust_relschema::enhancer::{compile, enhancer_list, marker_columns, post, usi};
use rust_relschema::model::{Entity, EntityKind, MetaModel, Property, PropertyKind};
use rust_relschema::version::parse_version;
use semver::Version;

use crate::common::{core_model, identity_reference, keyed_entity};

/// (pass, last version outside the range, first version inside it, range opens upward)
const GATES: &[(&str, &str, &str, bool)] = &[
    (marker_columns::OWNERSHIP_TOKEN, "7.0.9", "7.1.0", true),
    (usi::ENHANCER_NAME, "3.0.9", "3.1.0", true),
    (marker_columns::ED_ORG_ID_INDEX, "6.9.9", "7.0.0", true),
    // Reverse indexes apply below 7.0.0
    (post::REVERSE_INDEX, "7.0.0", "6.9.9", false),
];

#[test]
fn test_gates_flip_at_range_boundary() {
    let list = enhancer_list();
    for (name, outside, inside, _) in GATES {
        let enhancer = list
            .iter()
            .find(|e| e.name == *name)
            .unwrap_or_else(|| panic!("{} is not registered", name));
        assert!(enhancer.applicable_range.is_some(), "{} should be gated", name);
        assert!(
            !enhancer.applies_to(&parse_version(outside).unwrap()),
            "{} should not apply at {}",
            name,
            outside
        );
        assert!(
            enhancer.applies_to(&parse_version(inside).unwrap()),
            "{} should apply at {}",
            name,
            inside
        );
    }
}

#[test]
fn test_gates_hold_one_patch_further_in() {
    let list = enhancer_list();
    for (name, _, inside, upward) in GATES {
        let enhancer = list.iter().find(|e| e.name == *name).unwrap();
        let v = parse_version(inside).unwrap();
        let further = if *upward {
            Version::new(v.major, v.minor, v.patch + 1)
        } else {
            Version::new(6, 9, 8)
        };
        assert!(enhancer.applies_to(&further), "{} should apply at {}", name, further);
    }
}

#[test]
fn test_ungated_passes_run_everywhere() {
    let gated: Vec<&str> = GATES.iter().map(|g| g.0).collect();
    for enhancer in enhancer_list().iter().filter(|e| !gated.contains(&e.name)) {
        assert!(enhancer.applicable_range.is_none(), "{} is unexpectedly gated", enhancer.name);
    }
}

fn student_model() -> MetaModel {
    let (mut model, ns) = core_model();
    let student = model.add_entity(ns, Entity::new(EntityKind::DomainEntity, "Student"));
    model.add_property(
        student,
        Property::new(PropertyKind::String, "UniqueId")
            .identity()
            .with_role_name("Student")
            .with_max_length(32),
    );
    model
}

#[test]
fn test_usi_replaces_unique_id_from_3_1() {
    let (ctx, _) = compile(student_model(), Version::new(3, 0, 9)).unwrap();
    let table = ctx.schema.find_table("EdFi", "Student").unwrap();
    assert_eq!(table.primary_key_ids(), vec!["StudentUniqueId"]);

    let (ctx, _) = compile(student_model(), Version::new(3, 1, 0)).unwrap();
    let table = ctx.schema.find_table("EdFi", "Student").unwrap();
    assert_eq!(table.primary_key_ids(), vec!["StudentUSI"]);
    let usi = table.get_column("StudentUSI").unwrap();
    assert!(usi.is_identity_database_type);
    assert_eq!(usi.data_type, rust_relschema::database::ColumnDataType::Integer);
    let unique_id = table.get_column("StudentUniqueId").unwrap();
    assert!(unique_id.is_unique_index);
    assert!(!unique_id.is_part_of_primary_key);
}

/// Session(SchoolId, SessionName) references School(SchoolId)
fn session_model() -> MetaModel {
    let (mut model, ns) = core_model();
    let school = keyed_entity(&mut model, ns, "School", "SchoolId");
    let session = model.add_entity(ns, Entity::new(EntityKind::DomainEntity, "Session"));
    identity_reference(&mut model, session, school);
    model.add_property(
        session,
        Property::new(PropertyKind::String, "SessionName").identity().with_max_length(60),
    );
    model
}

#[test]
fn test_reverse_index_only_before_7_0() {
    let reverse = |version: Version| {
        let (ctx, _) = compile(session_model(), version).unwrap();
        let table = ctx.schema.find_table("EdFi", "Session").unwrap();
        assert_eq!(table.foreign_keys.len(), 1);
        table.foreign_keys[0].with_reverse_foreign_key_index
    };

    assert!(reverse(Version::new(6, 9, 9)));
    assert!(!reverse(Version::new(7, 0, 0)));
}

#[test]
fn test_ownership_token_only_from_7_1() {
    let has_token = |version: Version| {
        let (ctx, _) = compile(session_model(), version).unwrap();
        let table = ctx.schema.find_table("EdFi", "Session").unwrap();
        (
            table.has_ownership_token_column,
            table.get_column(marker_columns::OWNERSHIP_TOKEN_COLUMN).is_some(),
        )
    };

    assert_eq!(has_token(Version::new(7, 0, 9)), (false, false));
    assert_eq!(has_token(Version::new(7, 1, 0)), (true, true));
}

#[test]
fn test_skipped_passes_are_reported() {
    let (_, report) = compile(session_model(), Version::new(6, 1, 0)).unwrap();
    assert!(report.skipped.contains(&marker_columns::OWNERSHIP_TOKEN));
    assert!(report.skipped.contains(&marker_columns::ED_ORG_ID_INDEX));
    assert!(!report.skipped.contains(&post::REVERSE_INDEX));
    assert!(report.is_complete());
}
