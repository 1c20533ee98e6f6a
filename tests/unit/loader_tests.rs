//! Model document loading tests

use std::fs;

use pretty_assertions::assert_eq;
use rust_relschema::model::{load_model, load_model_from_str, EntityKind, PropertyKind};
use rust_relschema::SchemaError;
use tempfile::TempDir;

fn namespace_document(name: &str, entity: &str) -> String {
    format!(
        r#"{{ "namespaces": [ {{ "name": "{}", "entities": [
            {{ "kind": "domainEntity", "name": "{}", "properties": [
                {{ "kind": "integer", "name": "{}Id", "cardinality": "identity" }} ] }}
        ] }} ] }}"#,
        name, entity, entity
    )
}

#[test]
fn test_documents_for_one_namespace_are_merged() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.json");
    let second = dir.path().join("b.json");
    fs::write(&first, namespace_document("EdFi", "School")).unwrap();
    fs::write(&second, namespace_document("EdFi", "Student")).unwrap();

    let model = load_model(&[first, second]).unwrap();
    assert_eq!(model.namespaces.len(), 1);
    let ns = model.namespace_by_name("EdFi").unwrap();
    let names: Vec<&str> = model
        .namespace(ns)
        .entities
        .iter()
        .map(|e| model.entity(*e).name.as_str())
        .collect();
    assert_eq!(names, vec!["School", "Student"]);
}

#[test]
fn test_many_documents_load_in_file_order() {
    let dir = TempDir::new().unwrap();
    let files: Vec<_> = (0..12)
        .map(|i| {
            let path = dir.path().join(format!("entity{:02}.json", i));
            fs::write(&path, namespace_document("EdFi", &format!("Entity{:02}", i))).unwrap();
            path
        })
        .collect();

    let model = load_model(&files).unwrap();
    let names: Vec<String> = model.entities.iter().map(|e| e.name.clone()).collect();
    let expected: Vec<String> = (0..12).map(|i| format!("Entity{:02}", i)).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_windows_1252_document_is_decoded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.json");
    let mut bytes = br#"{ "namespaces": [ { "name": "EdFi", "entities": [
        { "kind": "enumeration", "name": "AddressType", "enumerationItems": [
            { "shortDescription": "R"#
        .to_vec();
    // 0xE9 is an e with acute accent in Windows-1252 and invalid UTF-8 on its own
    bytes.push(0xE9);
    bytes.extend_from_slice(br#"sidence" } ] } ] } ] }"#);
    fs::write(&path, bytes).unwrap();

    let model = load_model(&[path]).unwrap();
    let items = &model.entities[0].enumeration_items;
    assert_eq!(items[0].short_description, "R\u{e9}sidence");
}

#[test]
fn test_byte_order_mark_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bom.json");
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(namespace_document("EdFi", "School").as_bytes());
    fs::write(&path, bytes).unwrap();

    let model = load_model(&[path]).unwrap();
    assert_eq!(model.entities.len(), 1);
}

#[test]
fn test_malformed_document_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"namespaces\": [").unwrap();

    let err = load_model(&[path.clone()]).unwrap_err();
    match err.downcast_ref::<SchemaError>() {
        Some(SchemaError::ModelParseError { path: reported, .. }) => assert_eq!(reported, &path),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_extension_entities_find_core_entities() {
    let json = r#"{ "namespaces": [
        { "name": "Sample", "isExtension": true, "dependencies": ["EdFi"], "entities": [
            { "kind": "domainEntityExtension", "name": "School", "baseEntity": "School", "properties": [
                { "kind": "string", "name": "Mascot", "cardinality": "optional", "maxLength": 50 } ] }
        ] },
        { "name": "EdFi", "entities": [
            { "kind": "domainEntity", "name": "School", "properties": [
                { "kind": "integer", "name": "SchoolId", "cardinality": "identity" } ] }
        ] }
    ] }"#;

    let model = load_model_from_str(json).unwrap();
    let extension = model
        .entities
        .iter()
        .find(|e| e.kind == EntityKind::DomainEntityExtension)
        .unwrap();
    let base = model.entity(extension.base_entity.unwrap());
    assert_eq!(base.kind, EntityKind::DomainEntity);
    assert_eq!(model.entity_namespace(base.id).name, "EdFi");

    let mascot = model.property(extension.properties[0]);
    assert_eq!(mascot.kind, PropertyKind::String);
    assert!(mascot.is_optional);
    assert_eq!(mascot.facets.max_length, Some(50));

    let order: Vec<&str> = model
        .dependency_order()
        .unwrap()
        .into_iter()
        .map(|ns| model.namespace(ns).name.as_str())
        .collect();
    assert_eq!(order, vec!["EdFi", "Sample"]);
}

#[test]
fn test_dependency_cycle_is_an_error() {
    let json = r#"{ "namespaces": [
        { "name": "A", "dependencies": ["B"] },
        { "name": "B", "dependencies": ["A"] }
    ] }"#;

    let model = load_model_from_str(json).unwrap();
    let err = model.dependency_order().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SchemaError>(),
        Some(SchemaError::NamespaceCycle { .. })
    ));
}

#[test]
fn test_unknown_dependency_is_unresolved() {
    let json = r#"{ "namespaces": [ { "name": "Sample", "dependencies": ["Missing"] } ] }"#;
    let err = load_model_from_str(json).unwrap_err();
    match err.downcast_ref::<SchemaError>() {
        Some(SchemaError::UnresolvedReference { kind, name, namespace }) => {
            assert_eq!(*kind, "namespace");
            assert_eq!(name, "Missing");
            assert_eq!(namespace, "Sample");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
