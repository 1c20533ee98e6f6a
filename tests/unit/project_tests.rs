//! Project file discovery tests

use std::fs;

use pretty_assertions::assert_eq;
use rust_relschema::project::parse_project;

use crate::common::TestContext;

#[test]
fn test_fixture_project_discovers_model_documents() {
    let ctx = TestContext::with_fixture("school_core");
    let project = parse_project(&ctx.project_path()).unwrap();

    assert_eq!(project.name, "SchoolCore");
    let files: Vec<String> = project
        .model_files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["edfi.json", "sample.json"]);
    assert_eq!(
        project.config.namespace_technology_versions.get("EdFi").map(String::as_str),
        Some("7.0.0")
    );
    assert_eq!(project.config.target_technology_version, None);
}

#[test]
fn test_previous_output_is_not_a_model_document() {
    let ctx = TestContext::with_fixture("school_core");
    let out = ctx.output_dir();
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("SchoolCore.schema.json"), "{}").unwrap();
    fs::write(ctx.project_dir.join("model").join("stale.manifest.json"), "{}").unwrap();

    let project = parse_project(&ctx.project_path()).unwrap();
    assert_eq!(project.model_files.len(), 2);
}
