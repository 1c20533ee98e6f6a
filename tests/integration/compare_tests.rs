//! Snapshot comparison integration tests

use std::path::PathBuf;
use std::process::Command;

use pretty_assertions::assert_eq;
use rust_relschema::compare::compare_snapshots;
use rust_relschema::compare::types::TableKey;

use crate::common::TestContext;

fn build_to(ctx: &TestContext, version: Option<&str>) -> PathBuf {
    let result = ctx.build_with_version(version);
    assert!(result.success, "Build failed: {:?}", result.errors);
    result.snapshot_path.unwrap()
}

/// Build the same project into two separate snapshot files
fn two_builds(baseline_version: Option<&str>, candidate_version: Option<&str>) -> (TestContext, TestContext, PathBuf, PathBuf) {
    let baseline_ctx = TestContext::with_fixture("school_core");
    let candidate_ctx = TestContext::with_fixture("school_core");
    let baseline = build_to(&baseline_ctx, baseline_version);
    let candidate = build_to(&candidate_ctx, candidate_version);
    (baseline_ctx, candidate_ctx, baseline, candidate)
}

#[test]
fn test_identical_builds_have_no_differences() {
    let (_a, _b, baseline, candidate) = two_builds(None, None);
    let result = compare_snapshots(&baseline, &candidate).unwrap();

    assert!(!result.has_differences(), "{:?}", result);
    assert_eq!(result.total_baseline, 14);
    assert_eq!(result.total_candidate, 14);
}

#[test]
fn test_version_change_is_reported() {
    let (_a, _b, baseline, candidate) = two_builds(None, Some("7.1.0"));
    let result = compare_snapshots(&baseline, &candidate).unwrap();

    assert!(result.has_differences());
    assert_eq!(
        result.version_difference,
        Some(("7.0.0".to_string(), "7.1.0".to_string()))
    );
    assert!(result.missing_in_candidate.is_empty());
    assert!(result.extra_in_candidate.is_empty());

    let student = result
        .differences
        .iter()
        .find(|(key, _)| *key == TableKey::new("edfi", "Student"))
        .map(|(_, lines)| lines)
        .unwrap();
    assert!(student.contains(&"column CreatedByOwnershipTokenId extra in candidate".to_string()));
    assert!(student.contains(&"hasOwnershipTokenColumn: false -> true".to_string()));
}

#[test]
fn test_compare_missing_file_fails() {
    let ctx = TestContext::with_fixture("school_core");
    let baseline = build_to(&ctx, None);
    let err = compare_snapshots(&baseline, &ctx.project_dir.join("nope.schema.json")).unwrap_err();
    assert!(err.to_string().contains("nope.schema.json"));
}

#[test]
fn test_cli_build_and_compare_exit_codes() {
    let binary = env!("CARGO_BIN_EXE_rust-relschema");
    let ctx = TestContext::with_fixture("school_core");

    let build = |version: &str, output: &str| {
        let out = Command::new(binary)
            .arg("build")
            .arg("--project")
            .arg(ctx.project_path())
            .arg("--output")
            .arg(ctx.project_dir.join(output))
            .arg("--target-version")
            .arg(version)
            .output()
            .unwrap();
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        PathBuf::from(String::from_utf8_lossy(&out.stdout).trim())
    };
    let v70 = build("7.0.0", "v70");
    let v70_again = build("7.0.0", "v70_again");
    let v71 = build("7.1.0", "v71");

    let compare = |a: &PathBuf, b: &PathBuf| {
        Command::new(binary)
            .arg("compare")
            .arg(a)
            .arg(b)
            .output()
            .unwrap()
    };
    let same = compare(&v70, &v70_again);
    assert_eq!(same.status.code(), Some(0));
    let different = compare(&v70, &v71);
    assert_eq!(different.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&different.stdout).contains("Schema Comparison Report"));
}
