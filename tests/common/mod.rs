//! Common test utilities for rust-relschema tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rust_relschema::enhancer::{compile, CompileContext};
use rust_relschema::model::{Entity, EntityId, EntityKind, MetaModel, NamespaceId, Property, PropertyKind};
use rust_relschema::output::{read_snapshot, SchemaSnapshot, TableSnapshot};
use semver::Version;
use tempfile::TempDir;

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub project_dir: PathBuf,
}

impl TestContext {
    /// Create a new test context by copying a fixture to a temp directory
    pub fn with_fixture(fixture_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(fixture_name);

        let project_dir = temp_dir.path().to_path_buf();
        copy_dir_recursive(&fixture_path, &project_dir).expect("Failed to copy fixture");

        Self {
            _temp_dir: temp_dir,
            project_dir,
        }
    }

    /// Get the path to the relschema.json file
    pub fn project_path(&self) -> PathBuf {
        self.project_dir.join("relschema.json")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.project_dir.join("out")
    }

    /// Build the project using the library
    pub fn build_with_version(&self, target_version: Option<&str>) -> BuildResult {
        match rust_relschema::build_schema(rust_relschema::BuildOptions {
            project_path: self.project_path(),
            output_dir: None,
            target_version: target_version.map(str::to_string),
            verbose: false,
        }) {
            Ok(written) => BuildResult {
                success: true,
                snapshot_path: Some(written.snapshot_path),
                manifest_path: Some(written.manifest_path),
                errors: vec![],
            },
            Err(e) => BuildResult {
                success: false,
                snapshot_path: None,
                manifest_path: None,
                errors: vec![format!("{:#}", e)],
            },
        }
    }

    pub fn build(&self) -> BuildResult {
        self.build_with_version(None)
    }

    /// Build the project and load the snapshot, panicking if the build fails.
    pub fn build_successfully(&self, target_version: Option<&str>) -> SchemaSnapshot {
        let result = self.build_with_version(target_version);
        assert!(result.success, "Build failed: {:?}", result.errors);
        let path = result.snapshot_path.expect("Snapshot path should be set");
        read_snapshot(&path).expect("Snapshot should parse")
    }
}

/// Result of a build operation
pub struct BuildResult {
    pub success: bool,
    pub snapshot_path: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub errors: Vec<String>,
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// Look up a table, panicking with the known table ids when it is missing
pub fn table<'a>(snapshot: &'a SchemaSnapshot, schema: &str, table_id: &str) -> &'a TableSnapshot {
    snapshot.find_table(schema, table_id).unwrap_or_else(|| {
        let known: Vec<String> = snapshot
            .namespaces
            .iter()
            .flat_map(|ns| ns.tables.iter().map(|t| format!("{}.{}", t.schema, t.table_id)))
            .collect();
        panic!("No table {}.{} in {:?}", schema, table_id, known)
    })
}

pub fn column_ids(table: &TableSnapshot) -> Vec<&str> {
    table.columns.iter().map(|c| c.column_id.as_str()).collect()
}

// ============================================================================
// Model builders
// ============================================================================

/// A model with a single core namespace
pub fn core_model() -> (MetaModel, NamespaceId) {
    let mut model = MetaModel::new();
    let ns = model.add_namespace("EdFi", false);
    (model, ns)
}

/// A domain entity identified by one integer property
pub fn keyed_entity(model: &mut MetaModel, ns: NamespaceId, name: &str, key: &str) -> EntityId {
    let entity = model.add_entity(ns, Entity::new(EntityKind::DomainEntity, name));
    model.add_property(entity, Property::new(PropertyKind::Integer, key).identity());
    entity
}

/// An identity reference from `from` to `to`, named after the target
pub fn identity_reference(model: &mut MetaModel, from: EntityId, to: EntityId) {
    let name = model.entity(to).name.clone();
    model.add_property(from, Property::new(PropertyKind::Reference, name).identity().references(to));
}

pub fn compile_model(model: MetaModel, version: &str) -> CompileContext {
    let version = Version::parse(version).expect("valid version");
    compile(model, version).expect("compile should succeed").0
}
