//! Write snapshot and manifest files

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use super::SchemaSnapshot;
use crate::error::SchemaError;

const PRODUCT_NAME: &str = "rust-relschema";
const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build provenance written beside the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub product_name: String,
    pub product_version: String,
    pub build_id: String,
    /// RFC 3339 UTC timestamp
    pub built_at: String,
    pub target_version: String,
    pub table_count: usize,
    pub snapshot_file: String,
    /// SHA-256 of the snapshot file bytes, lower-case hex
    pub checksum: String,
}

/// Paths written by [`write_output`]
#[derive(Debug, Clone)]
pub struct WrittenOutput {
    pub snapshot_path: PathBuf,
    pub manifest_path: PathBuf,
    pub checksum: String,
}

pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| {
        SchemaError::OutputWriteError {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}

/// Write `<name>.schema.json` and `<name>.manifest.json` into `output_dir`
pub fn write_output(snapshot: &SchemaSnapshot, name: &str, output_dir: &Path) -> Result<WrittenOutput> {
    fs::create_dir_all(output_dir).map_err(|e| SchemaError::OutputWriteError {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let snapshot_file = format!("{}.schema.json", name);
    let snapshot_path = output_dir.join(&snapshot_file);
    let snapshot_bytes = serde_json::to_vec_pretty(snapshot)?;
    write_file(&snapshot_path, &snapshot_bytes)?;

    let checksum = checksum(&snapshot_bytes);
    let manifest = Manifest {
        product_name: PRODUCT_NAME.to_string(),
        product_version: PRODUCT_VERSION.to_string(),
        build_id: uuid::Uuid::new_v4().to_string(),
        built_at: chrono::Utc::now().to_rfc3339(),
        target_version: snapshot.target_version.clone(),
        table_count: snapshot.table_count(),
        snapshot_file,
        checksum: checksum.clone(),
    };
    let manifest_path = output_dir.join(format!("{}.manifest.json", name));
    write_file(&manifest_path, &serde_json::to_vec_pretty(&manifest)?)?;

    info!(
        "Wrote {} tables to {}",
        manifest.table_count,
        snapshot_path.display()
    );
    Ok(WrittenOutput {
        snapshot_path,
        manifest_path,
        checksum,
    })
}

pub fn read_snapshot(path: &Path) -> Result<SchemaSnapshot> {
    let content = fs::read_to_string(path).map_err(|e| SchemaError::SnapshotReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let snapshot = serde_json::from_str(&content).map_err(|e| SchemaError::SnapshotParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(snapshot)
}
