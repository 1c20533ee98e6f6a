//! Error types for rust-relschema

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while deriving a relational schema
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read project file: {path}")]
    ProjectReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse project file: {path}")]
    ProjectParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read model file: {path}")]
    ModelReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model file: {path}")]
    ModelParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unresolved {kind} '{name}' in namespace {namespace}")]
    UnresolvedReference {
        kind: &'static str,
        name: String,
        namespace: String,
    },

    #[error("Invalid target technology version: {version}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Invalid version range: {range}")]
    InvalidVersionRange { range: String },

    #[error("Circular namespace dependency detected: {chain}")]
    NamespaceCycle { chain: String },

    #[error(
        "Unable to find column on {schema}.{table} for property {property} matching foreign key column {foreign_schema}.{foreign_table}.{foreign_column}"
    )]
    ForeignKeyColumnNotFound {
        schema: String,
        table: String,
        property: String,
        foreign_schema: String,
        foreign_table: String,
        foreign_column: String,
    },

    #[error("Foreign table {namespace}.{table} referenced from {parent_schema}.{parent_table} does not exist")]
    ForeignTableNotFound {
        namespace: String,
        table: String,
        parent_schema: String,
        parent_table: String,
    },

    #[error("Enhancer {enhancer} failed in the {group} group")]
    PassFailed {
        enhancer: &'static str,
        group: &'static str,
    },

    #[error("Pipeline did not complete; halted groups: {groups}")]
    PipelineIncomplete { groups: String },

    #[error("Failed to write output to {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read schema snapshot: {path}")]
    SnapshotReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema snapshot: {path}")]
    SnapshotParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
