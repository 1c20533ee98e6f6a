//! rust-relschema: relational schema derivation for declarative entity models
//!
//! This library reads a project's model documents, runs the ordered enhancer
//! pipeline that derives tables, columns, keys and seed rows for a target
//! technology version, and writes the result as a JSON schema snapshot.

pub mod compare;
pub mod database;
pub mod enhancer;
pub mod error;
pub mod model;
pub mod output;
pub mod project;
pub mod util;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use semver::Version;
use tracing::{info, warn};

pub use error::SchemaError;

/// Options for building a schema snapshot
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Path to the relschema.json project file
    pub project_path: PathBuf,
    /// Output directory (defaults to `out/` beside the project file)
    pub output_dir: Option<PathBuf>,
    /// Target technology version, overriding the project file
    pub target_version: Option<String>,
    /// Log every pass outcome, not just the summary
    pub verbose: bool,
}

/// Pick the target version for a project and its loaded model
fn target_version(
    options: &BuildOptions,
    config: &project::ProjectConfig,
    model: &model::MetaModel,
) -> Result<Version> {
    let core_fallback = model
        .core_namespace()
        .and_then(|ns| config.namespace_technology_versions.get(&model.namespace(ns).name))
        .map(String::as_str);
    version::resolve_target_version(
        options
            .target_version
            .as_deref()
            .or(config.target_technology_version.as_deref()),
        core_fallback,
        Some(&config.default_technology_version),
    )
}

/// A halted group leaves a partial schema, which is never written
fn ensure_complete(report: &enhancer::PipelineReport) -> Result<()> {
    if report.is_complete() {
        return Ok(());
    }
    for result in report.failures() {
        warn!("Enhancer {} failed", result.enhancer_name);
    }
    let groups = report
        .halted_groups
        .iter()
        .map(|group| group.name())
        .collect::<Vec<_>>()
        .join(", ");
    Err(SchemaError::PipelineIncomplete { groups }.into())
}

/// Build a schema snapshot from a project file
pub fn build_schema(options: BuildOptions) -> Result<output::WrittenOutput> {
    info!("Building project: {}", options.project_path.display());

    // Step 1: Parse the project file
    let project = project::parse_project(&options.project_path)?;
    info!("Found {} model documents", project.model_files.len());

    // Step 2: Load and link the model
    let model = model::load_model(&project.model_files)?;
    info!(
        "Loaded {} entities in {} namespaces",
        model.entities.len(),
        model.namespaces.len()
    );

    // Step 3: Derive the relational schema
    let version = target_version(&options, &project.config, &model)?;
    let (ctx, report) = enhancer::compile(model, version)?;
    if options.verbose {
        for result in &report.results {
            info!(
                "{}: {}",
                result.enhancer_name,
                if result.success { "ok" } else { "failed" }
            );
        }
    }
    ensure_complete(&report)?;

    // Step 4: Write the snapshot and manifest
    let output_dir = options
        .output_dir
        .unwrap_or_else(|| project.project_dir.join("out"));
    let snapshot = output::SchemaSnapshot::from_schema(&ctx.schema, &ctx.target_version);
    let written = output::write_output(&snapshot, &project.name, &output_dir)?;

    info!("Created schema snapshot: {}", written.snapshot_path.display());
    Ok(written)
}
