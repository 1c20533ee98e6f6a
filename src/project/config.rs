//! Parser for relschema.json project files

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use crate::error::SchemaError;
use crate::version::DEFAULT_TECHNOLOGY_VERSION;

/// Directories never searched for model documents
const SKIPPED_DIRECTORIES: &[&str] = &["bin", "obj", "out"];

fn default_technology_version() -> String {
    DEFAULT_TECHNOLOGY_VERSION.to_string()
}

/// Project file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub target_technology_version: Option<String>,
    #[serde(default = "default_technology_version")]
    pub default_technology_version: String,
    /// Glob patterns, relative to the project directory, of model documents
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Per-namespace version fallbacks
    #[serde(default)]
    pub namespace_technology_versions: HashMap<String, String>,
}

/// A loaded project
#[derive(Debug, Clone)]
pub struct SchemaProject {
    pub name: String,
    pub project_dir: PathBuf,
    pub config: ProjectConfig,
    /// Model documents in a stable order
    pub model_files: Vec<PathBuf>,
}

/// Parse a project file and discover its model documents
pub fn parse_project(path: &Path) -> Result<SchemaProject> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::ProjectReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: ProjectConfig = serde_json::from_str(&content).map_err(|e| SchemaError::ProjectParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let project_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let model_files = find_model_files(&config, &project_dir, path);
    debug!(
        "Project {} has {} model documents",
        config.name,
        model_files.len()
    );

    Ok(SchemaProject {
        name: config.name.clone(),
        project_dir,
        config,
        model_files,
    })
}

fn is_model_document(path: &Path, project_file: &Path) -> bool {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    path.extension().is_some_and(|ext| ext == "json")
        && path != project_file
        && !file_name.ends_with(".schema.json")
        && !file_name.ends_with(".manifest.json")
}

fn find_model_files(config: &ProjectConfig, project_dir: &Path, project_file: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    if config.include.is_empty() {
        // Default: every json document under the project directory
        let walker = walkdir::WalkDir::new(project_dir)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !SKIPPED_DIRECTORIES.contains(&&*e.file_name().to_string_lossy())
            })
            .filter_map(|e| e.ok());
        for entry in walker {
            if entry.file_type().is_file() && is_model_document(entry.path(), project_file) {
                files.push(entry.path().to_path_buf());
            }
        }
    } else {
        for pattern in &config.include {
            let glob_pattern = project_dir.join(pattern.replace('\\', "/"));
            let glob_str = glob_pattern.to_string_lossy();
            if let Ok(paths) = glob::glob(&glob_str) {
                for entry in paths.filter_map(|p| p.ok()) {
                    if is_model_document(&entry, project_file) && !files.contains(&entry) {
                        files.push(entry);
                    }
                }
            }
        }
    }

    if !config.exclude.is_empty() {
        let matchers: Vec<glob::Pattern> = config
            .exclude
            .iter()
            .filter_map(|pattern| {
                let glob_pattern = project_dir.join(pattern.replace('\\', "/"));
                glob::Pattern::new(&glob_pattern.to_string_lossy()).ok()
            })
            .collect();
        files.retain(|file| !matchers.iter().any(|m| m.matches_path(file)));
    }

    files.sort();
    files
}
