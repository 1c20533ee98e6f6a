//! Target technology version handling
//!
//! Passes are gated on the version of the downstream product the schema is
//! generated for. Ranges are written the way model authors write them
//! (`"3.3+"`, `">=7.1.0"`, `"<=6.1.0"`, `"7.0.0"`, `"2.x"`) and normalized into
//! `semver::VersionReq` before matching.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use semver::{Version, VersionReq};
use tracing::warn;

use crate::error::SchemaError;

/// Version used when neither the command line nor the project names one
pub const DEFAULT_TECHNOLOGY_VERSION: &str = "7.1.0";

/// `3.3+` style open ranges
static PLUS_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+){0,2})\+$").expect("valid regex"));

/// Bare version numbers with one to three components
static BARE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+){0,2}$").expect("valid regex"));

/// Comparator with its operator separated from the version by whitespace, e.g. `>= 7.0.0`
static SPACED_OPERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(>=|<=|>|<|=)\s+").expect("valid regex"));

/// Pad a version string to three components, e.g. `7.1` -> `7.1.0`.
fn pad_version(version: &str) -> String {
    let parts = version.split('.').count();
    match parts {
        1 => format!("{}.0.0", version),
        2 => format!("{}.0", version),
        _ => version.to_string(),
    }
}

/// Parse a target technology version, accepting one to three numeric components.
pub fn parse_version(version: &str) -> Result<Version> {
    let trimmed = version.trim();
    let candidate = if BARE_VERSION.is_match(trimmed) {
        pad_version(trimmed)
    } else {
        trimmed.to_string()
    };

    Version::parse(&candidate).map_err(|e| {
        SchemaError::InvalidVersion {
            version: version.to_string(),
            source: e,
        }
        .into()
    })
}

/// Normalize a model-author range into a `VersionReq`.
pub fn parse_range(range: &str) -> Result<VersionReq> {
    let trimmed = range.trim();

    let normalized = if let Some(caps) = PLUS_RANGE.captures(trimmed) {
        format!(">={}", pad_version(&caps[1]))
    } else if BARE_VERSION.is_match(trimmed) && trimmed.split('.').count() == 3 {
        // An exact version means exactly that version, not semver's caret default
        format!("={}", trimmed)
    } else {
        let joined = SPACED_OPERATOR.replace_all(trimmed, "$1");
        joined
            .split_whitespace()
            .map(|comparator| comparator.replace(".x", ".*").replace(".X", ".*"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    VersionReq::parse(&normalized).map_err(|_| {
        SchemaError::InvalidVersionRange {
            range: range.to_string(),
        }
        .into()
    })
}

/// Test a version against a range. An unparseable range never matches.
pub fn version_satisfies(version: &Version, range: &str) -> bool {
    match parse_range(range) {
        Ok(req) => req.matches(version),
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}

/// Resolve the target technology version for a compilation.
///
/// Precedence: explicit target, then the per-namespace fallback for the core
/// namespace, then the project-wide default.
pub fn resolve_target_version(
    explicit: Option<&str>,
    namespace_fallback: Option<&str>,
    default_version: Option<&str>,
) -> Result<Version> {
    let chosen = explicit
        .or(namespace_fallback)
        .or(default_version)
        .unwrap_or(DEFAULT_TECHNOLOGY_VERSION);
    parse_version(chosen)
}
