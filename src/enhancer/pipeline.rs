//! Pipeline executor
//!
//! Runs the registered passes group by group, in registration order within a
//! group. Version-gated passes are checked once here against their declared
//! applicability range instead of inside each pass.

use std::fmt;

use anyhow::Result;
use semver::Version;
use tracing::{debug, info, warn};

use super::{enhancer_list, CompileContext};
use crate::error::SchemaError;
use crate::model::MetaModel;
use crate::version::version_satisfies;

/// Signature every pass implements
pub type EnhanceFn = fn(&mut CompileContext) -> Result<EnhancerResult>;

/// Ordered pass groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnhancerGroup {
    Setup,
    PropertyEnhancement,
    TableCreation,
    ForeignKeyCreation,
    RowPopulation,
    PostCreation,
}

impl EnhancerGroup {
    pub const ALL: [EnhancerGroup; 6] = [
        EnhancerGroup::Setup,
        EnhancerGroup::PropertyEnhancement,
        EnhancerGroup::TableCreation,
        EnhancerGroup::ForeignKeyCreation,
        EnhancerGroup::RowPopulation,
        EnhancerGroup::PostCreation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnhancerGroup::Setup => "setup",
            EnhancerGroup::PropertyEnhancement => "property enhancement",
            EnhancerGroup::TableCreation => "table creation",
            EnhancerGroup::ForeignKeyCreation => "foreign key creation",
            EnhancerGroup::RowPopulation => "row population",
            EnhancerGroup::PostCreation => "post creation",
        }
    }

    /// A soft failure in these groups stops the whole pipeline
    pub fn is_foundational(&self) -> bool {
        matches!(self, EnhancerGroup::Setup | EnhancerGroup::PropertyEnhancement)
    }
}

impl fmt::Display for EnhancerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancerResult {
    pub enhancer_name: &'static str,
    pub success: bool,
}

impl EnhancerResult {
    pub fn success(enhancer_name: &'static str) -> Self {
        Self {
            enhancer_name,
            success: true,
        }
    }

    pub fn failure(enhancer_name: &'static str) -> Self {
        Self {
            enhancer_name,
            success: false,
        }
    }
}

/// A registered pass
#[derive(Debug, Clone, Copy)]
pub struct Enhancer {
    pub name: &'static str,
    pub group: EnhancerGroup,
    /// Target versions the pass applies to; `None` applies everywhere
    pub applicable_range: Option<&'static str>,
    pub enhance: EnhanceFn,
}

impl Enhancer {
    pub const fn new(name: &'static str, group: EnhancerGroup, enhance: EnhanceFn) -> Self {
        Self {
            name,
            group,
            applicable_range: None,
            enhance,
        }
    }

    pub const fn gated(mut self, range: &'static str) -> Self {
        self.applicable_range = Some(range);
        self
    }

    pub fn applies_to(&self, version: &Version) -> bool {
        self.applicable_range
            .map_or(true, |range| version_satisfies(version, range))
    }
}

/// What happened during a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// One entry per registered pass that was reached, in execution order
    pub results: Vec<EnhancerResult>,
    /// Passes skipped because the target version is outside their range
    pub skipped: Vec<&'static str>,
    /// Non-foundational groups cut short by a soft failure
    pub halted_groups: Vec<EnhancerGroup>,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.halted_groups.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &EnhancerResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Run `enhancers` over the context exactly once.
///
/// Errors from a pass abort immediately. A pass reporting `success: false`
/// halts the rest of its group; in a foundational group that is fatal.
pub fn run_pipeline(ctx: &mut CompileContext, enhancers: &[Enhancer]) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();

    for group in EnhancerGroup::ALL {
        let passes: Vec<&Enhancer> = enhancers.iter().filter(|e| e.group == group).collect();
        if passes.is_empty() {
            continue;
        }
        info!("Running {} group ({} passes)", group, passes.len());

        for enhancer in passes {
            if !enhancer.applies_to(&ctx.target_version) {
                debug!(
                    "Skipping {}: target version {} outside {}",
                    enhancer.name,
                    ctx.target_version,
                    enhancer.applicable_range.unwrap_or_default()
                );
                report.skipped.push(enhancer.name);
                report.results.push(EnhancerResult::success(enhancer.name));
                continue;
            }

            debug!("Running {}", enhancer.name);
            let result = (enhancer.enhance)(ctx)?;
            let success = result.success;
            report.results.push(result);

            if !success {
                if group.is_foundational() {
                    return Err(SchemaError::PassFailed {
                        enhancer: enhancer.name,
                        group: group.name(),
                    }
                    .into());
                }
                warn!(
                    "{} reported failure, skipping the rest of the {} group",
                    enhancer.name, group
                );
                report.halted_groups.push(group);
                break;
            }
        }
    }

    Ok(report)
}

/// Derive the relational schema for `model` at `target_version` with the standard passes
pub fn compile(model: MetaModel, target_version: Version) -> Result<(CompileContext, PipelineReport)> {
    info!(
        "Compiling {} entities in {} namespaces for target version {}",
        model.entities.len(),
        model.namespaces.len(),
        target_version
    );
    let mut ctx = CompileContext::new(model, target_version);
    let report = run_pipeline(&mut ctx, &enhancer_list())?;
    info!("Derived {} tables", ctx.schema.table_count());
    Ok((ctx, report))
}

/// Run the standard passes up to and including the `last` group
pub fn compile_through(
    model: MetaModel,
    target_version: Version,
    last: EnhancerGroup,
) -> Result<(CompileContext, PipelineReport)> {
    let enhancers: Vec<Enhancer> = enhancer_list()
        .into_iter()
        .filter(|e| e.group <= last)
        .collect();
    let mut ctx = CompileContext::new(model, target_version);
    let report = run_pipeline(&mut ctx, &enhancers)?;
    Ok((ctx, report))
}
