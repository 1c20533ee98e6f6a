//! Seed rows for enumeration and school year lookup tables

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{CompileContext, EnhancerResult};
use crate::database::{EnumerationRow, SchoolYearEnumerationRow};
use crate::model::EntityKind;

pub const ENUMERATION_ROWS: &str = "EnumerationRowEnhancer";
pub const SCHOOL_YEAR_ROWS: &str = "SchoolYearEnumerationRowEnhancer";

/// Trailing four-digit year of a school year description, e.g. `2022-2023` -> 2023
static TRAILING_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})\s*$").expect("valid regex"));

pub fn school_year_from_description(description: &str) -> Option<i32> {
    TRAILING_YEAR
        .captures(description)
        .and_then(|caps| caps[1].parse().ok())
}

pub fn enhance_enumeration_rows(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(ENUMERATION_ROWS));
    }

    for entity in ctx.entities_of_kind(EntityKind::Enumeration)? {
        let e = ctx.model.entity(entity);
        let schema = ctx.schema.namespace_mut(e.namespace);
        for item in &e.enumeration_items {
            let row = EnumerationRow {
                name: e.relational.table_id.clone(),
                namespace: schema.namespace.clone(),
                schema: schema.schema.clone(),
                code_value: String::new(),
                description: item.short_description.clone(),
                short_description: item.short_description.clone(),
            };
            schema.add_enumeration_row(row);
        }
        debug!("{} rows for {}", e.enumeration_items.len(), e.relational.table_id);
    }
    Ok(EnhancerResult::success(ENUMERATION_ROWS))
}

pub fn enhance_school_year_rows(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(SCHOOL_YEAR_ROWS));
    }

    for entity in ctx.entities_of_kind(EntityKind::SchoolYearEnumeration)? {
        let e = ctx.model.entity(entity);
        let schema = ctx.schema.namespace_mut(e.namespace);
        for item in &e.enumeration_items {
            let Some(school_year) = school_year_from_description(&item.short_description) else {
                warn!(
                    "No school year in description '{}' on {}",
                    item.short_description, e.name
                );
                continue;
            };
            let row = SchoolYearEnumerationRow {
                name: e.relational.table_id.clone(),
                namespace: schema.namespace.clone(),
                schema: schema.schema.clone(),
                school_year,
                description: item.short_description.clone(),
                current_school_year: false,
            };
            schema.add_school_year_row(row);
        }
    }
    Ok(EnhancerResult::success(SCHOOL_YEAR_ROWS))
}
