//! Post-creation passes over the finished table set

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::debug;

use super::{CompileContext, EnhancerResult};
use crate::error::SchemaError;
use crate::model::EntityKind;

pub const FOREIGN_TABLE_RESOLUTION: &str = "ForeignKeyForeignTableEnhancer";
pub const IDENTIFYING_FOREIGN_KEY: &str = "IdentifyingForeignKeyEnhancer";
pub const REVERSE_INDEX: &str = "ReverseForeignKeyIndexEnhancer";
pub const DISCRIMINATOR: &str = "DiscriminatorColumnEnhancer";
pub const DEPRECATION: &str = "DeprecatedTableEnhancer";
pub const FOREIGN_KEY_NAMING: &str = "ForeignKeyNamingEnhancer";

/// Every foreign key must point at an existing table; record the table's schema
pub fn resolve_foreign_tables(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(FOREIGN_TABLE_RESOLUTION));
    }

    let known: HashMap<(String, String), String> = ctx
        .schema
        .namespaces
        .iter()
        .flat_map(|ns| ns.tables())
        .map(|t| ((t.namespace.clone(), t.table_id.clone()), t.schema.clone()))
        .collect();

    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut() {
            for foreign_key in &mut table.foreign_keys {
                let key = (
                    foreign_key.foreign_table_namespace.clone(),
                    foreign_key.foreign_table_id.clone(),
                );
                let Some(schema) = known.get(&key) else {
                    return Err(SchemaError::ForeignTableNotFound {
                        namespace: key.0,
                        table: key.1,
                        parent_schema: table.schema.clone(),
                        parent_table: table.table_id.clone(),
                    }
                    .into());
                };
                foreign_key.foreign_table_schema = schema.clone();
            }
        }
    }
    Ok(EnhancerResult::success(FOREIGN_TABLE_RESOLUTION))
}

pub fn flag_identifying_foreign_keys(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(IDENTIFYING_FOREIGN_KEY));
    }

    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut() {
            let keys: HashSet<String> = table.primary_key_ids().into_iter().collect();
            for foreign_key in &mut table.foreign_keys {
                foreign_key.source_reference.is_identifying = foreign_key
                    .column_pairs
                    .iter()
                    .all(|pair| keys.contains(&pair.parent_table_column_id));
            }
        }
    }
    Ok(EnhancerResult::success(IDENTIFYING_FOREIGN_KEY))
}

/// Pre-7.0 layouts index foreign keys whose columns are not exactly the primary key
pub fn flag_reverse_indexes(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(REVERSE_INDEX));
    }

    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut() {
            let keys: HashSet<String> = table.primary_key_ids().into_iter().collect();
            for foreign_key in &mut table.foreign_keys {
                let columns: HashSet<String> = foreign_key
                    .parent_column_ids()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                foreign_key.with_reverse_foreign_key_index = columns != keys;
            }
        }
    }
    Ok(EnhancerResult::success(REVERSE_INDEX))
}

pub fn flag_discriminators(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(DISCRIMINATOR));
    }

    let model = &ctx.model;
    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut() {
            let Some(entity) = table.parent_entity else {
                continue;
            };
            table.has_discriminator_column = table.is_aggregate_root_table
                && matches!(
                    model.entity(entity).kind,
                    EntityKind::DomainEntity | EntityKind::Association
                );
        }
    }
    Ok(EnhancerResult::success(DISCRIMINATOR))
}

/// Copy entity deprecation to all of its tables and collection deprecation to the child table
pub fn flag_deprecations(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(DEPRECATION));
    }

    let model = &ctx.model;
    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut() {
            let mut reasons: Vec<String> = Vec::new();
            if let Some(entity) = table.parent_entity.map(|e| model.entity(e)) {
                if entity.is_deprecated {
                    reasons.push(entity.deprecation_reason.clone().unwrap_or_default());
                }
            }
            if let Some(property) = table.source_property.map(|p| model.property(p)) {
                if property.is_deprecated && property.is_collection() {
                    reasons.push(property.deprecation_reason.clone().unwrap_or_default());
                }
            }
            if reasons.is_empty() {
                continue;
            }

            debug!("Table {}.{} is deprecated", table.schema, table.table_id);
            table.is_deprecated = true;
            for reason in reasons {
                if !reason.is_empty() && !table.deprecation_reasons.contains(&reason) {
                    table.deprecation_reasons.push(reason);
                }
            }
        }
    }
    Ok(EnhancerResult::success(DEPRECATION))
}

/// `FK_{table}_{foreignTable}`, numbered from `_2` when a table repeats a foreign table
pub fn name_foreign_keys(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(FOREIGN_KEY_NAMING));
    }

    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut() {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for foreign_key in &mut table.foreign_keys {
                let base = format!("FK_{}_{}", table.table_id, foreign_key.foreign_table_id);
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                foreign_key.name = if *count == 1 {
                    base
                } else {
                    format!("{}_{}", base, count)
                };
            }
        }
    }
    Ok(EnhancerResult::success(FOREIGN_KEY_NAMING))
}
