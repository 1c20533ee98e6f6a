//! Group 1 passes: schema containers, property names and table names

use anyhow::Result;
use tracing::debug;

use super::{CompileContext, EnhancerResult};
use crate::database::RelationalSchema;
use crate::model::EntityKind;
use crate::util::{full_property_name, strip_suffix};

pub const REPOSITORY_SETUP: &str = "NamespaceRepositoryEnhancer";
pub const PROPERTY_NAMING: &str = "PropertyNamingEnhancer";
pub const TABLE_NAMING: &str = "EntityTableNameEnhancer";

/// Create one empty schema container per namespace
pub fn initialize_repository(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    ctx.schema = RelationalSchema::for_model(&ctx.model);
    debug!("Initialized {} namespace schemas", ctx.schema.namespaces.len());
    Ok(EnhancerResult::success(REPOSITORY_SETUP))
}

/// Context prefix for columns derived through a property:
/// shorten-to, else a role name that differs from the name, else nothing.
pub fn context_prefix(role_name: &str, name: &str, shorten_to: &str) -> String {
    if !shorten_to.is_empty() {
        shorten_to.to_string()
    } else if role_name != name {
        role_name.to_string()
    } else {
        String::new()
    }
}

/// Assign full names, context prefixes and initial identity membership
pub fn name_properties(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(PROPERTY_NAMING));
    }

    for property in ctx.model.properties.iter_mut() {
        let relational = &mut property.relational;
        relational.full_name = full_property_name(&property.role_name, &property.name);
        relational.context_prefix =
            context_prefix(&property.role_name, &property.name, &property.shorten_to);
        relational.is_identity = property.is_part_of_identity;
    }
    Ok(EnhancerResult::success(PROPERTY_NAMING))
}

/// Main table id for every entity
pub fn name_tables(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(TABLE_NAMING));
    }

    let table_ids: Vec<String> = ctx
        .model
        .entities
        .iter()
        .map(|entity| match entity.kind {
            EntityKind::Descriptor => {
                format!("{}Descriptor", strip_suffix(&entity.name, "Descriptor"))
            }
            EntityKind::Enumeration => format!("{}Type", strip_suffix(&entity.name, "Type")),
            EntityKind::SchoolYearEnumeration => "SchoolYearType".to_string(),
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension => {
                let base_name = entity
                    .base_entity
                    .map(|base| ctx.model.entity(base).name.as_str())
                    .unwrap_or(entity.name.as_str());
                format!("{}Extension", base_name)
            }
            _ => entity.name.clone(),
        })
        .collect();

    for (entity, table_id) in ctx.model.entities.iter_mut().zip(table_ids) {
        entity.relational.table_id = table_id;
    }
    Ok(EnhancerResult::success(TABLE_NAMING))
}
