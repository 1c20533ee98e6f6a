//! Foreign key synthesis for reference properties
//!
//! Every non-weak reference property that built columns on a table gets one
//! foreign key to the referenced entity's main table, with one column pair per
//! foreign primary key column. Local columns are matched by shared provenance,
//! then by id, then by merged reference context, then by a single extra parent
//! context prefix. Anything still unmatched is resolved through the property's
//! merge directives or reported as a modeling error.

use anyhow::Result;
use tracing::{debug, warn};

use super::{CompileContext, EnhancerResult};
use crate::database::{Column, ColumnPair, ForeignKey, RelationalSchema, SourceReference, Table};
use crate::error::SchemaError;
use crate::model::{MergeDirective, MetaModel, NamespaceId, Property, PropertyId, PropertyKind};

pub const ENHANCER_NAME: &str = "ForeignKeyCreatingTableEnhancer";

/// Non-weak reference properties owned by the table, in order of first column appearance
pub fn reference_properties(model: &MetaModel, table: &Table) -> Vec<PropertyId> {
    let mut properties = Vec::new();
    for column in table.get_all_columns() {
        for source in &column.source_properties {
            if properties.contains(source) || !table.owned_properties.contains(source) {
                continue;
            }
            let p = model.property(*source);
            if p.kind == PropertyKind::Reference && !p.is_weak_reference {
                properties.push(*source);
            }
        }
    }
    properties
}

/// The candidate's name is the unprefixed name with exactly one leading parent context
fn differs_by_single_parent_context(unprefixed: &Column, candidate: &Column) -> bool {
    let components = &candidate.name_components;
    components.len() > 1
        && components[0].is_parent_property_context
        && components.len() == unprefixed.name_components.len() + 1
        && unprefixed
            .name_components
            .iter()
            .zip(&components[1..])
            .all(|(a, b)| a.name == b.name)
}

/// Match a foreign primary key column against the columns a property built
pub fn matching_column<'a>(foreign: &Column, columns: &[&'a Column]) -> Option<&'a Column> {
    let candidates: Vec<&'a Column> = columns
        .iter()
        .copied()
        .filter(|c| c.shares_source_property(foreign))
        .collect();
    if candidates.len() == 1 {
        return Some(candidates[0]);
    }

    candidates
        .iter()
        .find(|c| c.column_id == foreign.column_id)
        .or_else(|| {
            candidates
                .iter()
                .find(|c| c.merged_reference_contexts.contains(&foreign.reference_context))
        })
        .or_else(|| {
            candidates
                .iter()
                .find(|c| differs_by_single_parent_context(foreign, c))
        })
        .copied()
}

/// Properties a merge directive's target stands for on the foreign side
fn expanded_targets(model: &MetaModel, schema: &RelationalSchema, directive: &MergeDirective) -> Vec<PropertyId> {
    let target = model.property(directive.target_property);
    if target.kind != PropertyKind::Reference {
        return vec![directive.target_property];
    }
    let Some(referenced) = target.referenced_entity else {
        return Vec::new();
    };
    let Some(table) = schema.find_table(
        &model.entity_namespace(referenced).name,
        &model.entity(referenced).relational.table_id,
    ) else {
        return Vec::new();
    };

    let mut targets = Vec::new();
    for key in table.get_primary_keys() {
        for source in &key.source_properties {
            if !targets.contains(source) {
                targets.push(*source);
            }
        }
    }
    targets
}

/// Resolve a foreign primary key column through the property's merge directives
fn merge_directive_column<'a>(
    model: &MetaModel,
    schema: &RelationalSchema,
    table: &'a Table,
    foreign: &Column,
    property: &Property,
) -> Option<&'a Column> {
    property.merge_directives.iter().find_map(|directive| {
        let source_context: String = directive.source_path.iter().skip(1).map(String::as_str).collect();
        let applies = foreign.source_properties.contains(&directive.source_property)
            || foreign
                .merged_reference_contexts
                .iter()
                .any(|c| c.starts_with(&source_context));
        if !applies {
            return None;
        }

        let targets = expanded_targets(model, schema, directive);
        let target = if targets.len() == 1 {
            targets[0]
        } else {
            targets
                .into_iter()
                .find(|t| foreign.source_properties.contains(t))?
        };

        let mut target_context: String = directive.target_path.concat();
        let owner = model.entity(property.parent);
        if !owner.kind.is_inline() && owner.relational.table_id != table.table_id {
            // Properties reached through a parent table carry the owner's table id in their context
            target_context = format!("{}{}", owner.relational.table_id, target_context);
        }

        table.get_all_columns().into_iter().find(|c| {
            c.source_properties.contains(&target)
                && c
                    .merged_reference_contexts
                    .iter()
                    .any(|context| context.starts_with(&target_context))
        })
    })
}

fn plan_foreign_key(
    model: &MetaModel,
    schema: &RelationalSchema,
    table: &Table,
    property_id: PropertyId,
) -> Result<Option<ForeignKey>> {
    let property = model.property(property_id);
    let Some(referenced) = property.referenced_entity else {
        return Ok(None);
    };
    let referenced_entity = model.entity(referenced);
    let foreign_namespace = &model.entity_namespace(referenced).name;
    let Some(foreign_table) = schema.find_table(foreign_namespace, &referenced_entity.relational.table_id) else {
        warn!(
            "No table {}.{} for reference {} on {}.{}",
            foreign_namespace,
            referenced_entity.relational.table_id,
            property.relational.full_name,
            table.schema,
            table.table_id
        );
        return Ok(None);
    };

    let columns: Vec<&Column> = table
        .get_all_columns()
        .into_iter()
        .filter(|c| c.source_properties.contains(&property_id))
        .collect();

    let mut foreign_key = ForeignKey::new(
        foreign_table.namespace.clone(),
        foreign_table.table_id.clone(),
        SourceReference::from_property(property),
    );
    foreign_key.source_property = Some(property_id);

    for foreign_column in foreign_table.get_primary_keys() {
        let parent_column = matching_column(foreign_column, &columns)
            .or_else(|| merge_directive_column(model, schema, table, foreign_column, property));
        let Some(parent_column) = parent_column else {
            return Err(SchemaError::ForeignKeyColumnNotFound {
                schema: table.schema.clone(),
                table: table.table_id.clone(),
                property: property.relational.full_name.clone(),
                foreign_schema: foreign_table.schema.clone(),
                foreign_table: foreign_table.table_id.clone(),
                foreign_column: foreign_column.column_id.clone(),
            }
            .into());
        };
        foreign_key.add_column_pair(ColumnPair::new(
            parent_column.column_id.clone(),
            foreign_column.column_id.clone(),
        ));
    }

    foreign_key.with_delete_cascade = property.relational.delete_cascade_primary_key;
    foreign_key.with_update_cascade = referenced_entity.relational.cascade_primary_key_updates
        && !property.relational.causes_cyclic_update_cascade;
    Ok(Some(foreign_key))
}

pub fn enhance(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(ENHANCER_NAME));
    }

    // Plan against the finished table set, then attach
    let mut planned: Vec<(NamespaceId, String, ForeignKey)> = Vec::new();
    for (index, namespace) in ctx.schema.namespaces.iter().enumerate() {
        for table in namespace.tables() {
            for property in reference_properties(&ctx.model, table) {
                if let Some(foreign_key) = plan_foreign_key(&ctx.model, &ctx.schema, table, property)? {
                    planned.push((NamespaceId(index), table.table_id.clone(), foreign_key));
                }
            }
        }
    }

    debug!("Synthesized {} reference foreign keys", planned.len());
    for (namespace, table_id, foreign_key) in planned {
        if let Some(table) = ctx.schema.namespace_mut(namespace).get_table_mut(&table_id) {
            table.add_foreign_key(foreign_key);
        }
    }
    Ok(EnhancerResult::success(ENHANCER_NAME))
}
