//! Table creation passes, one per entity kind

mod builder;
mod columns;
mod lookup;
mod strategy;

pub use builder::{ParentTable, TableBuilder};
pub use columns::{cardinality_transform, lookup_column_id, ColumnCreator};
pub use lookup::{BASE_DESCRIPTOR_KEY, BASE_DESCRIPTOR_TABLE_ID, SCHOOL_YEAR_TABLE_ID};
pub use strategy::BuildStrategy;

use anyhow::Result;
use tracing::{debug, warn};

use super::base_reference::identity_rename;
use super::{CompileContext, EnhancerResult};
use crate::database::{Column, ColumnPair, ForeignKey, SourceReference, Table, TableExistenceReason};
use crate::model::{EntityKind, MetaModel, NamespaceId};

pub const BASE_DESCRIPTOR_TABLE: &str = "BaseDescriptorTableEnhancer";
pub const DOMAIN_ENTITY_TABLE: &str = "DomainEntityTableEnhancer";
pub const ASSOCIATION_TABLE: &str = "AssociationTableEnhancer";
pub const DOMAIN_ENTITY_SUBCLASS_TABLE: &str = "DomainEntitySubclassTableEnhancer";
pub const ASSOCIATION_SUBCLASS_TABLE: &str = "AssociationSubclassTableEnhancer";
pub const DOMAIN_ENTITY_EXTENSION_TABLE: &str = "DomainEntityExtensionTableEnhancer";
pub const ASSOCIATION_EXTENSION_TABLE: &str = "AssociationExtensionTableEnhancer";
pub const DESCRIPTOR_TABLE: &str = "DescriptorTableEnhancer";
pub const ENUMERATION_TABLE: &str = "EnumerationTableEnhancer";
pub const SCHOOL_YEAR_TABLE: &str = "SchoolYearEnumerationTableEnhancer";

fn add_tables(ctx: &mut CompileContext, namespace: NamespaceId, tables: Vec<Table>) {
    let schema = ctx.schema.namespace_mut(namespace);
    for table in tables {
        debug!("Created table {}.{}", table.schema, table.table_id);
        schema.add_table(table);
    }
}

/// Namespace holding the shared descriptor table: the core namespace, else the first descriptor's
fn base_descriptor_namespace(model: &MetaModel) -> Option<NamespaceId> {
    model.core_namespace().or_else(|| {
        model
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::Descriptor)
            .map(|e| e.namespace)
    })
}

fn enhance_main_tables(
    ctx: &mut CompileContext,
    name: &'static str,
    kind: EntityKind,
    reason: TableExistenceReason,
) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(name));
    }

    for entity in ctx.entities_of_kind(kind)? {
        let tables = {
            let builder = TableBuilder::new(&ctx.model, &ctx.target_version);
            let mut tables = builder.build_main_tables(entity, reason);
            if kind.is_subclass() {
                if let Some(rename) = identity_rename(&ctx.model, entity) {
                    if let Some(foreign_key) = builder.renamed_base_key(entity, rename) {
                        tables[0].add_foreign_key(foreign_key);
                    }
                }
            }
            tables
        };
        let namespace = ctx.model.entity(entity).namespace;
        add_tables(ctx, namespace, tables);
    }
    Ok(EnhancerResult::success(name))
}

pub fn enhance_domain_entities(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    enhance_main_tables(ctx, DOMAIN_ENTITY_TABLE, EntityKind::DomainEntity, TableExistenceReason::Main)
}

pub fn enhance_associations(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    enhance_main_tables(ctx, ASSOCIATION_TABLE, EntityKind::Association, TableExistenceReason::Main)
}

pub fn enhance_domain_entity_subclasses(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    enhance_main_tables(
        ctx,
        DOMAIN_ENTITY_SUBCLASS_TABLE,
        EntityKind::DomainEntitySubclass,
        TableExistenceReason::Subclass,
    )
}

pub fn enhance_association_subclasses(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    enhance_main_tables(
        ctx,
        ASSOCIATION_SUBCLASS_TABLE,
        EntityKind::AssociationSubclass,
        TableExistenceReason::Subclass,
    )
}

/// Extension tables exist only when the extension adds columns of its own.
/// Extension collections and commons hang off the base entity's table.
fn enhance_extension_tables(
    ctx: &mut CompileContext,
    name: &'static str,
    kind: EntityKind,
) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(name));
    }

    for extension in ctx.entities_of_kind(kind)? {
        let tables = {
            let model = &ctx.model;
            let e = model.entity(extension);
            let Some(base) = e.base_entity else {
                warn!("Extension {} has no base entity", e.name);
                continue;
            };
            let base_entity = model.entity(base);
            let Some(base_table) = ctx.schema.find_table(
                &model.entity_namespace(base).name,
                &base_entity.relational.table_id,
            ) else {
                warn!(
                    "Base table {} for extension {} does not exist",
                    base_entity.relational.table_id, e.name
                );
                continue;
            };

            let builder = TableBuilder::new(model, &ctx.target_version);
            let mut table =
                builder.new_table(extension, &e.relational.table_id, TableExistenceReason::Extension);
            let deferred = builder.build_columns(&mut table, &e.relational.properties, &BuildStrategy::default());
            builder.sort_columns(&mut table, &[]);

            let mut tables = Vec::new();
            if builder.has_own_columns(extension) {
                tables.push(table);
            }
            let parent = ParentTable {
                entity: extension,
                ..ParentTable::from_table(base_table, base, base_entity.relational.cascade_primary_key_updates)
            };
            for (property, strategy) in deferred {
                builder.build_child_tables(&parent, property, &strategy, &mut tables);
            }
            tables
        };
        let namespace = ctx.model.entity(extension).namespace;
        add_tables(ctx, namespace, tables);
    }
    Ok(EnhancerResult::success(name))
}

pub fn enhance_domain_entity_extensions(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    enhance_extension_tables(ctx, DOMAIN_ENTITY_EXTENSION_TABLE, EntityKind::DomainEntityExtension)
}

pub fn enhance_association_extensions(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    enhance_extension_tables(ctx, ASSOCIATION_EXTENSION_TABLE, EntityKind::AssociationExtension)
}

/// The shared `Descriptor` table every descriptor table extends
pub fn enhance_base_descriptor(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(BASE_DESCRIPTOR_TABLE));
    }
    let has_descriptors = ctx
        .model
        .entities
        .iter()
        .any(|e| e.kind == EntityKind::Descriptor);
    let Some(namespace) = base_descriptor_namespace(&ctx.model).filter(|_| has_descriptors) else {
        return Ok(EnhancerResult::success(BASE_DESCRIPTOR_TABLE));
    };

    let mut table = lookup::lookup_table(
        BASE_DESCRIPTOR_TABLE_ID,
        &ctx.model.namespace(namespace).name,
        TableExistenceReason::BaseDescriptor,
        lookup::base_descriptor_columns(),
        &ctx.target_version,
    );
    table.is_aggregate_root_table = true;
    add_tables(ctx, namespace, vec![table]);
    Ok(EnhancerResult::success(BASE_DESCRIPTOR_TABLE))
}

pub fn enhance_descriptors(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(DESCRIPTOR_TABLE));
    }
    let Some(base_namespace) = base_descriptor_namespace(&ctx.model) else {
        return Ok(EnhancerResult::success(DESCRIPTOR_TABLE));
    };
    let base_namespace = ctx.model.namespace(base_namespace).name.clone();

    for descriptor in ctx.entities_of_kind(EntityKind::Descriptor)? {
        let tables = {
            let builder = TableBuilder::new(&ctx.model, &ctx.target_version);
            let e = ctx.model.entity(descriptor);
            let table_id = e.relational.table_id.clone();
            let mut table = builder.new_table(descriptor, &table_id, TableExistenceReason::Main);
            table.is_aggregate_root_table = true;
            table.add_column(lookup::descriptor_key_column(&table_id), &ctx.target_version);
            let deferred = builder.build_columns(&mut table, &e.relational.properties, &BuildStrategy::default());
            builder.sort_columns(&mut table, &[]);

            let mut base_link = ForeignKey::new(
                base_namespace.clone(),
                BASE_DESCRIPTOR_TABLE_ID,
                SourceReference {
                    is_part_of_identity: true,
                    is_subclass_relationship: true,
                    ..SourceReference::default()
                },
            );
            base_link.add_column_pair(ColumnPair::new(format!("{}Id", table_id), BASE_DESCRIPTOR_KEY));
            base_link.with_delete_cascade = true;
            table.add_foreign_key(base_link);

            let parent = ParentTable::from_table(&table, descriptor, false);
            let mut tables = vec![table];
            for (property, strategy) in deferred {
                builder.build_child_tables(&parent, property, &strategy, &mut tables);
            }
            tables
        };
        let namespace = ctx.model.entity(descriptor).namespace;
        add_tables(ctx, namespace, tables);
    }
    Ok(EnhancerResult::success(DESCRIPTOR_TABLE))
}

fn lookup_tables(
    ctx: &mut CompileContext,
    name: &'static str,
    kind: EntityKind,
    columns: impl Fn(&str) -> Vec<Column>,
) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(name));
    }

    for entity in ctx.entities_of_kind(kind)? {
        let e = ctx.model.entity(entity);
        let mut table = lookup::lookup_table(
            &e.relational.table_id,
            &ctx.model.namespace(e.namespace).name,
            TableExistenceReason::Main,
            columns(&e.relational.table_id),
            &ctx.target_version,
        );
        table.parent_entity = Some(entity);
        let namespace = e.namespace;
        add_tables(ctx, namespace, vec![table]);
    }
    Ok(EnhancerResult::success(name))
}

pub fn enhance_enumerations(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    lookup_tables(ctx, ENUMERATION_TABLE, EntityKind::Enumeration, lookup::enumeration_columns)
}

pub fn enhance_school_year_enumerations(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    lookup_tables(ctx, SCHOOL_YEAR_TABLE, EntityKind::SchoolYearEnumeration, |_| {
        lookup::school_year_columns()
    })
}
