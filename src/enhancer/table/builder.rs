//! Turns an entity's flattened property list into a main table and its child tables

use semver::Version;
use tracing::debug;

use super::{BuildStrategy, ColumnCreator};
use crate::database::{
    column_sort_v7, Column, ColumnPair, ColumnTransform, ForeignKey, SourceReference, Table,
    TableExistenceReason, V7_COLUMN_LAYOUT,
};
use crate::model::{EntityId, MetaModel, PropertyId, PropertyKind};
use crate::util::schema_name;
use crate::version::version_satisfies;

/// What a child table needs to know about the table it hangs off
#[derive(Debug, Clone)]
pub struct ParentTable {
    pub table_id: String,
    pub namespace: String,
    /// Entity whose namespace the child tables belong to
    pub entity: EntityId,
    pub primary_keys: Vec<Column>,
    pub cascade_updates: bool,
}

impl ParentTable {
    pub fn from_table(table: &Table, entity: EntityId, cascade_updates: bool) -> Self {
        Self {
            table_id: table.table_id.clone(),
            namespace: table.namespace.clone(),
            entity,
            primary_keys: table.get_primary_keys().into_iter().cloned().collect(),
            cascade_updates,
        }
    }
}

/// Columns and follow-up work gathered for one table
#[derive(Debug, Default)]
struct Collected {
    /// Column groups, one per contributing property
    columns: Vec<Vec<Column>>,
    /// Descriptor, enumeration and school year properties needing lookup keys
    lookups: Vec<PropertyId>,
    /// Reference properties whose keys the foreign key pass synthesizes
    references: Vec<PropertyId>,
    /// Collections and commons that become child tables
    deferred: Vec<(PropertyId, BuildStrategy)>,
}

pub struct TableBuilder<'a> {
    model: &'a MetaModel,
    version: &'a Version,
    creator: ColumnCreator<'a>,
}

impl<'a> TableBuilder<'a> {
    pub fn new(model: &'a MetaModel, version: &'a Version) -> Self {
        Self {
            model,
            version,
            creator: ColumnCreator::new(model),
        }
    }

    /// Apply the 7.0+ column order; earlier layouts keep build order
    pub fn sort_columns(&self, table: &mut Table, parent_key_ids: &[String]) {
        if version_satisfies(self.version, V7_COLUMN_LAYOUT) {
            column_sort_v7(&mut table.columns, parent_key_ids);
        }
    }

    /// An empty table in the entity's namespace
    pub fn new_table(&self, entity: EntityId, table_id: &str, reason: TableExistenceReason) -> Table {
        let namespace = &self.model.entity_namespace(entity).name;
        let mut table = Table::new(table_id, schema_name(namespace), namespace.clone(), reason, self.version);
        table.parent_entity = Some(entity);
        table
    }

    /// Main table plus child tables, parents before children
    pub fn build_main_tables(&self, entity: EntityId, reason: TableExistenceReason) -> Vec<Table> {
        let e = self.model.entity(entity);
        let mut table = self.new_table(entity, &e.relational.table_id, reason);
        table.is_aggregate_root_table = true;

        let deferred = self.build_columns(&mut table, &e.relational.properties, &BuildStrategy::default());
        self.sort_columns(&mut table, &[]);

        let parent = ParentTable::from_table(&table, entity, e.relational.cascade_primary_key_updates);
        let mut tables = vec![table];
        for (property, strategy) in deferred {
            self.build_child_tables(&parent, property, &strategy, &mut tables);
        }
        tables
    }

    /// Add the columns of `properties` to `table` and return the properties deferred to child tables
    pub fn build_columns(
        &self,
        table: &mut Table,
        properties: &[PropertyId],
        strategy: &BuildStrategy,
    ) -> Vec<(PropertyId, BuildStrategy)> {
        let mut collected = Collected::default();
        self.collect(properties, strategy, &mut collected);
        self.apply(table, collected)
    }

    fn apply(&self, table: &mut Table, collected: Collected) -> Vec<(PropertyId, BuildStrategy)> {
        for group in collected.columns {
            table.add_columns_with_sort(group, &ColumnTransform::Unchanged, self.version);
        }
        for lookup in collected.lookups {
            self.add_lookup_foreign_key(table, lookup);
        }
        for reference in collected.references {
            table.add_owned_property(reference);
        }
        collected.deferred
    }

    fn collect(&self, properties: &[PropertyId], strategy: &BuildStrategy, out: &mut Collected) {
        for property in properties {
            let p = self.model.property(*property);
            let Some(s) = strategy.for_property(&p.relational.full_name) else {
                debug!("Skipping merged-away property {}", p.relational.full_name);
                continue;
            };
            if p.is_collection() || p.kind == PropertyKind::Common {
                out.deferred.push((*property, s));
                continue;
            }
            self.collect_property(*property, &s, out);
        }
    }

    /// Columns for one non-deferred property, or for a collection item in its child table
    fn collect_property(&self, property: PropertyId, strategy: &BuildStrategy, out: &mut Collected) {
        let p = self.model.property(property);
        match p.kind {
            PropertyKind::InlineCommon | PropertyKind::Choice => {
                let Some(inline) = p.referenced_entity else {
                    return;
                };
                let mut inner_strategy = strategy.append_parent_context(property, &p.relational.context_prefix);
                if p.is_optional_kind() || p.kind == PropertyKind::Choice {
                    inner_strategy = inner_strategy.make_leaf_columns_nullable();
                }

                let mut inner = Collected::default();
                let inline_properties = &self.model.entity(inline).relational.properties;
                self.collect(inline_properties, &inner_strategy, &mut inner);

                let collapse = ColumnTransform::CollapsibleRoleName(p.relational.context_prefix.clone());
                for group in inner.columns {
                    let group = collapse.transform(group);
                    let group = if p.relational.is_identity && !strategy.suppress_primary_key {
                        ColumnTransform::PrimaryKey.transform(group)
                    } else {
                        group
                    };
                    out.columns.push(group);
                }
                out.lookups.extend(inner.lookups);
                out.references.extend(inner.references);
                out.deferred.extend(inner.deferred);
            }
            PropertyKind::Common => {}
            kind => {
                out.columns.push(self.creator.create_columns(property, strategy));
                if kind == PropertyKind::Reference {
                    out.references.push(property);
                } else if kind.is_foreign_key_source() {
                    out.lookups.push(property);
                }
            }
        }
    }

    /// Foreign key from a descriptor, enumeration or school year column to its lookup table
    fn add_lookup_foreign_key(&self, table: &mut Table, lookup: PropertyId) {
        let p = self.model.property(lookup);
        let Some(target) = p.referenced_entity else {
            return;
        };
        let target_entity = self.model.entity(target);
        let foreign_table_id = target_entity.relational.table_id.clone();
        let foreign_column = match p.kind {
            PropertyKind::SchoolYearEnumeration => "SchoolYear".to_string(),
            _ => format!("{}Id", foreign_table_id),
        };

        let mut foreign_key = ForeignKey::new(
            self.model.entity_namespace(target).name.clone(),
            foreign_table_id,
            SourceReference::from_property(p),
        );
        foreign_key.source_property = Some(lookup);
        for column in table
            .columns
            .iter()
            .filter(|c| c.source_properties.first() == Some(&lookup))
        {
            foreign_key.add_column_pair(ColumnPair::new(column.column_id.clone(), foreign_column.clone()));
        }
        if !foreign_key.column_pairs.is_empty() {
            table.add_foreign_key(foreign_key);
        }
    }

    /// Build the child table for a collection or common property, then its own children
    pub fn build_child_tables(
        &self,
        parent: &ParentTable,
        property: PropertyId,
        strategy: &BuildStrategy,
        out: &mut Vec<Table>,
    ) {
        let p = self.model.property(property);
        let table_id = format!("{}{}{}", parent.table_id, strategy.parent_context, p.relational.full_name);
        let reason = if p.kind.is_composite() {
            TableExistenceReason::Common
        } else {
            TableExistenceReason::Collection
        };
        debug!("Building child table {} for {}", table_id, p.relational.full_name);

        let mut table = self.new_table(parent.entity, &table_id, reason);
        table.parent_table_id = Some(parent.table_id.clone());
        table.source_property = Some(property);
        table.is_required_collection_table = p.is_required_collection;

        let parent_keys: Vec<Column> = parent
            .primary_keys
            .iter()
            .map(|key| {
                let mut column = key.clone();
                column.is_part_of_primary_key = true;
                column.is_nullable = false;
                column.is_unique_index = false;
                column.is_identity_database_type = false;
                column.reference_context = format!("{}{}", parent.table_id, key.reference_context);
                column.merged_reference_contexts = key
                    .merged_reference_contexts
                    .iter()
                    .map(|c| format!("{}{}", parent.table_id, c))
                    .collect();
                column
            })
            .collect();
        let parent_key_ids: Vec<String> = parent_keys.iter().map(|c| c.column_id.clone()).collect();
        table.add_columns_without_sort(parent_keys, &ColumnTransform::Unchanged, self.version);

        let mut parent_link = ForeignKey::new(parent.namespace.clone(), parent.table_id.clone(), SourceReference::subtable());
        for id in &parent_key_ids {
            parent_link.add_column_pair(ColumnPair::new(id.clone(), id.clone()));
        }
        parent_link.with_delete_cascade = true;
        parent_link.with_update_cascade = parent.cascade_updates;

        let deferred = if p.kind.is_composite() {
            let Some(common) = p.referenced_entity else {
                return;
            };
            let mut common_strategy = BuildStrategy {
                skip_paths: strategy.skip_paths.clone(),
                ..BuildStrategy::default()
            };
            if !p.is_collection() {
                common_strategy = common_strategy.suppress_primary_key_creation();
            }
            let common_properties = &self.model.entity(common).relational.properties;
            let deferred = self.build_columns(&mut table, common_properties, &common_strategy);
            table.add_foreign_key(parent_link);
            deferred
        } else {
            table.add_foreign_key(parent_link);
            let mut collected = Collected::default();
            self.collect_property(property, strategy, &mut collected);
            self.apply(&mut table, collected)
        };

        self.sort_columns(&mut table, &parent_key_ids);

        let child_parent = ParentTable::from_table(&table, parent.entity, parent.cascade_updates);
        out.push(table);
        for (child, child_strategy) in deferred {
            self.build_child_tables(&child_parent, child, &child_strategy, out);
        }
    }

    /// Identity columns of a subclass's base, paired with the subclass column holding each value
    pub fn renamed_base_key(&self, subclass: EntityId, rename: PropertyId) -> Option<ForeignKey> {
        let sub = self.model.entity(subclass);
        let base = sub.base_entity?;
        let base_entity = self.model.entity(base);
        let renamed_name = self.model.property(rename).renames_base_property.clone()?;
        let strategy = BuildStrategy::default();

        let rename_column = self.creator.create_columns(rename, &strategy).into_iter().next()?;
        let mut foreign_key = ForeignKey::new(
            self.model.entity_namespace(base).name.clone(),
            base_entity.relational.table_id.clone(),
            SourceReference {
                is_part_of_identity: true,
                is_subclass_relationship: sub.kind.is_subclass(),
                is_extension_relationship: sub.kind.is_extension(),
                ..SourceReference::default()
            },
        );
        for identity in &base_entity.relational.identity_properties {
            let is_renamed = self.model.property(*identity).name == renamed_name;
            for column in self.creator.create_columns(*identity, &strategy) {
                let parent_column = if is_renamed {
                    rename_column.column_id.clone()
                } else {
                    column.column_id.clone()
                };
                foreign_key.add_column_pair(ColumnPair::new(parent_column, column.column_id));
            }
        }
        foreign_key.with_delete_cascade = true;
        foreign_key.with_update_cascade = base_entity.relational.cascade_primary_key_updates;
        Some(foreign_key)
    }

    /// Extension properties that put columns on the extension table itself
    pub fn has_own_columns(&self, extension: EntityId) -> bool {
        self.model.entity(extension).properties.iter().any(|id| {
            let p = self.model.property(*id);
            !p.is_collection() && p.kind != PropertyKind::Common
        })
    }
}
