//! Table model

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{merge_columns, Column, ColumnTransform, ForeignKey};
use crate::model::{EntityId, PropertyId};
use crate::version::version_satisfies;

/// Range where merged columns stay in place and columns are added sorted
pub const V7_COLUMN_LAYOUT: &str = ">=7.0.0";

/// Why a table exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableExistenceReason {
    /// Main table of an entity
    Main,
    /// Child table for a collection property
    Collection,
    /// Child table for a non-inline common property
    Common,
    /// Main table of an extension entity
    Extension,
    /// Main table of a subclass entity
    Subclass,
    /// Shared base table for descriptors
    BaseDescriptor,
}

/// How `get_primary_keys` orders key columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimaryKeyOrdering {
    /// By column id
    Alphabetical,
    /// In table column order
    Declaration,
}

impl PrimaryKeyOrdering {
    pub fn for_version(version: &Version) -> Self {
        if version_satisfies(version, V7_COLUMN_LAYOUT) {
            PrimaryKeyOrdering::Declaration
        } else {
            PrimaryKeyOrdering::Alphabetical
        }
    }
}

/// A derived table
#[derive(Debug, Clone)]
pub struct Table {
    /// Stable identifier, unique within the namespace
    pub table_id: String,
    pub schema: String,
    pub namespace: String,
    pub existence_reason: TableExistenceReason,
    /// Entity whose properties built this table
    pub parent_entity: Option<EntityId>,
    /// Parent table for child tables
    pub parent_table_id: Option<String>,
    /// The child table came from this property
    pub source_property: Option<PropertyId>,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Foreign-key-producing properties whose columns were built on this table
    pub owned_properties: Vec<PropertyId>,
    pub primary_key_ordering: PrimaryKeyOrdering,
    pub is_required_collection_table: bool,
    pub is_aggregate_root_table: bool,
    pub has_discriminator_column: bool,
    pub is_deprecated: bool,
    pub deprecation_reasons: Vec<String>,
    /// Columns indexed for education organization lookups
    pub ed_org_id_columns: Vec<String>,
    pub has_ownership_token_column: bool,
}

impl Table {
    pub fn new(
        table_id: impl Into<String>,
        schema: impl Into<String>,
        namespace: impl Into<String>,
        existence_reason: TableExistenceReason,
        version: &Version,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            schema: schema.into(),
            namespace: namespace.into(),
            existence_reason,
            parent_entity: None,
            parent_table_id: None,
            source_property: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            owned_properties: Vec::new(),
            primary_key_ordering: PrimaryKeyOrdering::for_version(version),
            is_required_collection_table: false,
            is_aggregate_root_table: false,
            has_discriminator_column: false,
            is_deprecated: false,
            deprecation_reasons: Vec::new(),
            ed_org_id_columns: Vec::new(),
            has_ownership_token_column: false,
        }
    }

    /// Add a column, merging it into an existing column with the same id.
    ///
    /// 7.0+ layouts replace the duplicate in place; earlier layouts move the merged
    /// column to the end.
    pub fn add_column(&mut self, column: Column, version: &Version) {
        let Some(index) = self
            .columns
            .iter()
            .position(|c| c.column_id == column.column_id)
        else {
            self.columns.push(column);
            return;
        };

        debug!(
            "Column {} already exists on {}.{}, merging",
            column.column_id, self.schema, self.table_id
        );
        let merged = merge_columns(&self.columns[index], &column);
        if version_satisfies(version, V7_COLUMN_LAYOUT) {
            self.columns[index] = merged;
        } else {
            self.columns.remove(index);
            self.columns.push(merged);
        }
    }

    /// Transform and add columns in the order given
    pub fn add_columns_without_sort(
        &mut self,
        columns: Vec<Column>,
        transform: &ColumnTransform,
        version: &Version,
    ) {
        for column in transform.transform(columns) {
            self.add_column(column, version);
        }
    }

    /// Transform and add columns, sorted by id for 7.0+ layouts
    pub fn add_columns_with_sort(
        &mut self,
        columns: Vec<Column>,
        transform: &ColumnTransform,
        version: &Version,
    ) {
        let mut columns = transform.transform(columns);
        if version_satisfies(version, V7_COLUMN_LAYOUT) {
            columns.sort_by(|a, b| a.column_id.cmp(&b.column_id));
        }
        for column in columns {
            self.add_column(column, version);
        }
    }

    pub fn get_primary_keys(&self) -> Vec<&Column> {
        let mut keys: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| c.is_part_of_primary_key)
            .collect();
        if self.primary_key_ordering == PrimaryKeyOrdering::Alphabetical {
            keys.sort_by(|a, b| a.column_id.cmp(&b.column_id));
        }
        keys
    }

    pub fn get_non_primary_keys(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| !c.is_part_of_primary_key)
            .collect()
    }

    /// Primary key columns first, then the rest in declaration order
    pub fn get_all_columns(&self) -> Vec<&Column> {
        let mut all = self.get_primary_keys();
        all.extend(self.get_non_primary_keys());
        all
    }

    pub fn get_column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    pub fn primary_key_ids(&self) -> Vec<String> {
        self.get_primary_keys()
            .into_iter()
            .map(|c| c.column_id.clone())
            .collect()
    }

    pub fn add_foreign_key(&mut self, mut foreign_key: ForeignKey) {
        foreign_key.parent_table_id = self.table_id.clone();
        foreign_key.parent_table_schema = self.schema.clone();
        self.foreign_keys.push(foreign_key);
    }

    pub fn add_owned_property(&mut self, property: PropertyId) {
        if !self.owned_properties.contains(&property) {
            self.owned_properties.push(property);
        }
    }
}
