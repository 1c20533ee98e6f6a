//! Serializable snapshot of a relational schema

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::database::{
    Column, ColumnDataType, ColumnPair, EnumerationRow, ForeignKey, NamespaceSchema, RelationalSchema,
    SchoolYearEnumerationRow, Table, TableExistenceReason,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSnapshot {
    pub column_id: String,
    pub data_type: ColumnDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,
    pub is_nullable: bool,
    pub is_part_of_primary_key: bool,
    pub is_unique_index: bool,
    pub is_identity_database_type: bool,
    pub is_from_reference_property: bool,
    pub is_deprecated: bool,
}

impl From<&Column> for ColumnSnapshot {
    fn from(column: &Column) -> Self {
        Self {
            column_id: column.column_id.clone(),
            data_type: column.data_type,
            max_length: column.max_length,
            precision: column.precision,
            scale: column.scale,
            is_nullable: column.is_nullable,
            is_part_of_primary_key: column.is_part_of_primary_key,
            is_unique_index: column.is_unique_index,
            is_identity_database_type: column.is_identity_database_type,
            is_from_reference_property: column.is_from_reference_property,
            is_deprecated: column.is_deprecated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeySnapshot {
    pub name: String,
    pub foreign_table_schema: String,
    pub foreign_table_id: String,
    pub column_pairs: Vec<ColumnPair>,
    pub with_delete_cascade: bool,
    pub with_update_cascade: bool,
    pub with_reverse_foreign_key_index: bool,
    pub is_identifying: bool,
}

impl From<&ForeignKey> for ForeignKeySnapshot {
    fn from(foreign_key: &ForeignKey) -> Self {
        Self {
            name: foreign_key.name.clone(),
            foreign_table_schema: foreign_key.foreign_table_schema.clone(),
            foreign_table_id: foreign_key.foreign_table_id.clone(),
            column_pairs: foreign_key.column_pairs.clone(),
            with_delete_cascade: foreign_key.with_delete_cascade,
            with_update_cascade: foreign_key.with_update_cascade,
            with_reverse_foreign_key_index: foreign_key.with_reverse_foreign_key_index,
            is_identifying: foreign_key.source_reference.is_identifying,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub table_id: String,
    pub schema: String,
    pub existence_reason: TableExistenceReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_table_id: Option<String>,
    /// Primary key columns first
    pub columns: Vec<ColumnSnapshot>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    pub is_required_collection_table: bool,
    pub is_aggregate_root_table: bool,
    pub has_discriminator_column: bool,
    pub has_ownership_token_column: bool,
    pub is_deprecated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deprecation_reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ed_org_id_columns: Vec<String>,
}

impl From<&Table> for TableSnapshot {
    fn from(table: &Table) -> Self {
        Self {
            table_id: table.table_id.clone(),
            schema: table.schema.clone(),
            existence_reason: table.existence_reason,
            parent_table_id: table.parent_table_id.clone(),
            columns: table.get_all_columns().into_iter().map(ColumnSnapshot::from).collect(),
            primary_key: table.primary_key_ids(),
            foreign_keys: table.foreign_keys.iter().map(ForeignKeySnapshot::from).collect(),
            is_required_collection_table: table.is_required_collection_table,
            is_aggregate_root_table: table.is_aggregate_root_table,
            has_discriminator_column: table.has_discriminator_column,
            has_ownership_token_column: table.has_ownership_token_column,
            is_deprecated: table.is_deprecated,
            deprecation_reasons: table.deprecation_reasons.clone(),
            ed_org_id_columns: table.ed_org_id_columns.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSnapshot {
    pub namespace: String,
    pub schema: String,
    pub tables: Vec<TableSnapshot>,
    #[serde(default)]
    pub enumeration_rows: Vec<EnumerationRow>,
    #[serde(default)]
    pub school_year_rows: Vec<SchoolYearEnumerationRow>,
}

impl From<&NamespaceSchema> for NamespaceSnapshot {
    fn from(namespace: &NamespaceSchema) -> Self {
        Self {
            namespace: namespace.namespace.clone(),
            schema: namespace.schema.clone(),
            tables: namespace.tables().iter().map(TableSnapshot::from).collect(),
            enumeration_rows: namespace.enumeration_rows().to_vec(),
            school_year_rows: namespace.school_year_rows().to_vec(),
        }
    }
}

/// Everything a downstream generator needs from one compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    pub target_version: String,
    pub namespaces: Vec<NamespaceSnapshot>,
}

impl SchemaSnapshot {
    pub fn from_schema(schema: &RelationalSchema, target_version: &Version) -> Self {
        Self {
            target_version: target_version.to_string(),
            namespaces: schema.namespaces.iter().map(NamespaceSnapshot::from).collect(),
        }
    }

    pub fn table_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.tables.len()).sum()
    }

    pub fn find_table(&self, schema: &str, table_id: &str) -> Option<&TableSnapshot> {
        self.namespaces
            .iter()
            .filter(|ns| ns.schema == schema)
            .flat_map(|ns| ns.tables.iter())
            .find(|t| t.table_id == table_id)
    }
}
