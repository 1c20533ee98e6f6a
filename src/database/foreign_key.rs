//! Foreign key model

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{Property, PropertyId};

/// A parent column paired with the foreign column it references
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPair {
    pub parent_table_column_id: String,
    pub foreign_table_column_id: String,
}

impl ColumnPair {
    pub fn new(parent: impl Into<String>, foreign: impl Into<String>) -> Self {
        Self {
            parent_table_column_id: parent.into(),
            foreign_table_column_id: foreign.into(),
        }
    }
}

/// Semantics of the property a foreign key came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub is_part_of_identity: bool,
    pub is_required: bool,
    pub is_optional: bool,
    pub is_required_collection: bool,
    pub is_optional_collection: bool,
    pub is_subclass_relationship: bool,
    pub is_extension_relationship: bool,
    pub is_synthetic_relationship: bool,
    pub is_subtable_relationship: bool,
    /// All parent columns are part of the parent table's primary key
    pub is_identifying: bool,
}

impl SourceReference {
    /// Summary of a property's cardinality and relationship kind
    pub fn from_property(property: &Property) -> Self {
        Self {
            is_part_of_identity: property.relational.is_identity,
            is_required: property.is_required,
            is_optional: property.is_optional,
            is_required_collection: property.is_required_collection,
            is_optional_collection: property.is_optional_collection,
            is_subclass_relationship: property.relational.is_reference_to_superclass,
            is_extension_relationship: property.relational.is_reference_to_extension_parent,
            is_synthetic_relationship: property.relational.is_synthetic,
            is_subtable_relationship: false,
            is_identifying: false,
        }
    }

    /// A child table's link to its parent
    pub fn subtable() -> Self {
        Self {
            is_part_of_identity: true,
            is_subtable_relationship: true,
            ..Self::default()
        }
    }
}

/// A foreign key on a parent table
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    /// Constraint name, assigned by the naming pass
    pub name: String,
    pub parent_table_id: String,
    pub parent_table_schema: String,
    pub foreign_table_id: String,
    /// Namespace of the foreign table; the table itself is resolved by id after creation
    pub foreign_table_namespace: String,
    /// Filled in by foreign table resolution
    pub foreign_table_schema: String,
    pub column_pairs: Vec<ColumnPair>,
    pub with_delete_cascade: bool,
    pub with_update_cascade: bool,
    pub with_reverse_foreign_key_index: bool,
    pub source_reference: SourceReference,
    /// Property the key was synthesized for, if any
    pub source_property: Option<PropertyId>,
}

impl ForeignKey {
    pub fn new(
        foreign_table_namespace: impl Into<String>,
        foreign_table_id: impl Into<String>,
        source_reference: SourceReference,
    ) -> Self {
        Self {
            name: String::new(),
            parent_table_id: String::new(),
            parent_table_schema: String::new(),
            foreign_table_id: foreign_table_id.into(),
            foreign_table_namespace: foreign_table_namespace.into(),
            foreign_table_schema: String::new(),
            column_pairs: Vec::new(),
            with_delete_cascade: false,
            with_update_cascade: false,
            with_reverse_foreign_key_index: false,
            source_reference,
            source_property: None,
        }
    }

    /// Add a column pair. Pairs are unique per key; duplicates are rejected.
    pub fn add_column_pair(&mut self, pair: ColumnPair) -> bool {
        if self.column_pairs.contains(&pair) {
            warn!(
                "Attempt to add duplicate column pair {} -> {} to foreign key {} -> {} failed",
                pair.parent_table_column_id,
                pair.foreign_table_column_id,
                self.parent_table_id,
                self.foreign_table_id
            );
            return false;
        }
        self.column_pairs.push(pair);
        true
    }

    pub fn parent_column_ids(&self) -> Vec<&str> {
        self.column_pairs
            .iter()
            .map(|p| p.parent_table_column_id.as_str())
            .collect()
    }

    pub fn foreign_column_ids(&self) -> Vec<&str> {
        self.column_pairs
            .iter()
            .map(|p| p.foreign_table_column_id.as_str())
            .collect()
    }
}
