//! Column model and the column merge policy

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{PropertyId, PropertyKind, TypeFacets};

/// Primitive column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnDataType {
    Bigint,
    Boolean,
    Currency,
    Date,
    DateTime,
    Decimal,
    Duration,
    Integer,
    Percent,
    Short,
    String,
    Time,
    Year,
}

impl ColumnDataType {
    /// Column type for a simple property kind
    pub fn from_property_kind(kind: PropertyKind) -> Option<Self> {
        let data_type = match kind {
            PropertyKind::Boolean => ColumnDataType::Boolean,
            PropertyKind::Currency => ColumnDataType::Currency,
            PropertyKind::Date => ColumnDataType::Date,
            PropertyKind::DateTime => ColumnDataType::DateTime,
            PropertyKind::Decimal => ColumnDataType::Decimal,
            PropertyKind::Duration => ColumnDataType::Duration,
            PropertyKind::Integer => ColumnDataType::Integer,
            PropertyKind::Percent => ColumnDataType::Percent,
            PropertyKind::Short => ColumnDataType::Short,
            PropertyKind::String => ColumnDataType::String,
            PropertyKind::Time => ColumnDataType::Time,
            PropertyKind::Year => ColumnDataType::Year,
            _ => return None,
        };
        Some(data_type)
    }
}

/// One component of a column name, kept so dependent generators can rebuild names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameComponent {
    pub name: String,
    /// Came from a role name or shorten-to further up the property chain
    pub is_parent_property_context: bool,
    /// Came from the property's own role name
    pub is_property_role_name: bool,
}

impl NameComponent {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_parent_property_context: false,
            is_property_role_name: false,
        }
    }

    pub fn role_name(name: impl Into<String>) -> Self {
        Self {
            is_property_role_name: true,
            ..Self::base(name)
        }
    }

    pub fn parent_context(name: impl Into<String>) -> Self {
        Self {
            is_parent_property_context: true,
            ..Self::base(name)
        }
    }
}

/// A column of a derived table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Stable identifier, unique within the table
    pub column_id: String,
    pub data_type: ColumnDataType,
    pub max_length: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub is_nullable: bool,
    pub is_part_of_primary_key: bool,
    pub is_part_of_alternate_key: bool,
    pub is_unique_index: bool,
    /// Generated key value (USI columns)
    pub is_identity_database_type: bool,
    pub is_from_reference_property: bool,
    pub is_deprecated: bool,
    pub name_components: Vec<NameComponent>,
    /// Concatenated full property names along the path that produced the column
    pub reference_context: String,
    /// Reference contexts this column satisfies after merging
    pub merged_reference_contexts: Vec<String>,
    /// Properties the column was derived from, outermost first
    pub source_properties: Vec<PropertyId>,
}

impl Column {
    pub fn new(column_id: impl Into<String>, data_type: ColumnDataType) -> Self {
        let column_id = column_id.into();
        Self {
            name_components: vec![NameComponent::base(column_id.clone())],
            column_id,
            data_type,
            max_length: None,
            precision: None,
            scale: None,
            is_nullable: false,
            is_part_of_primary_key: false,
            is_part_of_alternate_key: false,
            is_unique_index: false,
            is_identity_database_type: false,
            is_from_reference_property: false,
            is_deprecated: false,
            reference_context: String::new(),
            merged_reference_contexts: Vec::new(),
            source_properties: Vec::new(),
        }
    }

    /// Apply length and precision facets from a property
    pub fn with_facets(mut self, facets: &TypeFacets) -> Self {
        match self.data_type {
            ColumnDataType::String => self.max_length = facets.max_length,
            ColumnDataType::Decimal => {
                self.precision = facets.total_digits;
                self.scale = facets.decimal_places;
            }
            _ => {}
        }
        self
    }

    /// Set the reference context and seed the merged contexts with it
    pub fn with_reference_context(mut self, context: impl Into<String>) -> Self {
        self.reference_context = context.into();
        self.merged_reference_contexts = vec![self.reference_context.clone()];
        self
    }

    /// Record a source property. Duplicates are rejected.
    pub fn add_source_property(&mut self, property: PropertyId) -> bool {
        if self.source_properties.contains(&property) {
            warn!(
                "Attempt to add duplicate source property {:?} to column {} failed",
                property, self.column_id
            );
            return false;
        }
        self.source_properties.push(property);
        true
    }

    /// Record a merged reference context. Duplicates are rejected.
    pub fn add_merged_reference_context(&mut self, context: &str) -> bool {
        if self.merged_reference_contexts.iter().any(|c| c == context) {
            warn!(
                "Attempt to add duplicate merged reference context {} to column {} failed",
                context, self.column_id
            );
            return false;
        }
        self.merged_reference_contexts.push(context.to_string());
        true
    }

    /// Prepend a property to the provenance chain and its full name to the reference context
    pub fn prepend_source(&mut self, property: PropertyId, full_name: &str) {
        if !self.source_properties.contains(&property) {
            self.source_properties.insert(0, property);
        }
        self.reference_context = format!("{}{}", full_name, self.reference_context);
        self.merged_reference_contexts = self
            .merged_reference_contexts
            .iter()
            .map(|c| format!("{}{}", full_name, c))
            .collect();
    }

    pub fn shares_source_property(&self, other: &Column) -> bool {
        self.source_properties
            .iter()
            .any(|p| other.source_properties.contains(p))
    }
}

/// Merge two columns with the same identifier arrived at via independent property paths.
///
/// The existing column survives; the incoming one only contributes constraints.
/// Key flags are OR'd, nullability is AND'd, provenance sets are unioned.
pub fn merge_columns(existing: &Column, incoming: &Column) -> Column {
    let mut merged = existing.clone();

    for property in &incoming.source_properties {
        if !merged.source_properties.contains(property) {
            merged.source_properties.push(*property);
        }
    }
    for context in &incoming.merged_reference_contexts {
        if !merged.merged_reference_contexts.contains(context) {
            merged.merged_reference_contexts.push(context.clone());
        }
    }

    merged.is_part_of_primary_key = existing.is_part_of_primary_key || incoming.is_part_of_primary_key;
    merged.is_part_of_alternate_key =
        existing.is_part_of_alternate_key || incoming.is_part_of_alternate_key;
    merged.is_unique_index = existing.is_unique_index || incoming.is_unique_index;
    merged.is_nullable = existing.is_nullable && incoming.is_nullable;
    merged.is_from_reference_property =
        existing.is_from_reference_property || incoming.is_from_reference_property;

    debug!(
        "Merged duplicate column {} (pk={}, nullable={})",
        merged.column_id, merged.is_part_of_primary_key, merged.is_nullable
    );
    merged
}

/// Order columns for 7.0+ layouts:
/// parent key columns first in their existing order, then remaining key
/// columns by id, then non-key columns by id.
pub fn column_sort_v7(columns: &mut [Column], parent_primary_key_ids: &[String]) {
    let is_parent_key = |c: &Column| parent_primary_key_ids.iter().any(|id| *id == c.column_id);

    columns.sort_by(|a, b| {
        let rank = |c: &Column| {
            if is_parent_key(c) {
                0
            } else if c.is_part_of_primary_key {
                1
            } else {
                2
            }
        };
        let (rank_a, rank_b) = (rank(a), rank(b));
        if rank_a != rank_b || rank_a == 0 {
            return rank_a.cmp(&rank_b);
        }
        a.column_id.cmp(&b.column_id)
    });
}
