//! Property types of the input model

use serde::{Deserialize, Serialize};

use super::{EntityId, PropertyId};

/// Property kinds. Shared simple types arrive already resolved to their simple kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
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
    Descriptor,
    Enumeration,
    SchoolYearEnumeration,
    /// Reference to a domain entity or association
    Reference,
    Common,
    InlineCommon,
    Choice,
}

impl PropertyKind {
    /// Kinds that map to a single primitive column
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            PropertyKind::Boolean
                | PropertyKind::Currency
                | PropertyKind::Date
                | PropertyKind::DateTime
                | PropertyKind::Decimal
                | PropertyKind::Duration
                | PropertyKind::Integer
                | PropertyKind::Percent
                | PropertyKind::Short
                | PropertyKind::String
                | PropertyKind::Time
                | PropertyKind::Year
        )
    }

    /// Kinds whose columns point at a lookup or entity table
    pub fn is_foreign_key_source(&self) -> bool {
        matches!(
            self,
            PropertyKind::Reference
                | PropertyKind::Descriptor
                | PropertyKind::Enumeration
                | PropertyKind::SchoolYearEnumeration
        )
    }

    /// Kinds that carry their own property list
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            PropertyKind::Common | PropertyKind::InlineCommon | PropertyKind::Choice
        )
    }
}

/// Length and precision facets for simple types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFacets {
    pub max_length: Option<u32>,
    pub total_digits: Option<u8>,
    pub decimal_places: Option<u8>,
}

/// Declares that two reference paths to the same ultimate entity denote the same value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeDirective {
    /// Full property names from the owning property down to the merged property
    pub source_path: Vec<String>,
    /// Full property names from the owning entity down to the value merged into
    pub target_path: Vec<String>,
    pub source_property: PropertyId,
    pub target_property: PropertyId,
}

/// Data derived for a property by the pipeline
#[derive(Debug, Clone, Default)]
pub struct PropertyRelational {
    /// Role name plus name, collapsed when equal
    pub full_name: String,
    /// Prefix applied to columns derived through this property
    pub context_prefix: String,
    /// Identity membership after property enhancement (USI creation can demote a property)
    pub is_identity: bool,
    pub is_unique_index: bool,
    /// Created by the pipeline rather than declared in the model
    pub is_synthetic: bool,
    pub is_reference_to_superclass: bool,
    pub is_reference_to_extension_parent: bool,
    pub is_usi: bool,
    pub delete_cascade_primary_key: bool,
    /// This property's update cascade path was pruned as redundant
    pub causes_cyclic_update_cascade: bool,
}

/// A property of an entity
#[derive(Debug, Clone)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub role_name: String,
    pub shorten_to: String,
    /// Owning entity
    pub parent: EntityId,
    pub kind: PropertyKind,
    pub is_part_of_identity: bool,
    /// Name of the base identity property this property renames
    pub renames_base_property: Option<String>,
    pub is_required: bool,
    pub is_optional: bool,
    pub is_required_collection: bool,
    pub is_optional_collection: bool,
    /// Weak references produce columns but no foreign key
    pub is_weak_reference: bool,
    /// Deleting the referenced row deletes rows holding this reference
    pub is_delete_cascade: bool,
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
    pub facets: TypeFacets,
    /// Target entity for reference, descriptor, enumeration and common kinds
    pub referenced_entity: Option<EntityId>,
    pub merge_directives: Vec<MergeDirective>,
    pub relational: PropertyRelational,
}

impl Property {
    /// A required, non-identity property; adjust with the builder methods.
    pub fn new(kind: PropertyKind, name: impl Into<String>) -> Self {
        Self {
            id: PropertyId(0),
            name: name.into(),
            role_name: String::new(),
            shorten_to: String::new(),
            parent: EntityId(0),
            kind,
            is_part_of_identity: false,
            renames_base_property: None,
            is_required: true,
            is_optional: false,
            is_required_collection: false,
            is_optional_collection: false,
            is_weak_reference: false,
            is_delete_cascade: false,
            is_deprecated: false,
            deprecation_reason: None,
            facets: TypeFacets::default(),
            referenced_entity: None,
            merge_directives: Vec::new(),
            relational: PropertyRelational::default(),
        }
    }

    fn clear_cardinality(mut self) -> Self {
        self.is_part_of_identity = false;
        self.is_required = false;
        self.is_optional = false;
        self.is_required_collection = false;
        self.is_optional_collection = false;
        self
    }

    pub fn identity(self) -> Self {
        let mut property = self.clear_cardinality();
        property.is_part_of_identity = true;
        property
    }

    /// Identity property renaming the base entity's identity property `base_name`
    pub fn identity_rename(self, base_name: impl Into<String>) -> Self {
        let mut property = self.identity();
        property.renames_base_property = Some(base_name.into());
        property
    }

    pub fn required(self) -> Self {
        let mut property = self.clear_cardinality();
        property.is_required = true;
        property
    }

    pub fn optional(self) -> Self {
        let mut property = self.clear_cardinality();
        property.is_optional = true;
        property
    }

    pub fn required_collection(self) -> Self {
        let mut property = self.clear_cardinality();
        property.is_required_collection = true;
        property
    }

    pub fn optional_collection(self) -> Self {
        let mut property = self.clear_cardinality();
        property.is_optional_collection = true;
        property
    }

    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = role_name.into();
        self
    }

    pub fn with_shorten_to(mut self, shorten_to: impl Into<String>) -> Self {
        self.shorten_to = shorten_to.into();
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.facets.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, total_digits: u8, decimal_places: u8) -> Self {
        self.facets.total_digits = Some(total_digits);
        self.facets.decimal_places = Some(decimal_places);
        self
    }

    pub fn references(mut self, entity: EntityId) -> Self {
        self.referenced_entity = Some(entity);
        self
    }

    pub fn weak(mut self) -> Self {
        self.is_weak_reference = true;
        self
    }

    pub fn delete_cascade(mut self) -> Self {
        self.is_delete_cascade = true;
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.is_deprecated = true;
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn is_collection(&self) -> bool {
        self.is_required_collection || self.is_optional_collection
    }

    /// Optional cardinality in either its single or collection form
    pub fn is_optional_kind(&self) -> bool {
        self.is_optional || self.is_optional_collection
    }
}
