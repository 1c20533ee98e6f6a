//! Entity types of the input model

use serde::{Deserialize, Serialize};

use super::{EntityId, NamespaceId, PropertyId};

/// The closed set of entity kinds the modeling language declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    DomainEntity,
    DomainEntitySubclass,
    DomainEntityExtension,
    Association,
    AssociationSubclass,
    AssociationExtension,
    Descriptor,
    Enumeration,
    SchoolYearEnumeration,
    Common,
    InlineCommon,
    Choice,
}

impl EntityKind {
    /// Human-readable kind name used in log and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            EntityKind::DomainEntity => "domain entity",
            EntityKind::DomainEntitySubclass => "domain entity subclass",
            EntityKind::DomainEntityExtension => "domain entity extension",
            EntityKind::Association => "association",
            EntityKind::AssociationSubclass => "association subclass",
            EntityKind::AssociationExtension => "association extension",
            EntityKind::Descriptor => "descriptor",
            EntityKind::Enumeration => "enumeration",
            EntityKind::SchoolYearEnumeration => "school year enumeration",
            EntityKind::Common => "common",
            EntityKind::InlineCommon => "inline common",
            EntityKind::Choice => "choice",
        }
    }

    pub fn is_subclass(&self) -> bool {
        matches!(
            self,
            EntityKind::DomainEntitySubclass | EntityKind::AssociationSubclass
        )
    }

    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension
        )
    }

    /// Entities a reference property can point at, and that take part in update cascades
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            EntityKind::DomainEntity
                | EntityKind::DomainEntitySubclass
                | EntityKind::Association
                | EntityKind::AssociationSubclass
        )
    }

    /// Kinds whose properties are folded into the owner's table rather than their own
    pub fn is_inline(&self) -> bool {
        matches!(self, EntityKind::InlineCommon | EntityKind::Choice)
    }

    /// Kinds that produce a main table of their own
    pub fn creates_main_table(&self) -> bool {
        !matches!(
            self,
            EntityKind::Common | EntityKind::InlineCommon | EntityKind::Choice
        )
    }
}

/// An enumeration or school year item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationItem {
    pub short_description: String,
}

/// Data derived for an entity by the pipeline; the only part of an entity passes write
#[derive(Debug, Clone, Default)]
pub struct EntityRelational {
    /// Identifier of the entity's main table
    pub table_id: String,
    /// Properties that build the entity's tables, including synthetic ones
    pub properties: Vec<PropertyId>,
    /// Identity as seen by references to this entity, flattened from the base chain
    pub identity_properties: Vec<PropertyId>,
    /// Every property including those inherited from the base chain
    pub all_properties: Vec<PropertyId>,
    /// Set once the base reference pass has processed the entity
    pub flattened: bool,
    /// Primary key updates on this entity's table cascade to referencing tables
    pub cascade_primary_key_updates: bool,
}

/// A modeled business concept
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub namespace: NamespaceId,
    pub kind: EntityKind,
    /// Base entity for subclasses and extensions
    pub base_entity: Option<EntityId>,
    /// Properties declared directly on this entity
    pub properties: Vec<PropertyId>,
    pub allow_primary_key_updates: bool,
    pub is_abstract: bool,
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
    pub enumeration_items: Vec<EnumerationItem>,
    pub relational: EntityRelational,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: EntityId(0),
            name: name.into(),
            namespace: NamespaceId(0),
            kind,
            base_entity: None,
            properties: Vec::new(),
            allow_primary_key_updates: false,
            is_abstract: false,
            is_deprecated: false,
            deprecation_reason: None,
            enumeration_items: Vec::new(),
            relational: EntityRelational::default(),
        }
    }
}
