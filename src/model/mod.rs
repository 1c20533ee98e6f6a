//! Input model: namespaces, entities and properties

mod entity;
mod loader;
mod meta_model;
mod property;

pub use entity::{Entity, EntityKind, EntityRelational, EnumerationItem};
pub use loader::{load_model, load_model_from_str};
pub use meta_model::{EntityId, MetaModel, Namespace, NamespaceId, PropertyId};
pub use property::{MergeDirective, Property, PropertyKind, PropertyRelational, TypeFacets};
