//! Entity flattening
//!
//! Computes each entity's table-building property list, its identity as seen by
//! references, and its full property list. Subclasses and extensions inherit
//! from their base, so bases are processed first. Unless a subclass renames a
//! base identity property, it also gets a synthetic identity reference to its
//! base; that reference is what later becomes the subclass or extension
//! foreign key.

use anyhow::Result;
use tracing::debug;

use super::{CompileContext, EnhancerResult};
use crate::model::{EntityId, MetaModel, Property, PropertyId, PropertyKind};

pub const ENHANCER_NAME: &str = "TopLevelEntityBaseReferenceEnhancer";

pub fn enhance(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(ENHANCER_NAME));
    }

    for entity in ctx.entities_in_order()? {
        flatten(&mut ctx.model, entity);
    }
    Ok(EnhancerResult::success(ENHANCER_NAME))
}

/// The declared property that renames a base identity property, if any
pub fn identity_rename(model: &MetaModel, entity: EntityId) -> Option<PropertyId> {
    model
        .entity(entity)
        .properties
        .iter()
        .copied()
        .find(|p| model.property(*p).renames_base_property.is_some())
}

fn flatten(model: &mut MetaModel, entity: EntityId) {
    if model.entity(entity).relational.flattened {
        return;
    }
    // Marked before recursing so a malformed base cycle cannot loop
    model.entity_mut(entity).relational.flattened = true;

    let kind = model.entity(entity).kind;
    let declared = model.entity(entity).properties.clone();
    let own_identity: Vec<PropertyId> = declared
        .iter()
        .copied()
        .filter(|p| model.property(*p).relational.is_identity)
        .collect();

    let base = model
        .entity(entity)
        .base_entity
        .filter(|_| kind.is_subclass() || kind.is_extension());
    let Some(base) = base else {
        let relational = &mut model.entity_mut(entity).relational;
        relational.properties = declared.clone();
        relational.identity_properties = own_identity;
        relational.all_properties = declared;
        return;
    };

    flatten(model, base);
    let base_identity = model.entity(base).relational.identity_properties.clone();
    let base_all = model.entity(base).relational.all_properties.clone();

    let rename = identity_rename(model, entity);
    let renamed_base = rename.and_then(|r| {
        let renamed_name = model.property(r).renames_base_property.clone()?;
        base_identity
            .iter()
            .copied()
            .find(|b| model.property(*b).name == renamed_name)
    });

    // Identity as seen by references: the base identity with any renamed property substituted
    let mut identity: Vec<PropertyId> = base_identity
        .iter()
        .map(|b| match (renamed_base, rename) {
            (Some(renamed), Some(r)) if renamed == *b => r,
            _ => *b,
        })
        .collect();
    let added: Vec<PropertyId> = own_identity
        .iter()
        .copied()
        .filter(|p| Some(*p) != rename && !identity.contains(p))
        .collect();
    identity.extend(added);

    let mut all = base_all;
    all.extend(declared.iter().copied());

    let properties = if let Some(renamed) = renamed_base {
        debug!(
            "{} renames base identity property {}, skipping the base reference",
            model.entity(entity).name,
            model.property(renamed).name
        );
        let mut properties: Vec<PropertyId> = base_identity
            .iter()
            .copied()
            .filter(|b| *b != renamed)
            .collect();
        properties.extend(declared.iter().copied());
        properties
    } else {
        let base_name = model.entity(base).name.clone();
        let mut reference = Property::new(PropertyKind::Reference, base_name.clone())
            .identity()
            .references(base);
        reference.relational.full_name = base_name;
        reference.relational.is_identity = true;
        reference.relational.is_reference_to_superclass = kind.is_subclass();
        reference.relational.is_reference_to_extension_parent = kind.is_extension();
        let synthetic = model.add_synthetic_property(entity, reference);

        let mut properties = vec![synthetic];
        properties.extend(declared.iter().copied());
        properties
    };

    let relational = &mut model.entity_mut(entity).relational;
    relational.properties = properties;
    relational.identity_properties = identity;
    relational.all_properties = all;
}
