//! USI creation
//!
//! An entity identified by a string `UniqueId` gets a generated integer `USI`
//! key instead. The unique id stays on the table as a non-key unique column, and
//! every entity whose flattened identity includes it switches to the USI.

use anyhow::Result;
use tracing::debug;

use super::setup::context_prefix;
use super::{CompileContext, EnhancerResult};
use crate::model::{EntityId, MetaModel, Property, PropertyId, PropertyKind};
use crate::util::full_property_name;

pub const ENHANCER_NAME: &str = "CreateUsisFromUniqueIdsEnhancer";

const UNIQUE_ID: &str = "UniqueId";
const USI: &str = "USI";

struct Replacement {
    owner: EntityId,
    unique_id: PropertyId,
    usi: PropertyId,
}

fn is_unique_id(model: &MetaModel, property: PropertyId) -> bool {
    let p = model.property(property);
    p.kind == PropertyKind::String && p.name == UNIQUE_ID && p.relational.is_identity
}

pub fn enhance(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(ENHANCER_NAME));
    }

    let model = &mut ctx.model;
    let candidates: Vec<(EntityId, PropertyId)> = {
        let m: &MetaModel = model;
        m.entities
            .iter()
            .flat_map(|e| e.properties.iter().map(move |p| (e.id, *p)))
            .filter(|(_, p)| is_unique_id(m, *p))
            .collect()
    };

    let mut replacements = Vec::with_capacity(candidates.len());
    for (owner, unique_id) in candidates {
        let role_name = model.property(unique_id).role_name.clone();
        let mut usi = Property::new(PropertyKind::Integer, USI)
            .identity()
            .with_role_name(role_name.clone());
        usi.relational.full_name = full_property_name(&role_name, USI);
        usi.relational.context_prefix = context_prefix(&role_name, USI, "");
        usi.relational.is_identity = true;
        usi.relational.is_usi = true;
        let usi = model.add_synthetic_property(owner, usi);

        let demoted = &mut model.property_mut(unique_id).relational;
        demoted.is_identity = false;
        demoted.is_unique_index = true;

        model.entity_mut(owner).relational.properties.insert(0, usi);
        debug!(
            "Created {} for {}",
            model.property(usi).relational.full_name,
            model.entity(owner).name
        );
        replacements.push(Replacement {
            owner,
            unique_id,
            usi,
        });
    }

    // Swap the unique id for its USI in every identity, including inherited ones.
    // Only the owner keeps the unique id column itself.
    for entity in model.entities.iter_mut() {
        for replacement in &replacements {
            for p in entity.relational.identity_properties.iter_mut() {
                if *p == replacement.unique_id {
                    *p = replacement.usi;
                }
            }
            if entity.id == replacement.owner {
                continue;
            }
            for p in entity.relational.properties.iter_mut() {
                if *p == replacement.unique_id {
                    *p = replacement.usi;
                }
            }
        }
    }

    Ok(EnhancerResult::success(ENHANCER_NAME))
}
