//! Update-cascade resolution
//!
//! Starting from every entity that allows primary key updates, cascading spreads
//! breadth first to entities whose identity references a cascading entity. Each
//! root gets its own graph of referenced -> referencing edges. A vertex with more
//! than one incoming edge is a diamond: the edge whose source table id sorts
//! first (case-insensitively) survives and the others are marked as causing a
//! cyclic update cascade. Pruning is a single pass over each root's final graph.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::Result;
use tracing::debug;

use super::{CompileContext, EnhancerResult};
use crate::model::{EntityId, MetaModel, PropertyId, PropertyKind};

pub const ENHANCER_NAME: &str = "UpdateCascadeTopLevelEntityEnhancer";

/// Referenced entity `from` cascades key updates into `to` through `property`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CascadeEdge {
    pub from: EntityId,
    pub to: EntityId,
    pub property: PropertyId,
}

pub fn enhance(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(ENHANCER_NAME));
    }
    let kept = resolve_update_cascades(&mut ctx.model);
    debug!("{} update cascade edges after pruning", kept.len());
    Ok(EnhancerResult::success(ENHANCER_NAME))
}

/// Referenced entity -> (referencing entity, identity reference property)
fn reverse_index(model: &MetaModel) -> HashMap<EntityId, Vec<(EntityId, PropertyId)>> {
    let mut index: HashMap<EntityId, Vec<(EntityId, PropertyId)>> = HashMap::new();
    for entity in model.entities.iter().filter(|e| e.kind.is_top_level()) {
        for property_id in &entity.relational.properties {
            let property = model.property(*property_id);
            if property.kind != PropertyKind::Reference || !property.relational.is_identity {
                continue;
            }
            if let Some(referenced) = property.referenced_entity {
                index
                    .entry(referenced)
                    .or_default()
                    .push((entity.id, *property_id));
            }
        }
    }
    index
}

/// Flag cascading entities and redundant cascade paths. Returns the surviving edges.
pub fn resolve_update_cascades(model: &mut MetaModel) -> Vec<CascadeEdge> {
    let index = reverse_index(model);
    let roots: Vec<EntityId> = model
        .entities
        .iter()
        .filter(|e| e.allow_primary_key_updates)
        .map(|e| e.id)
        .collect();

    let mut kept = Vec::new();
    for root in roots {
        model.entity_mut(root).relational.cascade_primary_key_updates = true;

        let mut graph: Vec<CascadeEdge> = Vec::new();
        let mut visited = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            let Some(referencing) = index.get(&current) else {
                continue;
            };
            for (to, property) in referencing {
                if *to == current {
                    continue;
                }
                graph.push(CascadeEdge {
                    from: current,
                    to: *to,
                    property: *property,
                });
                model.entity_mut(*to).relational.cascade_primary_key_updates = true;
                if visited.insert(*to) {
                    queue.push_back(*to);
                }
            }
        }

        prune_diamonds(model, &mut graph);
        kept.extend(graph);
    }
    kept
}

fn prune_diamonds(model: &mut MetaModel, graph: &mut Vec<CascadeEdge>) {
    let mut targets: Vec<EntityId> = Vec::new();
    for edge in graph.iter() {
        if !targets.contains(&edge.to) {
            targets.push(edge.to);
        }
    }

    let mut removed: HashSet<CascadeEdge> = HashSet::new();
    for target in targets {
        let mut incoming: Vec<CascadeEdge> = graph.iter().filter(|e| e.to == target).copied().collect();
        if incoming.len() < 2 {
            continue;
        }
        incoming.sort_by_key(|e| model.entity(e.from).relational.table_id.to_lowercase());
        for edge in incoming.iter().skip(1) {
            debug!(
                "Pruning update cascade {} -> {}",
                model.entity(edge.from).name,
                model.entity(edge.to).name
            );
            model
                .property_mut(edge.property)
                .relational
                .causes_cyclic_update_cascade = true;
            removed.insert(*edge);
        }
    }
    graph.retain(|e| !removed.contains(e));
}
