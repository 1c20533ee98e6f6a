//! State shared by every pass of one compilation

use anyhow::Result;
use semver::Version;

use crate::database::RelationalSchema;
use crate::model::{EntityId, EntityKind, MetaModel};

/// The model, the schema derived from it so far, and the target version.
///
/// Passes borrow the context mutably one at a time; nothing else holds the graph.
#[derive(Debug, Clone)]
pub struct CompileContext {
    pub model: MetaModel,
    pub schema: RelationalSchema,
    pub target_version: Version,
}

impl CompileContext {
    /// A context with no schema containers yet; the repository pass creates them
    pub fn new(model: MetaModel, target_version: Version) -> Self {
        Self {
            model,
            schema: RelationalSchema::default(),
            target_version,
        }
    }

    /// The repository pass ran and every model namespace has a schema container
    pub fn has_repository(&self) -> bool {
        self.schema.is_initialized()
            && self.schema.namespaces.len() == self.model.namespaces.len()
            && self
                .schema
                .namespaces
                .iter()
                .zip(&self.model.namespaces)
                .all(|(schema, ns)| schema.namespace == ns.name)
    }

    /// Entities in namespace dependency order, declaration order within a namespace
    pub fn entities_in_order(&self) -> Result<Vec<EntityId>> {
        let mut ids = Vec::with_capacity(self.model.entities.len());
        for ns in self.model.dependency_order()? {
            ids.extend(self.model.namespace(ns).entities.iter().copied());
        }
        Ok(ids)
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> Result<Vec<EntityId>> {
        Ok(self
            .entities_in_order()?
            .into_iter()
            .filter(|id| self.model.entity(*id).kind == kind)
            .collect())
    }
}
