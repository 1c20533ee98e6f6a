//! Arena holding the linked input model
//!
//! Namespaces, entities and properties live in flat vectors and refer to each
//! other by index. Cross references (base entity, referenced entity, merge
//! directive endpoints) are plain ids, so cyclic entity graphs need no shared
//! ownership.

use std::collections::{HashSet, VecDeque};

use anyhow::Result;

use super::{Entity, EntityKind, MergeDirective, Property};
use crate::error::SchemaError;
use crate::util::full_property_name;

/// Index of a namespace in the model arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub usize);

/// Index of an entity in the model arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

/// Index of a property in the model arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub usize);

/// A named partition of the model
#[derive(Debug, Clone)]
pub struct Namespace {
    pub id: NamespaceId,
    pub name: String,
    /// Extension project tag, empty for the core namespace
    pub project_extension: String,
    pub is_extension: bool,
    pub dependencies: Vec<NamespaceId>,
    /// Entities in declaration order
    pub entities: Vec<EntityId>,
}

/// The complete linked model
#[derive(Debug, Clone, Default)]
pub struct MetaModel {
    pub namespaces: Vec<Namespace>,
    pub entities: Vec<Entity>,
    pub properties: Vec<Property>,
}

impl MetaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_namespace(&mut self, name: impl Into<String>, is_extension: bool) -> NamespaceId {
        let id = NamespaceId(self.namespaces.len());
        let name = name.into();
        let project_extension = if is_extension {
            name.to_uppercase()
        } else {
            String::new()
        };
        self.namespaces.push(Namespace {
            id,
            name,
            project_extension,
            is_extension,
            dependencies: Vec::new(),
            entities: Vec::new(),
        });
        id
    }

    pub fn add_dependency(&mut self, namespace: NamespaceId, dependency: NamespaceId) {
        let deps = &mut self.namespaces[namespace.0].dependencies;
        if !deps.contains(&dependency) {
            deps.push(dependency);
        }
    }

    pub fn add_entity(&mut self, namespace: NamespaceId, mut entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        entity.id = id;
        entity.namespace = namespace;
        self.entities.push(entity);
        self.namespaces[namespace.0].entities.push(id);
        id
    }

    /// Add a declared property to an entity
    pub fn add_property(&mut self, entity: EntityId, property: Property) -> PropertyId {
        let id = self.add_detached_property(entity, property);
        self.entities[entity.0].properties.push(id);
        id
    }

    /// Add a pipeline-created property owned by `entity` without declaring it on the entity
    pub fn add_synthetic_property(&mut self, entity: EntityId, mut property: Property) -> PropertyId {
        property.relational.is_synthetic = true;
        self.add_detached_property(entity, property)
    }

    fn add_detached_property(&mut self, entity: EntityId, mut property: Property) -> PropertyId {
        let id = PropertyId(self.properties.len());
        property.id = id;
        property.parent = entity;
        self.properties.push(property);
        id
    }

    pub fn set_base_entity(&mut self, entity: EntityId, base: EntityId) {
        self.entities[entity.0].base_entity = Some(base);
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.0]
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    pub fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.0]
    }

    pub fn property_mut(&mut self, id: PropertyId) -> &mut Property {
        &mut self.properties[id.0]
    }

    pub fn namespace_by_name(&self, name: &str) -> Option<NamespaceId> {
        self.namespaces
            .iter()
            .find(|ns| ns.name == name)
            .map(|ns| ns.id)
    }

    /// Namespace owning an entity
    pub fn entity_namespace(&self, entity: EntityId) -> &Namespace {
        self.namespace(self.entity(entity).namespace)
    }

    /// Find an entity by name in `namespace` or, failing that, its dependencies (breadth first).
    pub fn find_entity(
        &self,
        namespace: NamespaceId,
        name: &str,
        accept: impl Fn(EntityKind) -> bool,
    ) -> Option<EntityId> {
        let mut queue = VecDeque::from([namespace]);
        let mut seen = HashSet::new();
        while let Some(ns) = queue.pop_front() {
            if !seen.insert(ns) {
                continue;
            }
            let namespace = self.namespace(ns);
            let found = namespace.entities.iter().copied().find(|id| {
                let entity = self.entity(*id);
                entity.name == name && accept(entity.kind)
            });
            if found.is_some() {
                return found;
            }
            queue.extend(namespace.dependencies.iter().copied());
        }
        None
    }

    /// Namespaces ordered so every namespace follows its dependencies.
    pub fn dependency_order(&self) -> Result<Vec<NamespaceId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }

        fn visit(
            model: &MetaModel,
            ns: NamespaceId,
            marks: &mut [Mark],
            stack: &mut Vec<NamespaceId>,
            order: &mut Vec<NamespaceId>,
        ) -> Result<()> {
            match marks[ns.0] {
                Mark::Done => return Ok(()),
                Mark::Visiting => {
                    let start = stack.iter().position(|n| *n == ns).unwrap_or(0);
                    let mut chain: Vec<&str> = stack[start..]
                        .iter()
                        .map(|n| model.namespace(*n).name.as_str())
                        .collect();
                    chain.push(model.namespace(ns).name.as_str());
                    return Err(SchemaError::NamespaceCycle {
                        chain: chain.join(" -> "),
                    }
                    .into());
                }
                Mark::Unvisited => {}
            }
            marks[ns.0] = Mark::Visiting;
            stack.push(ns);
            for dep in &model.namespace(ns).dependencies {
                visit(model, *dep, marks, stack, order)?;
            }
            stack.pop();
            marks[ns.0] = Mark::Done;
            order.push(ns);
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.namespaces.len()];
        let mut order = Vec::with_capacity(self.namespaces.len());
        let mut stack = Vec::new();
        for ns in &self.namespaces {
            visit(self, ns.id, &mut marks, &mut stack, &mut order)?;
        }
        Ok(order)
    }

    /// The first non-extension namespace in dependency order
    pub fn core_namespace(&self) -> Option<NamespaceId> {
        let order = self.dependency_order().ok()?;
        order
            .into_iter()
            .find(|ns| !self.namespace(*ns).is_extension)
    }

    /// Base entities from the immediate base up to the root
    pub fn base_chain(&self, entity: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut current = self.entity(entity).base_entity;
        while let Some(base) = current {
            if chain.contains(&base) || base == entity {
                break;
            }
            chain.push(base);
            current = self.entity(base).base_entity;
        }
        chain
    }

    /// True when the entity is named `name` or has an ancestor with that name
    pub fn is_or_descends_from(&self, entity: EntityId, name: &str) -> bool {
        self.entity(entity).name == name
            || self
                .base_chain(entity)
                .iter()
                .any(|base| self.entity(*base).name == name)
    }

    /// Declared properties of the base chain (root first) followed by the entity's own
    pub fn declared_properties_with_base(&self, entity: EntityId) -> Vec<PropertyId> {
        let mut properties = Vec::new();
        for base in self.base_chain(entity).iter().rev() {
            properties.extend(self.entity(*base).properties.iter().copied());
        }
        properties.extend(self.entity(entity).properties.iter().copied());
        properties
    }

    /// Walk a path of full property names starting at `entity`, following references.
    pub fn resolve_property_path(&self, entity: EntityId, path: &[&str]) -> Option<Vec<PropertyId>> {
        let mut resolved = Vec::with_capacity(path.len());
        let mut current = Some(entity);
        for segment in path {
            let owner = current?;
            let property = self
                .declared_properties_with_base(owner)
                .into_iter()
                .find(|id| {
                    let p = self.property(*id);
                    full_property_name(&p.role_name, &p.name) == *segment
                })?;
            resolved.push(property);
            current = self.property(property).referenced_entity;
        }
        Some(resolved)
    }

    /// Attach a merge directive to a reference property, resolving both paths.
    ///
    /// The source path starts with the property itself; the target path starts at
    /// the property's owning entity.
    pub fn add_merge_directive(
        &mut self,
        property: PropertyId,
        source_path: &[&str],
        target_path: &[&str],
    ) -> Result<()> {
        let owner = self.property(property).parent;
        let unresolved = |path: &[&str]| SchemaError::UnresolvedReference {
            kind: "merge path",
            name: path.join("."),
            namespace: self.entity_namespace(owner).name.clone(),
        };

        let source = self
            .resolve_property_path(owner, source_path)
            .ok_or_else(|| unresolved(source_path))?;
        let target = self
            .resolve_property_path(owner, target_path)
            .ok_or_else(|| unresolved(target_path))?;
        let (Some(source_property), Some(target_property)) = (source.last(), target.last()) else {
            return Err(unresolved(source_path).into());
        };

        let directive = MergeDirective {
            source_path: source_path.iter().map(|s| s.to_string()).collect(),
            target_path: target_path.iter().map(|s| s.to_string()).collect(),
            source_property: *source_property,
            target_property: *target_property,
        };
        self.property_mut(property).merge_directives.push(directive);
        Ok(())
    }
}
