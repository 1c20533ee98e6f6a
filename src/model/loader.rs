//! Load model documents produced by the upstream parser
//!
//! Each document is a JSON object holding one or more namespaces. Documents
//! are decoded independently, then merged by namespace name and linked: base
//! entities, referenced entities and merge directive paths are resolved from
//! names to arena ids. This is the only place names are resolved; the
//! pipeline only ever sees ids.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use encoding_rs::WINDOWS_1252;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::debug;

use super::{
    Entity, EntityId, EntityKind, EnumerationItem, MetaModel, NamespaceId, Property, PropertyId,
    PropertyKind, TypeFacets,
};
use crate::error::SchemaError;

/// Minimum number of files to benefit from parallel decoding.
const PARALLEL_THRESHOLD: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelDocument {
    #[serde(default)]
    namespaces: Vec<NamespaceDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceDocument {
    name: String,
    #[serde(default)]
    project_extension: Option<String>,
    #[serde(default)]
    is_extension: bool,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    entities: Vec<EntityDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityDocument {
    kind: EntityKind,
    name: String,
    #[serde(default)]
    base_entity: Option<String>,
    #[serde(default)]
    allow_primary_key_updates: bool,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    is_deprecated: bool,
    #[serde(default)]
    deprecation_reason: Option<String>,
    #[serde(default)]
    properties: Vec<PropertyDocument>,
    #[serde(default)]
    enumeration_items: Vec<EnumerationItemDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnumerationItemDocument {
    short_description: String,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
enum Cardinality {
    Identity,
    #[default]
    Required,
    Optional,
    RequiredCollection,
    OptionalCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyDocument {
    kind: PropertyKind,
    name: String,
    #[serde(default)]
    role_name: String,
    #[serde(default)]
    shorten_to: String,
    #[serde(default)]
    cardinality: Cardinality,
    /// Base identity property renamed by this identity property
    #[serde(default)]
    renames: Option<String>,
    #[serde(default)]
    is_weak: bool,
    #[serde(default)]
    delete_cascade: bool,
    #[serde(default)]
    is_deprecated: bool,
    #[serde(default)]
    deprecation_reason: Option<String>,
    #[serde(default)]
    max_length: Option<u32>,
    #[serde(default)]
    total_digits: Option<u8>,
    #[serde(default)]
    decimal_places: Option<u8>,
    /// Referenced entity name; defaults to the property name for non-simple kinds
    #[serde(default)]
    references: Option<String>,
    #[serde(default)]
    merge_directives: Vec<MergeDirectiveDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergeDirectiveDocument {
    /// Dotted path of full property names, starting with the property itself
    source_path: String,
    /// Dotted path of full property names, starting at the owning entity
    target_path: String,
}

/// Read a file as a string, trying UTF-8 first, then Windows-1252 as fallback
fn read_file_with_encoding_fallback(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let bytes = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes[3..].to_vec()
    } else {
        bytes
    };

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ))
            } else {
                Ok(decoded.into_owned())
            }
        }
    }
}

fn read_document(path: &Path) -> Result<ModelDocument> {
    let content =
        read_file_with_encoding_fallback(path).map_err(|e| SchemaError::ModelReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
    let document = serde_json::from_str(&content).map_err(|e| SchemaError::ModelParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(document)
}

/// Load and link model documents from files
pub fn load_model(files: &[PathBuf]) -> Result<MetaModel> {
    let mut documents = Vec::with_capacity(files.len());

    if files.len() >= PARALLEL_THRESHOLD {
        let results: Vec<Result<ModelDocument>> =
            files.par_iter().map(|file| read_document(file)).collect();
        for result in results {
            documents.push(result?);
        }
    } else {
        for file in files {
            documents.push(read_document(file)?);
        }
    }

    debug!("Decoded {} model documents", documents.len());
    link_documents(documents)
}

/// Load and link a single in-memory model document
pub fn load_model_from_str(json: &str) -> Result<MetaModel> {
    let document: ModelDocument =
        serde_json::from_str(json).map_err(|e| SchemaError::ModelParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
    link_documents(vec![document])
}

/// Pending name links collected while arena records are created
struct PendingLinks {
    bases: Vec<(EntityId, String)>,
    references: Vec<(PropertyId, String)>,
    merges: Vec<(PropertyId, MergeDirectiveDocument)>,
}

fn link_documents(documents: Vec<ModelDocument>) -> Result<MetaModel> {
    let mut model = MetaModel::new();
    let mut namespace_ids: HashMap<String, NamespaceId> = HashMap::new();
    let mut dependency_names: Vec<(NamespaceId, String)> = Vec::new();
    let mut pending = PendingLinks {
        bases: Vec::new(),
        references: Vec::new(),
        merges: Vec::new(),
    };

    for document in documents {
        for ns_doc in document.namespaces {
            let ns = *namespace_ids
                .entry(ns_doc.name.clone())
                .or_insert_with(|| model.add_namespace(ns_doc.name.clone(), ns_doc.is_extension));
            if let Some(tag) = ns_doc.project_extension {
                model.namespaces[ns.0].project_extension = tag;
            }
            dependency_names.extend(ns_doc.dependencies.into_iter().map(|d| (ns, d)));

            for entity_doc in ns_doc.entities {
                add_entity_document(&mut model, ns, entity_doc, &mut pending);
            }
        }
    }

    for (ns, dep_name) in dependency_names {
        let dep = namespace_ids.get(&dep_name).copied().ok_or_else(|| {
            SchemaError::UnresolvedReference {
                kind: "namespace",
                name: dep_name.clone(),
                namespace: model.namespace(ns).name.clone(),
            }
        })?;
        model.add_dependency(ns, dep);
    }

    for (entity, base_name) in pending.bases {
        let kind = model.entity(entity).kind;
        let ns = model.entity(entity).namespace;
        let base = model
            .find_entity(ns, &base_name, |k| base_kind_matches(kind, k))
            .ok_or_else(|| SchemaError::UnresolvedReference {
                kind: "base entity",
                name: base_name.clone(),
                namespace: model.namespace(ns).name.clone(),
            })?;
        model.set_base_entity(entity, base);
    }

    for (property, target_name) in pending.references {
        let kind = model.property(property).kind;
        let ns = model.entity(model.property(property).parent).namespace;
        let target = model
            .find_entity(ns, &target_name, |k| reference_kind_matches(kind, k))
            .ok_or_else(|| SchemaError::UnresolvedReference {
                kind: "referenced entity",
                name: target_name.clone(),
                namespace: model.namespace(ns).name.clone(),
            })?;
        model.property_mut(property).referenced_entity = Some(target);
    }

    for (property, directive) in pending.merges {
        let source: Vec<&str> = directive.source_path.split('.').collect();
        let target: Vec<&str> = directive.target_path.split('.').collect();
        model.add_merge_directive(property, &source, &target)?;
    }

    // Surfaces dependency cycles at load time
    model.dependency_order()?;
    Ok(model)
}

fn add_entity_document(
    model: &mut MetaModel,
    ns: NamespaceId,
    doc: EntityDocument,
    pending: &mut PendingLinks,
) {
    let mut entity = Entity::new(doc.kind, doc.name);
    entity.allow_primary_key_updates = doc.allow_primary_key_updates;
    entity.is_abstract = doc.is_abstract;
    entity.is_deprecated = doc.is_deprecated;
    entity.deprecation_reason = doc.deprecation_reason;
    entity.enumeration_items = doc
        .enumeration_items
        .into_iter()
        .map(|item| EnumerationItem {
            short_description: item.short_description,
        })
        .collect();
    let entity_id = model.add_entity(ns, entity);

    if let Some(base) = doc.base_entity {
        pending.bases.push((entity_id, base));
    }

    for prop_doc in doc.properties {
        let mut property = Property::new(prop_doc.kind, prop_doc.name.clone());
        property = match prop_doc.cardinality {
            Cardinality::Identity => property.identity(),
            Cardinality::Required => property.required(),
            Cardinality::Optional => property.optional(),
            Cardinality::RequiredCollection => property.required_collection(),
            Cardinality::OptionalCollection => property.optional_collection(),
        };
        property.renames_base_property = prop_doc.renames;
        property.role_name = prop_doc.role_name;
        property.shorten_to = prop_doc.shorten_to;
        property.is_weak_reference = prop_doc.is_weak;
        property.is_delete_cascade = prop_doc.delete_cascade;
        property.is_deprecated = prop_doc.is_deprecated;
        property.deprecation_reason = prop_doc.deprecation_reason;
        property.facets = TypeFacets {
            max_length: prop_doc.max_length,
            total_digits: prop_doc.total_digits,
            decimal_places: prop_doc.decimal_places,
        };
        let property_id = model.add_property(entity_id, property);

        if !prop_doc.kind.is_simple() {
            let target = prop_doc.references.unwrap_or(prop_doc.name);
            pending.references.push((property_id, target));
        }
        pending
            .merges
            .extend(prop_doc.merge_directives.into_iter().map(|md| (property_id, md)));
    }
}

fn base_kind_matches(kind: EntityKind, candidate: EntityKind) -> bool {
    match kind {
        EntityKind::DomainEntitySubclass => candidate == EntityKind::DomainEntity,
        EntityKind::DomainEntityExtension => matches!(
            candidate,
            EntityKind::DomainEntity | EntityKind::DomainEntitySubclass
        ),
        EntityKind::AssociationSubclass => candidate == EntityKind::Association,
        EntityKind::AssociationExtension => matches!(
            candidate,
            EntityKind::Association | EntityKind::AssociationSubclass
        ),
        _ => false,
    }
}

fn reference_kind_matches(kind: PropertyKind, candidate: EntityKind) -> bool {
    match kind {
        PropertyKind::Reference => candidate.is_top_level(),
        PropertyKind::Descriptor => candidate == EntityKind::Descriptor,
        PropertyKind::Enumeration => candidate == EntityKind::Enumeration,
        PropertyKind::SchoolYearEnumeration => candidate == EntityKind::SchoolYearEnumeration,
        PropertyKind::Common => candidate == EntityKind::Common,
        PropertyKind::InlineCommon => candidate == EntityKind::InlineCommon,
        PropertyKind::Choice => candidate == EntityKind::Choice,
        _ => false,
    }
}
