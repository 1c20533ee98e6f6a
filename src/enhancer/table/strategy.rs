//! Build strategy threaded through column creation

use crate::database::ColumnTransform;
use crate::model::PropertyId;

/// Context accumulated while descending through inline commons, choices and references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStrategy {
    /// Concatenated context prefixes of enclosing inline properties
    pub parent_context: String,
    pub parent_context_properties: Vec<PropertyId>,
    /// Full-name paths whose columns are merged away and must not be built
    pub skip_paths: Vec<Vec<String>>,
    /// Identity properties produce not-null rather than key columns
    pub suppress_primary_key: bool,
    pub leaf_columns_nullable: bool,
}

impl BuildStrategy {
    pub fn append_parent_context(&self, property: PropertyId, context_prefix: &str) -> Self {
        let mut next = self.clone();
        next.parent_context.push_str(context_prefix);
        next.parent_context_properties.push(property);
        next
    }

    pub fn with_skip_paths(&self, extra: impl IntoIterator<Item = Vec<String>>) -> Self {
        let mut next = self.clone();
        next.skip_paths
            .extend(extra.into_iter().filter(|path| !path.is_empty()));
        next
    }

    pub fn suppress_primary_key_creation(&self) -> Self {
        Self {
            suppress_primary_key: true,
            ..self.clone()
        }
    }

    pub fn make_leaf_columns_nullable(&self) -> Self {
        Self {
            leaf_columns_nullable: true,
            ..self.clone()
        }
    }

    /// Strategy for descending into the property named `full_name`.
    ///
    /// Returns `None` when every skip path naming the property ends at it, meaning
    /// its columns are merged away. Otherwise the returned strategy carries only
    /// the remainders of the paths that continue through it.
    pub fn for_property(&self, full_name: &str) -> Option<Self> {
        let on_path: Vec<&Vec<String>> = self
            .skip_paths
            .iter()
            .filter(|path| path.first().map(String::as_str) == Some(full_name))
            .collect();
        if !on_path.is_empty() && on_path.iter().all(|path| path.len() == 1) {
            return None;
        }

        let mut next = self.clone();
        next.skip_paths = on_path
            .into_iter()
            .filter(|path| path.len() > 1)
            .map(|path| path[1..].to_vec())
            .collect();
        Some(next)
    }

    /// Apply the leaf nullability override to a key/nullability choice
    pub fn leaf_columns(&self, transform: ColumnTransform) -> ColumnTransform {
        if self.leaf_columns_nullable {
            transform.make_null()
        } else {
            transform
        }
    }
}
