//! Columns produced by a single property

use super::BuildStrategy;
use crate::database::{Column, ColumnDataType, ColumnTransform, NameComponent};
use crate::model::{MetaModel, Property, PropertyId, PropertyKind};
use crate::util::{full_property_name, strip_suffix};

/// Key and nullability choice for a property's columns
pub fn cardinality_transform(property: &Property, strategy: &BuildStrategy) -> ColumnTransform {
    let transform = if property.is_collection() {
        // Collection items are keyed in their child table
        ColumnTransform::PrimaryKey
    } else if property.relational.is_identity {
        if strategy.suppress_primary_key {
            ColumnTransform::NotNull
        } else {
            ColumnTransform::PrimaryKey
        }
    } else if property.is_optional {
        ColumnTransform::Null
    } else {
        ColumnTransform::NotNull
    };
    strategy.leaf_columns(transform)
}

/// Column id for a descriptor, enumeration or school year reference
pub fn lookup_column_id(property: &Property) -> String {
    match property.kind {
        PropertyKind::Descriptor => format!(
            "{}DescriptorId",
            full_property_name(&property.role_name, strip_suffix(&property.name, "Descriptor"))
        ),
        PropertyKind::Enumeration => format!(
            "{}TypeId",
            full_property_name(&property.role_name, strip_suffix(&property.name, "Type"))
        ),
        _ => property.relational.full_name.clone(),
    }
}

/// Builds the columns a property contributes to a table
pub struct ColumnCreator<'a> {
    model: &'a MetaModel,
}

impl<'a> ColumnCreator<'a> {
    pub fn new(model: &'a MetaModel) -> Self {
        Self { model }
    }

    /// Columns for a simple, lookup or reference property.
    ///
    /// Composite and collection handling belongs to the table builder; a composite
    /// property here yields no columns.
    pub fn create_columns(&self, property_id: PropertyId, strategy: &BuildStrategy) -> Vec<Column> {
        let property = self.model.property(property_id);
        match property.kind {
            PropertyKind::Reference => self.reference_columns(property, strategy),
            PropertyKind::Descriptor
            | PropertyKind::Enumeration
            | PropertyKind::SchoolYearEnumeration => {
                let data_type = if property.kind == PropertyKind::SchoolYearEnumeration {
                    ColumnDataType::Short
                } else {
                    ColumnDataType::Integer
                };
                let column = self.leaf_column(property, lookup_column_id(property), data_type);
                cardinality_transform(property, strategy).transform(vec![column])
            }
            kind => match ColumnDataType::from_property_kind(kind) {
                Some(data_type) => {
                    let column =
                        self.leaf_column(property, property.relational.full_name.clone(), data_type);
                    cardinality_transform(property, strategy).transform(vec![column])
                }
                None => Vec::new(),
            },
        }
    }

    fn leaf_column(&self, property: &Property, column_id: String, data_type: ColumnDataType) -> Column {
        let mut column = Column::new(column_id.clone(), data_type)
            .with_facets(&property.facets)
            .with_reference_context(property.relational.full_name.clone());

        let role_name = &property.role_name;
        if !role_name.is_empty() && *role_name != property.name {
            let base = column_id
                .strip_prefix(role_name.as_str())
                .unwrap_or(&column_id)
                .to_string();
            column.name_components = vec![NameComponent::role_name(role_name.clone()), NameComponent::base(base)];
        }
        column.is_unique_index = property.relational.is_unique_index;
        column.is_identity_database_type = property.relational.is_usi;
        column.is_deprecated = property.is_deprecated;
        column.source_properties = vec![property.id];
        column
    }

    /// The referenced entity's identity columns, prefixed by this property's context
    fn reference_columns(&self, property: &Property, strategy: &BuildStrategy) -> Vec<Column> {
        let Some(referenced) = property.referenced_entity else {
            return Vec::new();
        };

        // Merged-away paths below this property are never built
        let directive_paths = property
            .merge_directives
            .iter()
            .map(|d| d.source_path.iter().skip(1).cloned().collect::<Vec<String>>());
        let inner = BuildStrategy::default()
            .with_skip_paths(strategy.skip_paths.iter().cloned())
            .with_skip_paths(directive_paths);

        let mut columns = Vec::new();
        for identity in &self.model.entity(referenced).relational.identity_properties {
            let identity_property = self.model.property(*identity);
            let Some(identity_strategy) = inner.for_property(&identity_property.relational.full_name) else {
                continue;
            };
            columns.extend(self.create_columns(*identity, &identity_strategy));
        }

        for column in columns.iter_mut() {
            column.prepend_source(property.id, &property.relational.full_name);
            column.is_from_reference_property = true;
            column.is_identity_database_type = false;
            column.is_deprecated |= property.is_deprecated;
        }

        cardinality_transform(property, strategy)
            .with_role_name(&property.relational.context_prefix)
            .transform(columns)
    }
}
