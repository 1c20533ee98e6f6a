//! Column transforms applied uniformly to every column a property produces

use super::{Column, NameComponent};

/// Named strategy for forcing key/nullability status and applying role-name prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTransform {
    Unchanged,
    PrimaryKey,
    NotNull,
    Null,
    /// Apply the inner transform, then make the column nullable and non-key
    MakeNull(Box<ColumnTransform>),
    PrimaryKeyRoleName(String),
    NotNullRoleName(String),
    NullRoleName(String),
    /// Prefix with a parent context unless the id already starts with it; constraints untouched
    CollapsibleRoleName(String),
}

impl ColumnTransform {
    /// Wrap in `MakeNull` unless it already is one
    pub fn make_null(self) -> Self {
        match self {
            ColumnTransform::MakeNull(_) => self,
            other => ColumnTransform::MakeNull(Box::new(other)),
        }
    }

    /// Role-name variant for a key/nullability choice
    pub fn with_role_name(self, prefix: &str) -> Self {
        let prefix = prefix.to_string();
        match self {
            ColumnTransform::PrimaryKey | ColumnTransform::PrimaryKeyRoleName(_) => {
                ColumnTransform::PrimaryKeyRoleName(prefix)
            }
            ColumnTransform::NotNull | ColumnTransform::NotNullRoleName(_) => {
                ColumnTransform::NotNullRoleName(prefix)
            }
            ColumnTransform::Null | ColumnTransform::NullRoleName(_) => {
                ColumnTransform::NullRoleName(prefix)
            }
            ColumnTransform::MakeNull(inner) => (*inner).with_role_name(&prefix).make_null(),
            ColumnTransform::Unchanged | ColumnTransform::CollapsibleRoleName(_) => {
                ColumnTransform::CollapsibleRoleName(prefix)
            }
        }
    }

    pub fn transform(&self, columns: Vec<Column>) -> Vec<Column> {
        columns
            .into_iter()
            .map(|mut column| {
                self.apply(&mut column);
                column
            })
            .collect()
    }

    fn apply(&self, column: &mut Column) {
        match self {
            ColumnTransform::Unchanged => {}
            ColumnTransform::PrimaryKey => set_primary_key(column),
            ColumnTransform::NotNull => set_not_null(column),
            ColumnTransform::Null => set_null(column),
            ColumnTransform::MakeNull(inner) => {
                inner.apply(column);
                set_null(column);
            }
            ColumnTransform::PrimaryKeyRoleName(prefix) => {
                set_primary_key(column);
                prefix_role_name(column, prefix);
            }
            ColumnTransform::NotNullRoleName(prefix) => {
                set_not_null(column);
                prefix_role_name(column, prefix);
            }
            ColumnTransform::NullRoleName(prefix) => {
                set_null(column);
                prefix_role_name(column, prefix);
            }
            ColumnTransform::CollapsibleRoleName(prefix) => {
                if !prefix.is_empty() && !column.column_id.starts_with(prefix.as_str()) {
                    column.column_id = format!("{}{}", prefix, column.column_id);
                    column
                        .name_components
                        .insert(0, NameComponent::parent_context(prefix.clone()));
                }
            }
        }
    }
}

fn set_primary_key(column: &mut Column) {
    column.is_part_of_primary_key = true;
    column.is_nullable = false;
}

fn set_not_null(column: &mut Column) {
    column.is_part_of_primary_key = false;
    column.is_nullable = false;
}

fn set_null(column: &mut Column) {
    column.is_part_of_primary_key = false;
    column.is_nullable = true;
}

fn prefix_role_name(column: &mut Column, prefix: &str) {
    if prefix.is_empty() {
        return;
    }
    column.column_id = format!("{}{}", prefix, column.column_id);
    column
        .name_components
        .insert(0, NameComponent::role_name(prefix));
}
