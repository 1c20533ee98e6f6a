//! Per-namespace containers for derived tables and rows

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{EnumerationRow, SchoolYearEnumerationRow, Table};
use crate::model::{MetaModel, NamespaceId};
use crate::util::schema_name;

/// Tables and rows derived for one namespace
#[derive(Debug, Clone, Default)]
pub struct NamespaceSchema {
    pub namespace: String,
    pub schema: String,
    tables: Vec<Table>,
    table_index: HashMap<String, usize>,
    enumeration_rows: Vec<EnumerationRow>,
    school_year_rows: Vec<SchoolYearEnumerationRow>,
    enumeration_row_keys: HashSet<(String, String)>,
    school_year_row_keys: HashSet<(String, String)>,
}

impl NamespaceSchema {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            schema: schema_name(&namespace),
            namespace,
            ..Self::default()
        }
    }

    /// Add a table, replacing any table with the same id
    pub fn add_table(&mut self, table: Table) {
        if let Some(&index) = self.table_index.get(&table.table_id) {
            debug!("Replacing table {}.{}", self.schema, table.table_id);
            self.tables[index] = table;
            return;
        }
        self.table_index
            .insert(table.table_id.clone(), self.tables.len());
        self.tables.push(table);
    }

    pub fn get_table(&self, table_id: &str) -> Option<&Table> {
        self.table_index.get(table_id).map(|i| &self.tables[*i])
    }

    pub fn get_table_mut(&mut self, table_id: &str) -> Option<&mut Table> {
        let index = *self.table_index.get(table_id)?;
        Some(&mut self.tables[index])
    }

    pub fn contains_table(&self, table_id: &str) -> bool {
        self.table_index.contains_key(table_id)
    }

    /// Tables in creation order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.iter_mut()
    }

    /// Add an enumeration row; rows already present by key are ignored
    pub fn add_enumeration_row(&mut self, row: EnumerationRow) -> bool {
        if !self.enumeration_row_keys.insert(row.key()) {
            return false;
        }
        self.enumeration_rows.push(row);
        true
    }

    /// Add a school year row; rows already present by key are ignored
    pub fn add_school_year_row(&mut self, row: SchoolYearEnumerationRow) -> bool {
        if !self.school_year_row_keys.insert(row.key()) {
            return false;
        }
        self.school_year_rows.push(row);
        true
    }

    pub fn enumeration_rows(&self) -> &[EnumerationRow] {
        &self.enumeration_rows
    }

    pub fn school_year_rows(&self) -> &[SchoolYearEnumerationRow] {
        &self.school_year_rows
    }
}

/// Derived schema for every namespace, indexed like the model's namespaces
#[derive(Debug, Clone, Default)]
pub struct RelationalSchema {
    pub namespaces: Vec<NamespaceSchema>,
    initialized: bool,
}

impl RelationalSchema {
    /// One empty container per model namespace
    pub fn for_model(model: &MetaModel) -> Self {
        Self {
            namespaces: model
                .namespaces
                .iter()
                .map(|ns| NamespaceSchema::new(ns.name.clone()))
                .collect(),
            initialized: true,
        }
    }

    /// Containers were created for a model, even an empty one
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn namespace(&self, id: NamespaceId) -> &NamespaceSchema {
        &self.namespaces[id.0]
    }

    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut NamespaceSchema {
        &mut self.namespaces[id.0]
    }

    pub fn namespace_by_name(&self, name: &str) -> Option<&NamespaceSchema> {
        self.namespaces.iter().find(|ns| ns.namespace == name)
    }

    pub fn namespace_by_name_mut(&mut self, name: &str) -> Option<&mut NamespaceSchema> {
        self.namespaces.iter_mut().find(|ns| ns.namespace == name)
    }

    pub fn find_table(&self, namespace: &str, table_id: &str) -> Option<&Table> {
        self.namespace_by_name(namespace)?.get_table(table_id)
    }

    pub fn find_table_mut(&mut self, namespace: &str, table_id: &str) -> Option<&mut Table> {
        self.namespace_by_name_mut(namespace)?
            .get_table_mut(table_id)
    }

    pub fn table_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.tables().len()).sum()
    }
}
