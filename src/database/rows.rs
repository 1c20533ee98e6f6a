//! Seed data rows for enumeration and school year lookup tables

use serde::{Deserialize, Serialize};

/// A row of an enumeration lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationRow {
    /// Lookup table id
    pub name: String,
    pub namespace: String,
    pub schema: String,
    pub code_value: String,
    pub description: String,
    pub short_description: String,
}

impl EnumerationRow {
    /// Deduplication key: lookup table id and description
    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.description.clone())
    }
}

/// A row of the school year lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolYearEnumerationRow {
    pub name: String,
    pub namespace: String,
    pub schema: String,
    pub school_year: i32,
    pub description: String,
    pub current_school_year: bool,
}

impl SchoolYearEnumerationRow {
    /// Deduplication key: lookup table id and description
    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.description.clone())
    }
}
