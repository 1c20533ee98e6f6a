//! Relational schema model produced by the pipeline

mod column;
mod foreign_key;
mod rows;
mod schema;
mod table;
mod transform;

pub use column::{column_sort_v7, merge_columns, Column, ColumnDataType, NameComponent};
pub use foreign_key::{ColumnPair, ForeignKey, SourceReference};
pub use rows::{EnumerationRow, SchoolYearEnumerationRow};
pub use schema::{NamespaceSchema, RelationalSchema};
pub use table::{PrimaryKeyOrdering, Table, TableExistenceReason, V7_COLUMN_LAYOUT};
pub use transform::ColumnTransform;
