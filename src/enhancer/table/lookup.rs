//! Fixed-shape lookup tables: the shared descriptor base, enumerations and school years

use semver::Version;

use crate::database::{Column, ColumnDataType, Table, TableExistenceReason};
use crate::util::schema_name;

pub const BASE_DESCRIPTOR_TABLE_ID: &str = "Descriptor";
pub const BASE_DESCRIPTOR_KEY: &str = "DescriptorId";
pub const SCHOOL_YEAR_TABLE_ID: &str = "SchoolYearType";

fn key_column(column_id: impl Into<String>, data_type: ColumnDataType) -> Column {
    let mut column = Column::new(column_id, data_type);
    column.is_part_of_primary_key = true;
    column
}

fn string_column(column_id: &str, max_length: u32, nullable: bool) -> Column {
    let mut column = Column::new(column_id, ColumnDataType::String);
    column.max_length = Some(max_length);
    column.is_nullable = nullable;
    column
}

fn nullable(column_id: &str, data_type: ColumnDataType) -> Column {
    let mut column = Column::new(column_id, data_type);
    column.is_nullable = true;
    column
}

/// Columns of the base table every descriptor table extends
pub fn base_descriptor_columns() -> Vec<Column> {
    let mut id = key_column(BASE_DESCRIPTOR_KEY, ColumnDataType::Integer);
    id.is_identity_database_type = true;
    let mut namespace = string_column("Namespace", 255, false);
    namespace.is_part_of_alternate_key = true;
    let mut code_value = string_column("CodeValue", 50, false);
    code_value.is_part_of_alternate_key = true;

    vec![
        id,
        namespace,
        code_value,
        string_column("ShortDescription", 75, false),
        string_column("Description", 1024, true),
        nullable("PriorDescriptorId", ColumnDataType::Integer),
        nullable("EffectiveBeginDate", ColumnDataType::Date),
        nullable("EffectiveEndDate", ColumnDataType::Date),
    ]
}

/// The integer key column of a descriptor table
pub fn descriptor_key_column(table_id: &str) -> Column {
    key_column(format!("{}Id", table_id), ColumnDataType::Integer)
}

pub fn enumeration_columns(table_id: &str) -> Vec<Column> {
    let mut id = key_column(format!("{}Id", table_id), ColumnDataType::Integer);
    id.is_identity_database_type = true;
    vec![
        id,
        string_column("CodeValue", 50, false),
        string_column("Description", 1024, false),
        string_column("ShortDescription", 450, false),
    ]
}

pub fn school_year_columns() -> Vec<Column> {
    vec![
        key_column("SchoolYear", ColumnDataType::Short),
        string_column("SchoolYearDescription", 50, false),
        Column::new("CurrentSchoolYear", ColumnDataType::Boolean),
    ]
}

/// A lookup table holding `columns` in order
pub fn lookup_table(
    table_id: &str,
    namespace: &str,
    reason: TableExistenceReason,
    columns: Vec<Column>,
    version: &Version,
) -> Table {
    let mut table = Table::new(table_id, schema_name(namespace), namespace, reason, version);
    for column in columns {
        table.add_column(column, version);
    }
    table
}
