//! Serialized form of a derived schema and the files written for it

mod snapshot;
mod writer;

pub use snapshot::{ColumnSnapshot, ForeignKeySnapshot, NamespaceSnapshot, SchemaSnapshot, TableSnapshot};
pub use writer::{checksum, read_snapshot, write_output, Manifest, WrittenOutput};
