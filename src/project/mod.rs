//! Project file parsing and model document discovery

mod config;

pub use config::{parse_project, ProjectConfig, SchemaProject};
