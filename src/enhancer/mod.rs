//! Schema derivation passes
//!
//! Each pass reads and mutates the shared [`CompileContext`]. The registration
//! order below is the execution order within a group; groups always run in
//! [`EnhancerGroup::ALL`] order.

pub mod base_reference;
pub mod cascade;
mod context;
pub mod delete_cascade;
pub mod foreign_key;
pub mod marker_columns;
mod pipeline;
pub mod post;
pub mod rows;
pub mod setup;
pub mod table;
pub mod usi;

pub use context::CompileContext;
pub use pipeline::{
    compile, compile_through, run_pipeline, EnhanceFn, Enhancer, EnhancerGroup, EnhancerResult, PipelineReport,
};

/// Version range for passes that only apply to 7.1+ targets
pub const OWNERSHIP_TOKEN_RANGE: &str = ">=7.1.0";
/// Version range for USI creation
pub const USI_RANGE: &str = ">=3.1.0";
/// Version range for education organization id index columns
pub const ED_ORG_ID_RANGE: &str = ">=7.0.0";
/// Version range for reverse foreign key index flagging
pub const REVERSE_INDEX_RANGE: &str = "<7.0.0";

/// The standard passes in execution order
pub fn enhancer_list() -> Vec<Enhancer> {
    use EnhancerGroup::*;

    vec![
        // Group 1: repository and base reference setup
        Enhancer::new(setup::REPOSITORY_SETUP, Setup, setup::initialize_repository),
        Enhancer::new(setup::PROPERTY_NAMING, Setup, setup::name_properties),
        Enhancer::new(setup::TABLE_NAMING, Setup, setup::name_tables),
        Enhancer::new(base_reference::ENHANCER_NAME, Setup, base_reference::enhance),
        // Group 2: property enhancement
        Enhancer::new(usi::ENHANCER_NAME, PropertyEnhancement, usi::enhance).gated(USI_RANGE),
        Enhancer::new(delete_cascade::ENHANCER_NAME, PropertyEnhancement, delete_cascade::enhance),
        // Group 3: table creation
        Enhancer::new(cascade::ENHANCER_NAME, TableCreation, cascade::enhance),
        Enhancer::new(table::BASE_DESCRIPTOR_TABLE, TableCreation, table::enhance_base_descriptor),
        Enhancer::new(table::DOMAIN_ENTITY_TABLE, TableCreation, table::enhance_domain_entities),
        Enhancer::new(table::ASSOCIATION_TABLE, TableCreation, table::enhance_associations),
        Enhancer::new(table::DOMAIN_ENTITY_SUBCLASS_TABLE, TableCreation, table::enhance_domain_entity_subclasses),
        Enhancer::new(table::ASSOCIATION_SUBCLASS_TABLE, TableCreation, table::enhance_association_subclasses),
        Enhancer::new(table::DOMAIN_ENTITY_EXTENSION_TABLE, TableCreation, table::enhance_domain_entity_extensions),
        Enhancer::new(table::ASSOCIATION_EXTENSION_TABLE, TableCreation, table::enhance_association_extensions),
        Enhancer::new(table::DESCRIPTOR_TABLE, TableCreation, table::enhance_descriptors),
        Enhancer::new(table::ENUMERATION_TABLE, TableCreation, table::enhance_enumerations),
        Enhancer::new(table::SCHOOL_YEAR_TABLE, TableCreation, table::enhance_school_year_enumerations),
        // Group 4: foreign keys
        Enhancer::new(foreign_key::ENHANCER_NAME, ForeignKeyCreation, foreign_key::enhance),
        // Group 5: seed rows
        Enhancer::new(rows::ENUMERATION_ROWS, RowPopulation, rows::enhance_enumeration_rows),
        Enhancer::new(rows::SCHOOL_YEAR_ROWS, RowPopulation, rows::enhance_school_year_rows),
        // Group 6: post creation
        Enhancer::new(post::FOREIGN_TABLE_RESOLUTION, PostCreation, post::resolve_foreign_tables),
        Enhancer::new(post::IDENTIFYING_FOREIGN_KEY, PostCreation, post::flag_identifying_foreign_keys),
        Enhancer::new(post::REVERSE_INDEX, PostCreation, post::flag_reverse_indexes).gated(REVERSE_INDEX_RANGE),
        Enhancer::new(post::DISCRIMINATOR, PostCreation, post::flag_discriminators),
        Enhancer::new(post::DEPRECATION, PostCreation, post::flag_deprecations),
        Enhancer::new(marker_columns::OWNERSHIP_TOKEN, PostCreation, marker_columns::add_ownership_token_columns)
            .gated(OWNERSHIP_TOKEN_RANGE),
        Enhancer::new(marker_columns::ED_ORG_ID_INDEX, PostCreation, marker_columns::flag_ed_org_id_columns)
            .gated(ED_ORG_ID_RANGE),
        Enhancer::new(post::FOREIGN_KEY_NAMING, PostCreation, post::name_foreign_keys),
    ]
}
