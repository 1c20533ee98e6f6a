//! Version-gated marker columns added after all tables exist

use anyhow::Result;
use tracing::{debug, warn};

use super::{CompileContext, EnhancerResult};
use crate::database::{Column, ColumnDataType};
use crate::model::MetaModel;

pub const OWNERSHIP_TOKEN: &str = "OwnershipTokenColumnEnhancer";
pub const ED_ORG_ID_INDEX: &str = "EducationOrganizationIdColumnEnhancer";

pub const OWNERSHIP_TOKEN_COLUMN: &str = "CreatedByOwnershipTokenId";
/// Entities at or below this one have identities used for authorization indexes
pub const EDUCATION_ORGANIZATION: &str = "EducationOrganization";

/// Aggregate root tables record the ownership token of the creating client
pub fn add_ownership_token_columns(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(OWNERSHIP_TOKEN));
    }

    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut().filter(|t| t.is_aggregate_root_table) {
            table.has_ownership_token_column = true;
            if table.get_column(OWNERSHIP_TOKEN_COLUMN).is_some() {
                warn!(
                    "{}.{} already has a {} column",
                    table.schema, table.table_id, OWNERSHIP_TOKEN_COLUMN
                );
                continue;
            }
            // Appended after the sort so the token is always the last column
            let mut column = Column::new(OWNERSHIP_TOKEN_COLUMN, ColumnDataType::Short);
            column.is_nullable = true;
            table.columns.push(column);
        }
    }
    Ok(EnhancerResult::success(OWNERSHIP_TOKEN))
}

/// The column holds an education organization identity value
fn is_ed_org_id_column(model: &MetaModel, column: &Column) -> bool {
    column.source_properties.last().is_some_and(|leaf| {
        let property = model.property(*leaf);
        property.relational.is_identity && model.is_or_descends_from(property.parent, EDUCATION_ORGANIZATION)
    })
}

pub fn flag_ed_org_id_columns(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(ED_ORG_ID_INDEX));
    }

    let model = &ctx.model;
    for namespace in &mut ctx.schema.namespaces {
        for table in namespace.tables_mut() {
            let ids: Vec<String> = table
                .columns
                .iter()
                .filter(|c| is_ed_org_id_column(model, c))
                .map(|c| c.column_id.clone())
                .collect();
            if !ids.is_empty() {
                debug!("{}.{} indexes {:?}", table.schema, table.table_id, ids);
            }
            table.ed_org_id_columns = ids;
        }
    }
    Ok(EnhancerResult::success(ED_ORG_ID_INDEX))
}
