//! Delete-cascade flagging for reference properties

use anyhow::Result;

use super::{CompileContext, EnhancerResult};
use crate::model::PropertyKind;

pub const ENHANCER_NAME: &str = "DeleteCascadePrimaryKeyEnhancer";

/// Base references from subclasses and extensions always cascade deletes;
/// other references cascade when the model says so.
pub fn enhance(ctx: &mut CompileContext) -> Result<EnhancerResult> {
    if !ctx.has_repository() {
        return Ok(EnhancerResult::failure(ENHANCER_NAME));
    }

    for property in ctx
        .model
        .properties
        .iter_mut()
        .filter(|p| p.kind == PropertyKind::Reference)
    {
        let relational = &mut property.relational;
        relational.delete_cascade_primary_key = relational.is_reference_to_superclass
            || relational.is_reference_to_extension_parent
            || property.is_delete_cascade;
    }
    Ok(EnhancerResult::success(ENHANCER_NAME))
}
