use super::Context;
use crate::analysis::{Analysis, Direction, Statement};
use crate::error::ResolveError;

const SAVE: &str = "{{store}}.putSubStore(\"{{keyName}}\", {{engine}}.serialize({{fieldName}}));";
const RESTORE: &str = "{{engine}}.deserialize({{fieldName}}, {{store}}.getSubStore(\"{{keyName}}\"))";

/// Hands the value to the persistence engine, which runs its own top-level
/// resolution over the nested type's fields.
pub(super) fn analyze(ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let mut scope = ctx.scope("SubStore");
    scope.set("engine", ctx.config().engine.as_str());
    let statement = match ctx.direction {
        Direction::Save => Statement::Raw(SAVE.to_string()),
        Direction::Restore => Statement::Assign {
            target: "{{fieldName}}".to_string(),
            value: RESTORE.to_string(),
        },
    };
    Ok(Analysis::new(ctx.direction, scope, statement))
}

// ------------------------------- Tests ------------------------------------ //
