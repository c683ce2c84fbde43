use super::{Context, StrategyConfig};
use crate::analysis::{Analysis, Direction, Statement};
use crate::error::ResolveError;
use crate::registry::Template;

/// Every name a host template may use.
pub const SCOPE_NAMES: &[&str] = &["fieldName", "keyName", "store", "methodName", "typeName", "cast", "castExpression"];

/// Host-supplied statements, rendered against the usual scope.
///
/// Besides the common names the scope offers `typeName` (the refined type's
/// text) and the `cast`/`castExpression` pair, so a template can cast when the
/// strategy was configured to.
pub(super) fn analyze(template: &Template, config: &StrategyConfig, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let refined = ctx.refined();
    let method = refined
        .raw_name()
        .map(|name| name.simple_name().to_string())
        .unwrap_or_else(|| refined.to_string());

    let mut scope = ctx.scope(&format!("{method}{}", config.suffix));
    scope.set("typeName", refined.to_string());
    let store_type = config.target.clone().unwrap_or_else(|| refined.clone());
    scope.set("cast", ctx.cast_required(config.cast, &store_type).to_string());
    scope.set("castExpression", ctx.field.declared().to_string());

    let (statement, pre, post) = match ctx.direction {
        Direction::Save => (&template.save, &template.save_pre, &template.save_post),
        Direction::Restore => (&template.restore, &template.restore_pre, &template.restore_post),
    };

    let mut analysis = Analysis::new(ctx.direction, scope, Statement::Raw(statement.clone()));
    for line in pre {
        analysis = analysis.pre(line).map_err(|e| ResolveError::template(ctx.field, e))?;
    }
    for line in post {
        analysis = analysis.post(line).map_err(|e| ResolveError::template(ctx.field, e))?;
    }
    Ok(analysis)
}

// ------------------------------- Tests ------------------------------------ //
