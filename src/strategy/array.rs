use super::{Boxedness, CastPolicy, Context, Strategy, StrategyConfig};
use crate::analysis::Analysis;
use crate::error::ResolveError;
use crate::ty::TypeDescriptor;

const SUFFIX: &str = "Array";

pub(super) fn analyze(config: &StrategyConfig, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let TypeDescriptor::Array(element) = ctx.refined() else {
        return Err(ctx.unknown());
    };
    let element = element.as_ref().clone();

    if let Some(kind) = element.as_primitive() {
        let child = Strategy::primitive(Boxedness::Unboxed)
            .with_suffix(SUFFIX)
            .with_target(TypeDescriptor::array_of(TypeDescriptor::primitive(kind)));
        return ctx.cascade(config, child, element);
    }

    match ctx.registry().object_array_element(&element, ctx.universe()) {
        // narrowed to the table entry so the accessor is named after it
        Some(found) => {
            let child = Strategy::object()
                .with_suffix(SUFFIX)
                .with_target(TypeDescriptor::array_of(found.clone()))
                .with_cast(CastPolicy::AutoCast);
            ctx.cascade(config, child, found)
        }
        None => Err(ctx.unknown()),
    }
}

// ------------------------------- Tests ------------------------------------ //
