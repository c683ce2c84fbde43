use super::{CastPolicy, Context, StrategyConfig};
use crate::analysis::Analysis;
use crate::error::ResolveError;
use crate::registry::{PARCELABLE, SPARSE_ARRAY, SPARSE_FRAGMENT};
use crate::ty::TypeDescriptor;

pub(super) fn analyze(config: &StrategyConfig, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let refined = ctx.refined();
    let universe = ctx.universe();
    let parcelable = TypeDescriptor::declared(PARCELABLE);

    let (fragment, found) = if refined.is_named(SPARSE_ARRAY) {
        // keyed arrays only exist for parcelable values; there is no plain fallback
        match refined.type_args() {
            [value] if universe.is_assignable(value, &parcelable) => (
                SPARSE_FRAGMENT,
                TypeDescriptor::parameterized(SPARSE_ARRAY, vec![parcelable.clone()]),
            ),
            _ => return Err(ctx.unknown()),
        }
    } else {
        match ctx.registry().native_object(refined, universe) {
            Some(native) => (native.fragment(), native.descriptor()),
            None => return Err(ctx.unknown()),
        }
    };
    let method = format!("{fragment}{}", config.suffix);

    // the parcelable getter is generic over its return type
    let cast = if universe.is_assignable(ctx.field.declared(), &parcelable) {
        false
    } else {
        let store_type = config.target.clone().unwrap_or(found);
        ctx.cast_required(config.cast, &store_type)
    };
    Ok(ctx.store_call(&method, cast))
}

/// Cast policy the resolver starts object strategies with.
pub const DEFAULT_CAST: CastPolicy = CastPolicy::AutoCast;

// ------------------------------- Tests ------------------------------------ //
