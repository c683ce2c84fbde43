//! Ordered sequences stored as the store's growable list.
//!
//! The store only knows one concrete list. Saving any other list copies it
//! into that form first; restoring copies back out for the few list types
//! with a usable copy constructor and refuses the rest.
use super::{Boxedness, CastPolicy, Context, Strategy, StrategyConfig};
use crate::analysis::{Analysis, Direction};
use crate::error::ResolveError;
use crate::registry::{ALTERNATE_LISTS, BOXED_INTEGER, CANONICAL_LIST, PARCELABLE, SEQUENCE};
use crate::ty::{TypeDescriptor, TypeName};

const SUFFIX: &str = "ArrayList";

pub(super) fn analyze(config: &StrategyConfig, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let refined = ctx.refined();
    let universe = ctx.universe();
    let Some(raw) = refined.raw_name() else {
        return Err(ctx.unknown());
    };
    if !universe.is_assignable(refined, &TypeDescriptor::declared(SEQUENCE)) {
        return Err(ctx.unknown());
    }

    // checked for both directions so a class never generates half its code
    let restore_form = restore_form(raw).ok_or_else(|| ctx.unknown())?;

    let args = refined.type_args();
    let [element] = args else {
        return unsupported_elements(ctx, refined);
    };

    let (child, element) = if element.is_named(BOXED_INTEGER) {
        (Strategy::primitive(Boxedness::Boxed), element.clone())
    } else if universe.is_assignable(element, &TypeDescriptor::declared(PARCELABLE)) {
        (Strategy::object(), TypeDescriptor::declared(PARCELABLE))
    } else if let Some(simple) = ctx.registry().collection_simple_element(element, universe) {
        (Strategy::object(), simple)
    } else {
        return unsupported_elements(ctx, refined);
    };
    let child = child
        .with_suffix(SUFFIX)
        .with_target(TypeDescriptor::parameterized(CANONICAL_LIST, vec![element.clone()]))
        .with_cast(CastPolicy::NoCast);

    match ctx.direction {
        Direction::Save => {
            let field = if raw == CANONICAL_LIST {
                ctx.field.refine(element)
            } else {
                ctx.field
                    .wrap_read(|read| format!("new {CANONICAL_LIST}<>({read})"))
                    .refine(element)
            };
            ctx.cascade_field(config, child, field)
        }
        Direction::Restore => {
            // a forced cast applies to the copied list, not the store call inside it
            let forced = config.cast == CastPolicy::ForceCast;
            let inner = StrategyConfig { cast: CastPolicy::NoCast, ..config.clone() };
            let analysis = ctx.cascade(&inner, child, element)?;
            let analysis = match restore_form {
                RestoreForm::AsIs => analysis,
                RestoreForm::Copy(list) => analysis.wrap_value(|value| format!("new {list}<>({value})")),
            };
            Ok(if forced {
                let cast = ctx.field.declared().to_string();
                analysis.wrap_value(|value| format!("({cast}) {value}"))
            } else {
                analysis
            })
        }
    }
}

enum RestoreForm {
    AsIs,
    Copy(&'static str),
}

fn restore_form(raw: &TypeName) -> Option<RestoreForm> {
    // the runtime type behind a declared ArrayList cannot be checked here
    if raw == CANONICAL_LIST || raw == SEQUENCE {
        return Some(RestoreForm::AsIs);
    }
    ALTERNATE_LISTS
        .iter()
        .copied()
        .find(|list| raw == *list)
        .map(RestoreForm::Copy)
}

/// Element-wise persistence is not supported. Each argument is still run
/// through the resolver so an unpersistable element reports itself first.
fn unsupported_elements(ctx: &Context<'_, '_>, refined: &TypeDescriptor) -> Result<Analysis, ResolveError> {
    for arg in refined.type_args() {
        ctx.resolver.resolve(&ctx.field.refine(arg.clone()))?;
    }
    Err(ctx.not_implemented(refined))
}

// ------------------------------- Tests ------------------------------------ //
