//! Fields typed by a type variable.
//!
//! A single bound is just the bound. With an intersection the first bound
//! the resolver can handle wins, and because the field's static type is the
//! variable rather than that bound, the restore is always cast.
use tracing::debug;

use super::{CastPolicy, Context, StrategyConfig};
use crate::analysis::Analysis;
use crate::error::ResolveError;
use crate::ty::TypeDescriptor;

pub(super) fn analyze(config: &StrategyConfig, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let TypeDescriptor::TypeVariable { bounds, .. } = ctx.refined() else {
        return Err(ctx.unknown());
    };

    if let [bound] = bounds.as_slice() {
        let field = ctx.field.refine(bound.clone());
        let strategy = ctx.resolver.resolve(&field)?;
        return ctx.cascade_field(config, strategy, field);
    }

    for bound in bounds {
        let field = ctx.field.refine(bound.clone());
        match ctx.resolver.resolve(&field) {
            Ok(strategy) => {
                let strategy = strategy
                    .with_cast(CastPolicy::ForceCast)
                    .with_target(bound.clone());
                return ctx.cascade_field(config, strategy, field);
            }
            Err(error) => {
                debug!(class = %ctx.field.owner(), field = ctx.field.name(), %bound, %error, "bound rejected");
            }
        }
    }
    Err(ctx.unknown())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use crate::analysis::Direction;
    use crate::error::ResolveError;
    use crate::field::FieldDescriptor;
    use crate::strategy::tests::Fixture;
    use crate::ty::TypeDescriptor;

    fn var(bounds: &[&str]) -> FieldDescriptor {
        let bounds = bounds.iter().map(|b| TypeDescriptor::parse(b).unwrap()).collect();
        FieldDescriptor::new("com.example.Host", "value", TypeDescriptor::type_variable("T", bounds))
    }

    #[test]
    fn single_bound_resolves_through_the_bound() {
        let fx = Fixture::new();
        let f = var(&["java.lang.CharSequence"]);
        assert_eq!(fx.method(&f), "CharSequence");
        assert_eq!(
            fx.emit(&f, Direction::Restore).unwrap(),
            "source.value = (T) store.getCharSequence(\"value\");"
        );
    }

    #[test]
    fn parcelable_bound_needs_no_cast() {
        let fx = Fixture::new();
        let f = var(&["android.os.Parcelable"]);
        assert_eq!(
            fx.emit(&f, Direction::Restore).unwrap(),
            "source.value = store.getParcelable(\"value\");"
        );
    }

    #[test]
    fn intersection_skips_unresolvable_bounds_and_forces_cast() {
        let fx = Fixture::new();
        let f = var(&["java.lang.Comparable", "java.io.Serializable"]);
        assert_eq!(
            fx.emit(&f, Direction::Restore).unwrap(),
            "source.value = (T) store.getSerializable(\"value\");"
        );
    }

    #[test]
    fn forced_cast_wraps_the_copied_list() {
        let fx = Fixture::new();
        let f = var(&["java.lang.Comparable", "java.util.LinkedList<java.lang.String>"]);
        assert_eq!(
            fx.emit(&f, Direction::Restore).unwrap(),
            "source.value = (T) new java.util.LinkedList<>(store.getStringArrayList(\"value\"));"
        );
        assert_eq!(
            fx.emit(&var(&["java.lang.Comparable", "java.util.ArrayList<java.lang.String>"]), Direction::Restore).unwrap(),
            "source.value = (T) store.getStringArrayList(\"value\");"
        );
    }

    #[test]
    fn no_usable_bound_is_unknown() {
        let fx = Fixture::new();
        let err = fx.emit(&var(&["java.lang.Object"]), Direction::Save).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownType { .. }));
        let err = fx.emit(&var(&["java.lang.Comparable", "java.lang.Iterable"]), Direction::Save).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownType { ref ty, .. } if ty == "T"));
    }
}
