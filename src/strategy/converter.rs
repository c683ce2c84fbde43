use super::Context;
use crate::analysis::{Analysis, Direction, Statement};
use crate::error::ResolveError;
use crate::ty::TypeName;

const SAVE: &str = "{{store}}.converterRegistry({{converter}}.class).save({{store}}, \"{{keyName}}\", {{fieldName}});";
const RESTORE: &str = "{{store}}.converterRegistry({{converter}}.class).restore({{store}}, \"{{keyName}}\")";

pub(super) fn analyze(converter: &TypeName, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let mut scope = ctx.scope(converter.simple_name());
    scope.set("converter", converter.as_str());
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

#[cfg(test)]
mod tests {
    use crate::analysis::Direction;
    use crate::filter::{Bound, TypeConstraint, TypeFilter};
    use crate::registry::{Converter, StoreAccessorRegistry};
    use crate::strategy::tests::{field, Fixture};
    use crate::strategy::Strategy;
    use crate::ty::TypeName;

    fn with_global_converter() -> Fixture {
        let mut fx = Fixture::new();
        fx.registry = StoreAccessorRegistry::new(
            vec![Converter {
                converter: TypeName::from("com.example.DateConverter"),
                filter: TypeFilter::new(TypeConstraint::new("java.util.Date", Bound::Extends)),
            }],
            vec![],
        )
        .unwrap();
        fx
    }

    #[test]
    fn global_converter_statements() {
        let fx = with_global_converter();
        let f = field("java.util.Date");
        assert_eq!(
            fx.emit(&f, Direction::Save).unwrap(),
            "store.converterRegistry(com.example.DateConverter.class).save(store, \"value\", source.value);"
        );
        assert_eq!(
            fx.emit(&f, Direction::Restore).unwrap(),
            "source.value = store.converterRegistry(com.example.DateConverter.class).restore(store, \"value\");"
        );
    }

    #[test]
    fn field_override_beats_global_converter() {
        let fx = with_global_converter();
        let f = field("java.util.Date").with_converter(Some(TypeName::from("com.example.EpochConverter")));
        assert_eq!(
            fx.resolver().resolve(&f).unwrap(),
            Strategy::converter(TypeName::from("com.example.EpochConverter"))
        );
    }

    #[test]
    fn sentinel_override_is_ignored() {
        let fx = with_global_converter();
        let sentinel = fx.config.no_converter.clone();
        let f = field("java.util.Date").with_converter(Some(sentinel));
        assert_eq!(
            fx.resolver().resolve(&f).unwrap(),
            Strategy::converter(TypeName::from("com.example.DateConverter"))
        );
    }
}
