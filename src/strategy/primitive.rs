use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Context, StrategyConfig};
use crate::analysis::Analysis;
use crate::error::ResolveError;
use crate::ty::TypeDescriptor;

/// Which spelling of a primitive names the accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boxedness {
    /// `Integer`
    Boxed,
    /// `Int`
    #[default]
    Unboxed,
    /// Boxed name for boxed fields, kind name for primitive ones.
    Follow,
}

impl fmt::Display for Boxedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Boxedness::Boxed => "boxed",
            Boxedness::Unboxed => "unboxed",
            Boxedness::Follow => "follow",
        })
    }
}

pub(super) fn analyze(boxedness: Boxedness, config: &StrategyConfig, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
    let refined = ctx.refined();
    let Some(kind) = refined.primitive_or_boxed() else {
        return Err(ctx.unknown());
    };

    let boxed = match boxedness {
        Boxedness::Boxed => true,
        Boxedness::Unboxed => false,
        Boxedness::Follow => refined.boxed_primitive().is_some(),
    };
    let fragment = if boxed {
        kind.boxed().simple_name().to_string()
    } else {
        kind.accessor_name().to_string()
    };
    let method = format!("{fragment}{}", config.suffix);

    let store_type = config.target.clone().unwrap_or_else(|| {
        if boxed { TypeDescriptor::declared(kind.boxed()) } else { TypeDescriptor::primitive(kind) }
    });
    let cast = ctx.cast_required(config.cast, &store_type);
    Ok(ctx.store_call(&method, cast))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Direction;
    use crate::strategy::tests::{field, Fixture};
    use crate::strategy::{CastPolicy, Strategy};
    use crate::ty::PrimitiveKind;

    #[test]
    fn every_kind_uses_its_capitalized_name() {
        let fx = Fixture::new();
        for kind in PrimitiveKind::ALL {
            let f = field(kind.keyword());
            let strategy = fx.resolver().resolve(&f).unwrap();
            assert_eq!(strategy, Strategy::primitive(Boxedness::Unboxed));
            assert_eq!(fx.method(&f), kind.accessor_name());
        }
        assert_eq!(fx.method(&field("boolean")), "Boolean");
    }

    #[test]
    fn boxed_fields_default_to_kind_name() {
        let fx = Fixture::new();
        let f = field("java.lang.Integer");
        assert_eq!(fx.method(&f), "Int");
        assert_eq!(
            fx.emit(&f, Direction::Restore).unwrap(),
            "source.value = store.getInt(\"value\");"
        );
    }

    #[test]
    fn follow_tracks_the_spelling() {
        let mut fx = Fixture::new();
        fx.config.scalar_boxedness = Boxedness::Follow;
        assert_eq!(fx.method(&field("java.lang.Character")), "Character");
        assert_eq!(fx.method(&field("char")), "Char");
    }

    #[test]
    fn save_and_restore_statements() {
        let fx = Fixture::new();
        let f = field("long");
        assert_eq!(fx.emit(&f, Direction::Save).unwrap(), "store.putLong(\"value\", source.value);");
        assert_eq!(fx.emit(&f, Direction::Restore).unwrap(), "source.value = store.getLong(\"value\");");
    }

    #[test]
    fn forced_cast_renders_declared_type() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let f = field("double");
        let ctx = Context::new(&resolver, &f, Direction::Restore);
        let analysis = analyze(
            Boxedness::Unboxed,
            &StrategyConfig { cast: CastPolicy::ForceCast, ..StrategyConfig::default() },
            &ctx,
        )
        .unwrap();
        assert_eq!(analysis.emit().unwrap(), "source.value = (double) store.getDouble(\"value\");");
    }
}
