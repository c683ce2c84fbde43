//! Priority search over strategies.
//!
//! For one field descriptor the resolver picks exactly one [`Strategy`]; the
//! first applicable level wins:
//!
//! 1. explicit per-field converter (unless it names the "no converter" sentinel)
//! 2. first global converter whose filter matches
//! 3. first `BEFORE` template whose filter matches
//! 4. nested persisted type (exact name, then any persisted supertype)
//! 5. primitive or boxed primitive
//! 6. array
//! 7. list
//! 8. map (reserved, always `NotImplemented`)
//! 9. natively supported object type
//! 10. type variable, through its bounds
//!
//! Nothing else matched: `UnknownType`, listing any `NEVER` template that
//! would have applied.
use indexmap::IndexSet;
use tracing::{debug, info};

use crate::analysis::{Analysis, Direction};
use crate::config::Config;
use crate::error::ResolveError;
use crate::field::FieldDescriptor;
use crate::registry::{Execution, StoreAccessorRegistry, MAP, SEQUENCE};
use crate::strategy::{object, Context, Strategy};
use crate::ty::{TypeDescriptor, TypeName};
use crate::universe::TypeUniverse;

/// Borrowed view over everything resolution reads. Cheap to build per pass.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    universe: &'r TypeUniverse,
    registry: &'r StoreAccessorRegistry,
    persisted: &'r IndexSet<TypeName>,
    config: &'r Config,
}

impl<'r> Resolver<'r> {
    pub fn new(
        universe: &'r TypeUniverse,
        registry: &'r StoreAccessorRegistry,
        persisted: &'r IndexSet<TypeName>,
        config: &'r Config,
    ) -> Self {
        Self { universe, registry, persisted, config }
    }

    pub fn universe(&self) -> &'r TypeUniverse { self.universe }
    pub fn registry(&self) -> &'r StoreAccessorRegistry { self.registry }
    pub fn config(&self) -> &'r Config { self.config }

    pub fn resolve(&self, field: &FieldDescriptor) -> Result<Strategy, ResolveError> {
        let strategy = self.search(field)?;
        debug!(
            class = %field.owner(),
            field = field.name(),
            depth = field.depth(),
            refined = %field.refined(),
            %strategy,
            "resolved"
        );
        Ok(strategy)
    }

    /// Resolves `field` and runs the winning strategy for `direction`.
    pub fn analyze(&self, field: &FieldDescriptor, direction: Direction) -> Result<Analysis, ResolveError> {
        let strategy = self.resolve(field)?;
        strategy.analyze(&Context::new(self, field, direction))
    }

    fn search(&self, field: &FieldDescriptor) -> Result<Strategy, ResolveError> {
        let refined = field.refined();

        if let Some(converter) = field.converter().filter(|c| **c != self.config.no_converter) {
            return Ok(Strategy::converter(converter.clone()));
        }
        if let Some(global) = self.registry.converter_for(refined, self.universe) {
            return Ok(Strategy::converter(global.converter.clone()));
        }
        if let Some(template) = self.registry.template_for(refined, self.universe, Execution::Before) {
            return Ok(Strategy::template(template.clone()));
        }
        if self.is_persisted(refined) {
            return Ok(Strategy::nested());
        }
        if refined.primitive_or_boxed().is_some() {
            return Ok(Strategy::primitive(self.config.scalar_boxedness));
        }

        match refined {
            TypeDescriptor::Array(_) => return Ok(Strategy::array()),
            // variables never reach the nominal checks below
            TypeDescriptor::TypeVariable { .. } => return Ok(Strategy::generic()),
            _ => {}
        }

        if self.universe.is_assignable(refined, &TypeDescriptor::declared(SEQUENCE)) {
            return Ok(Strategy::collection());
        }
        if self.universe.is_assignable(refined, &TypeDescriptor::declared(MAP)) {
            return Err(ResolveError::not_implemented(field, refined));
        }
        if self.registry.accepts_object(refined, self.universe) {
            return Ok(Strategy::object().with_cast(object::DEFAULT_CAST));
        }

        Err(self.unknown(field))
    }

    fn is_persisted(&self, ty: &TypeDescriptor) -> bool {
        let Some(name) = ty.raw_name() else { return false };
        self.persisted.contains(name)
            || self
                .persisted
                .iter()
                .any(|persisted| self.universe.is_subtype(name, persisted))
    }

    fn unknown(&self, field: &FieldDescriptor) -> ResolveError {
        let refined = field.refined();
        let ignored: Vec<String> = self
            .registry
            .templates_matching(refined, self.universe, Execution::Never)
            .map(|template| template.name.clone())
            .collect();
        for name in &ignored {
            info!(class = %field.owner(), field = field.name(), template = %name, "matching template is marked NEVER");
        }
        ResolveError::unknown_type(field, refined).with_ignored_templates(ignored)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Bound, TypeConstraint, TypeFilter};
    use crate::registry::{Converter, Template};
    use crate::strategy::tests::{field, Fixture};
    use crate::strategy::{Boxedness, StrategyKind};
    use crate::universe::{TypeInfo, TypeKind};

    fn kind(fx: &Fixture, ty: &str) -> StrategyKind {
        fx.resolver().resolve(&field(ty)).unwrap().kind().clone()
    }

    #[test]
    fn built_in_priority() {
        let fx = Fixture::new();
        assert_eq!(kind(&fx, "long"), StrategyKind::Primitive(Boxedness::Unboxed));
        assert_eq!(kind(&fx, "java.lang.Long"), StrategyKind::Primitive(Boxedness::Unboxed));
        assert_eq!(kind(&fx, "long[]"), StrategyKind::Array);
        assert_eq!(kind(&fx, "java.util.ArrayList<java.lang.String>"), StrategyKind::Collection);
        assert_eq!(kind(&fx, "java.lang.String"), StrategyKind::Object);
    }

    #[test]
    fn maps_are_reserved() {
        let fx = Fixture::new();
        let err = fx.resolver().resolve(&field("java.util.HashMap<java.lang.String, java.lang.String>")).unwrap_err();
        assert!(matches!(err, ResolveError::NotImplemented { .. }));
    }

    #[test]
    fn templates_come_after_converters_and_before_built_ins() {
        let mut fx = Fixture::new();
        let string_filter = TypeFilter::new(TypeConstraint::new("java.lang.String", Bound::Exactly));
        let template = Template {
            name: "strings".into(),
            filter: string_filter.clone(),
            execution: Execution::Before,
            save: "{{store}}.putString(\"{{keyName}}\", {{fieldName}}.trim());".into(),
            restore: "{{fieldName}} = {{store}}.getString(\"{{keyName}}\");".into(),
            save_pre: vec![],
            save_post: vec![],
            restore_pre: vec![],
            restore_post: vec![],
        };
        fx.registry = StoreAccessorRegistry::new(vec![], vec![template.clone()]).unwrap();
        assert!(matches!(kind(&fx, "java.lang.String"), StrategyKind::Template(t) if t.name == "strings"));

        fx.registry = StoreAccessorRegistry::new(
            vec![Converter { converter: TypeName::from("com.example.Trim"), filter: string_filter }],
            vec![template],
        )
        .unwrap();
        assert_eq!(kind(&fx, "java.lang.String"), StrategyKind::Converter(TypeName::from("com.example.Trim")));
    }

    #[test]
    fn configured_boxedness_reaches_primitives() {
        let mut fx = Fixture::new();
        fx.config.scalar_boxedness = Boxedness::Follow;
        assert_eq!(fx.method(&field("java.lang.Integer")), "Integer");
        assert_eq!(fx.method(&field("int")), "Int");
    }

    #[test]
    fn unknown_types_name_the_field() {
        let mut fx = Fixture::new();
        fx.universe.insert(TypeInfo::new("com.example.Opaque", TypeKind::Class));
        let err = fx.resolver().resolve(&field("com.example.Opaque")).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownType {
                class: TypeName::from("com.example.Host"),
                field: "value".into(),
                ty: "com.example.Opaque".into(),
                ignored_templates: vec![],
            }
        );
    }
}
