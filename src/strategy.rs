//! Strategies: one per category of type, each turning a field into an
//! [`Analysis`] for a direction.
//!
//! A `Strategy` is a value. `with_target`, `with_suffix` and `with_cast`
//! return modified copies, so the same template strategy can be handed to
//! any number of cascades without configuration leaking between them.
//!
//! Cascading goes through [`Context::cascade`]: it narrows the field to a
//! refined type, appends the parent's suffix to the child's, carries a forced
//! cast down, and runs the child against the new descriptor.
pub mod array;
pub mod collection;
pub mod converter;
pub mod generic;
pub mod nested;
pub mod object;
pub mod primitive;
pub mod template;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::analysis::{Analysis, Direction, Scope, Statement};
use crate::config::Config;
use crate::error::ResolveError;
use crate::field::FieldDescriptor;
use crate::registry::{StoreAccessorRegistry, Template};
use crate::resolver::Resolver;
use crate::ty::{TypeDescriptor, TypeName};
use crate::universe::TypeUniverse;

pub use primitive::Boxedness;

// store call shapes shared by primitive and object strategies
const PUT: &str = "{{store}}.put{{methodName}}(\"{{keyName}}\", {{fieldName}});";
const GET: &str = "{{#cast}}({{castExpression}}) {{/cast}}{{store}}.get{{methodName}}(\"{{keyName}}\")";
const TARGET: &str = "{{fieldName}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastPolicy {
    #[default]
    NoCast,
    ForceCast,
    /// Cast only when the store's return type is not assignable to the field.
    AutoCast,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrategyConfig {
    /// Type requested from the store; the matched type when unset.
    pub target: Option<TypeDescriptor>,
    pub suffix: String,
    pub cast: CastPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyKind {
    Primitive(Boxedness),
    Array,
    Collection,
    Object,
    Generic,
    Converter(TypeName),
    Nested,
    Template(Arc<Template>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    kind: StrategyKind,
    config: StrategyConfig,
}

impl Strategy {
    fn of(kind: StrategyKind) -> Self { Self { kind, config: StrategyConfig::default() } }

    pub fn primitive(boxedness: Boxedness) -> Self { Self::of(StrategyKind::Primitive(boxedness)) }
    pub fn array() -> Self { Self::of(StrategyKind::Array) }
    pub fn collection() -> Self { Self::of(StrategyKind::Collection) }
    pub fn object() -> Self { Self::of(StrategyKind::Object) }
    pub fn generic() -> Self { Self::of(StrategyKind::Generic) }
    pub fn converter(converter: TypeName) -> Self { Self::of(StrategyKind::Converter(converter)) }
    pub fn nested() -> Self { Self::of(StrategyKind::Nested) }
    pub fn template(template: Arc<Template>) -> Self { Self::of(StrategyKind::Template(template)) }

    pub fn kind(&self) -> &StrategyKind { &self.kind }
    pub fn config(&self) -> &StrategyConfig { &self.config }

    pub fn with_target(&self, target: TypeDescriptor) -> Self {
        let mut next = self.clone();
        next.config.target = Some(target);
        next
    }

    /// Appends to the accumulated suffix.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut next = self.clone();
        next.config.suffix.push_str(suffix);
        next
    }

    pub fn with_cast(&self, cast: CastPolicy) -> Self {
        let mut next = self.clone();
        next.config.cast = cast;
        next
    }

    pub fn analyze(&self, ctx: &Context<'_, '_>) -> Result<Analysis, ResolveError> {
        match &self.kind {
            StrategyKind::Primitive(boxedness) => primitive::analyze(*boxedness, &self.config, ctx),
            StrategyKind::Array => array::analyze(&self.config, ctx),
            StrategyKind::Collection => collection::analyze(&self.config, ctx),
            StrategyKind::Object => object::analyze(&self.config, ctx),
            StrategyKind::Generic => generic::analyze(&self.config, ctx),
            StrategyKind::Converter(converter) => converter::analyze(converter, ctx),
            StrategyKind::Nested => nested::analyze(ctx),
            StrategyKind::Template(template) => template::analyze(template, &self.config, ctx),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StrategyKind::Primitive(boxedness) => write!(f, "primitive({boxedness})")?,
            StrategyKind::Array => f.write_str("array")?,
            StrategyKind::Collection => f.write_str("collection")?,
            StrategyKind::Object => f.write_str("object")?,
            StrategyKind::Generic => f.write_str("generic")?,
            StrategyKind::Converter(converter) => write!(f, "converter({converter})")?,
            StrategyKind::Nested => f.write_str("nested")?,
            StrategyKind::Template(template) => write!(f, "template({})", template.name)?,
        }
        if !self.config.suffix.is_empty() {
            write!(f, "+{}", self.config.suffix)?;
        }
        Ok(())
    }
}

// ------------------------------- Context ---------------------------------- //

/// One (field, direction) pair being analyzed at some cascade depth.
pub struct Context<'a, 'r> {
    pub resolver: &'a Resolver<'r>,
    pub field: &'a FieldDescriptor,
    pub direction: Direction,
}

impl<'a, 'r> Context<'a, 'r> {
    pub fn new(resolver: &'a Resolver<'r>, field: &'a FieldDescriptor, direction: Direction) -> Self {
        Self { resolver, field, direction }
    }

    pub fn universe(&self) -> &TypeUniverse { self.resolver.universe() }
    pub fn registry(&self) -> &StoreAccessorRegistry { self.resolver.registry() }
    pub fn config(&self) -> &Config { self.resolver.config() }
    pub fn refined(&self) -> &TypeDescriptor { self.field.refined() }

    /// Runs `child` on the field narrowed to `refined`.
    pub fn cascade(&self, parent: &StrategyConfig, child: Strategy, refined: TypeDescriptor) -> Result<Analysis, ResolveError> {
        self.cascade_field(parent, child, self.field.refine(refined))
    }

    /// Runs `child` on an already narrowed descriptor.
    pub fn cascade_field(&self, parent: &StrategyConfig, child: Strategy, field: FieldDescriptor) -> Result<Analysis, ResolveError> {
        let mut child = child.with_suffix(&parent.suffix);
        if parent.cast == CastPolicy::ForceCast {
            child = child.with_cast(CastPolicy::ForceCast);
        }
        trace!(
            class = %field.owner(),
            field = field.name(),
            depth = field.depth(),
            refined = %field.refined(),
            strategy = %child,
            "cascade"
        );
        child.analyze(&Context::new(self.resolver, &field, self.direction))
    }

    pub fn unknown_type(&self, ty: &TypeDescriptor) -> ResolveError {
        ResolveError::unknown_type(self.field, ty)
    }

    pub fn unknown(&self) -> ResolveError { self.unknown_type(self.refined()) }

    pub fn not_implemented(&self, shape: &TypeDescriptor) -> ResolveError {
        ResolveError::not_implemented(self.field, shape)
    }

    /// Substitutions every strategy provides.
    pub fn scope(&self, method: &str) -> Scope {
        let access = self.field.access();
        let mut scope = Scope::default();
        scope.set(
            "fieldName",
            match self.direction {
                Direction::Save => access.read(),
                Direction::Restore => access.target(),
            },
        );
        scope.set("keyName", self.field.key());
        scope.set("store", self.config().store.as_str());
        scope.set("methodName", method);
        scope
    }

    /// Whether a restore must cast what the store returns as `store_type`.
    pub fn cast_required(&self, policy: CastPolicy, store_type: &TypeDescriptor) -> bool {
        match policy {
            CastPolicy::NoCast => false,
            CastPolicy::ForceCast => true,
            CastPolicy::AutoCast => !self.universe().is_assignable(store_type, self.field.declared()),
        }
    }

    /// Plain `put<Method>` / `get<Method>` pair.
    pub fn store_call(&self, method: &str, cast: bool) -> Analysis {
        let mut scope = self.scope(method);
        scope.set("cast", cast.to_string());
        scope.set("castExpression", self.field.declared().to_string());
        let statement = match self.direction {
            Direction::Save => Statement::Raw(PUT.to_string()),
            Direction::Restore => Statement::Assign {
                target: TARGET.to_string(),
                value: GET.to_string(),
            },
        };
        Analysis::new(self.direction, scope, statement)
    }
}

// ------------------------------- Tests ------------------------------------ //
