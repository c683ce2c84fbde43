//! Generation session over a whole declaration model.
//!
//! Goals:
//! - Resolve every persisted field of a class in both directions and collect
//!   the statements into one [`GeneratedAccessor`], or fail the class as a whole.
//! - Go through the [`AccessorCache`] so each `(class, kind)` is generated once.
//! - Process independent classes in parallel.
//!
//! Usage:
//!
//! ```ignore
//! let cg = Codegen::new(&model, &config);
//! let results = cg.generate_all(AnnotationKind::Retained);
//! let text = Codegen::render(results.iter().filter_map(|r| r.as_ref().ok()));
//! ```
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::Direction;
use crate::cache::{AccessorCache, FieldStatement, GeneratedAccessor};
use crate::config::Config;
use crate::error::{GenerationError, ResolveError};
use crate::field::{AnnotationKind, FieldDescriptor, RestorePolicy};
use crate::model::{ClassModel, Model};
use crate::policy::RestorePolicyWrapper;
use crate::resolver::Resolver;
use crate::ty::TypeName;

pub struct Codegen<'m> {
    model: &'m Model,
    config: &'m Config,
    cache: AccessorCache,
    policy: RestorePolicyWrapper,
}

impl<'m> Codegen<'m> {
    pub fn new(model: &'m Model, config: &'m Config) -> Self {
        Self {
            model,
            config,
            cache: AccessorCache::new(),
            policy: RestorePolicyWrapper::new(config.restore_policy),
        }
    }

    pub fn cache(&self) -> &AccessorCache { &self.cache }

    pub fn resolver(&self) -> Resolver<'m> {
        Resolver::new(&self.model.universe, &self.model.registry, &self.model.persisted, self.config)
    }

    /// Cached accessor for one class.
    pub fn accessor(&self, class: &ClassModel, kind: AnnotationKind) -> Result<Arc<GeneratedAccessor>, GenerationError> {
        self.cache
            .get_or_try_insert_with(&class.name, kind, || self.generate(class, kind))
            .map_err(|source| GenerationError { class: class.name.clone(), kind, source })
    }

    /// Every class with fields of `kind`, in declaration order.
    pub fn generate_all(&self, kind: AnnotationKind) -> Vec<Result<Arc<GeneratedAccessor>, GenerationError>> {
        let classes: Vec<&ClassModel> = self.model.classes_with(kind).collect();
        classes.into_par_iter().map(|class| self.accessor(class, kind)).collect()
    }

    fn generate(&self, class: &ClassModel, kind: AnnotationKind) -> Result<GeneratedAccessor, ResolveError> {
        let resolver = self.resolver();
        let mut accessor = GeneratedAccessor::new(class.name.clone(), kind);

        for field in self.model.descriptors_of(class, kind, &self.config.instance) {
            if field.skip() {
                if let Some(converter) = field.converter() {
                    warn!(class = %class.name, field = field.name(), %converter, "skipped field names a converter");
                }
                continue;
            }
            for direction in [Direction::Save, Direction::Restore] {
                let code = self.emit(&resolver, &field, direction, class.restore_policy)?;
                accessor.push(
                    direction,
                    FieldStatement { field: field.name().to_string(), key: field.key().to_string(), code },
                );
            }
        }
        debug!(class = %class.name, %kind, fields = accessor.save.len(), "generated accessor");
        Ok(accessor)
    }

    fn emit(
        &self,
        resolver: &Resolver<'_>,
        field: &FieldDescriptor,
        direction: Direction,
        class_policy: RestorePolicy,
    ) -> Result<String, ResolveError> {
        let analysis = resolver.analyze(field, direction)?;
        self.policy
            .apply(analysis, field, class_policy)
            .emit()
            .map_err(|e| ResolveError::template(field, e))
    }

    /// Per-field resolution report for every class with fields of `kind`.
    pub fn explain(&self, kind: AnnotationKind) -> Vec<FieldExplanation> {
        let resolver = self.resolver();
        self.model
            .classes_with(kind)
            .flat_map(|class| {
                self.model
                    .descriptors_of(class, kind, &self.config.instance)
                    .into_iter()
                    .map(|field| self.explain_field(&resolver, class, &field))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn explain_field(&self, resolver: &Resolver<'_>, class: &ClassModel, field: &FieldDescriptor) -> FieldExplanation {
        let mut out = FieldExplanation {
            class: class.name.clone(),
            field: field.name().to_string(),
            key: field.key().to_string(),
            declared: field.declared().to_string(),
            skipped: field.skip(),
            restore_policy: self.policy.effective(field, class.restore_policy),
            strategy: None,
            method: None,
            cast: None,
            error: None,
        };
        if field.skip() {
            return out;
        }
        let explained = resolver.resolve(field).and_then(|strategy| {
            out.strategy = Some(strategy.to_string());
            resolver.analyze(field, Direction::Restore)
        });
        match explained {
            Ok(analysis) => {
                let scope = analysis.scope();
                out.method = scope.get("methodName").map(str::to_string);
                out.cast = scope.get("cast").map(|_| scope.is_truthy("cast"));
            }
            Err(error) => out.error = Some(error.to_string()),
        }
        out
    }

    /// Joins rendered accessors with a blank line between classes.
    pub fn render<'a>(accessors: impl IntoIterator<Item = &'a Arc<GeneratedAccessor>>) -> String {
        accessors
            .into_iter()
            .map(|accessor| accessor.render())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldExplanation {
    pub class: TypeName,
    pub field: String,
    pub key: String,
    pub declared: String,
    pub skipped: bool,
    pub restore_policy: RestorePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Accessor fragment, e.g. `IntegerArrayList`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Whether the restore casts; absent for strategies that never cast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ------------------------------- Tests ------------------------------------ //
