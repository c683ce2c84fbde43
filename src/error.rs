//! Resolution and generation failures.
//!
//! Every variant names the owning class and field so a failure can be traced
//! back to its declaration without the descriptor at hand.
use crate::analysis::TemplateError;
use crate::field::{AnnotationKind, FieldDescriptor};
use crate::ty::{TypeDescriptor, TypeName};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("{class}.{field}: no strategy persists `{ty}`{}", ignored_suffix(.ignored_templates))]
    UnknownType {
        class: TypeName,
        field: String,
        ty: String,
        /// `NEVER` templates whose filter matched.
        ignored_templates: Vec<String>,
    },
    #[error("{class}.{field}: `{shape}` is not supported yet")]
    NotImplemented { class: TypeName, field: String, shape: String },
    /// Never produced: the first match wins at every priority level.
    #[error("{class}.{field}: ambiguous filters {candidates:?}")]
    AmbiguousFilter { class: TypeName, field: String, candidates: Vec<String> },
    #[error("{class}.{field}: {source}")]
    Template {
        class: TypeName,
        field: String,
        #[source]
        source: TemplateError,
    },
}

fn ignored_suffix(ignored: &[String]) -> String {
    if ignored.is_empty() {
        String::new()
    } else {
        format!(" (ignored NEVER templates: {})", ignored.join(", "))
    }
}

impl ResolveError {
    pub fn unknown_type(field: &FieldDescriptor, ty: &TypeDescriptor) -> Self {
        Self::UnknownType {
            class: field.owner().clone(),
            field: field.name().to_string(),
            ty: ty.to_string(),
            ignored_templates: Vec::new(),
        }
    }

    pub fn not_implemented(field: &FieldDescriptor, shape: &TypeDescriptor) -> Self {
        Self::NotImplemented {
            class: field.owner().clone(),
            field: field.name().to_string(),
            shape: shape.to_string(),
        }
    }

    pub fn template(field: &FieldDescriptor, source: TemplateError) -> Self {
        Self::Template {
            class: field.owner().clone(),
            field: field.name().to_string(),
            source,
        }
    }

    pub fn with_ignored_templates(self, names: Vec<String>) -> Self {
        match self {
            Self::UnknownType { class, field, ty, .. } => Self::UnknownType { class, field, ty, ignored_templates: names },
            other => other,
        }
    }

    pub fn class(&self) -> &TypeName {
        match self {
            Self::UnknownType { class, .. }
            | Self::NotImplemented { class, .. }
            | Self::AmbiguousFilter { class, .. }
            | Self::Template { class, .. } => class,
        }
    }
}

/// A class failed; none of its code was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot generate {kind} accessor for {class}")]
pub struct GenerationError {
    pub class: TypeName,
    pub kind: AnnotationKind,
    #[source]
    pub source: ResolveError,
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_class_and_field() {
        let field = FieldDescriptor::new("com.example.A", "blob", TypeDescriptor::declared("java.lang.Object"));
        let err = ResolveError::unknown_type(&field, field.refined());
        assert_eq!(err.to_string(), "com.example.A.blob: no strategy persists `java.lang.Object`");

        let err = err.with_ignored_templates(vec!["objects".into()]);
        assert_eq!(
            err.to_string(),
            "com.example.A.blob: no strategy persists `java.lang.Object` (ignored NEVER templates: objects)"
        );
        assert_eq!(err.class(), "com.example.A");
    }

    #[test]
    fn generation_error_keeps_source() {
        let field = FieldDescriptor::new("com.example.A", "blob", TypeDescriptor::declared("java.lang.Object"));
        let err = GenerationError {
            class: field.owner().clone(),
            kind: AnnotationKind::Argument,
            source: ResolveError::unknown_type(&field, field.refined()),
        };
        assert_eq!(err.to_string(), "cannot generate argument accessor for com.example.A");
        assert!(std::error::Error::source(&err).is_some());
    }
}
