//! Per-field input to the resolver.
//!
//! Descriptors are values: cascading produces a new descriptor with a
//! narrower refined type and a deeper cascade counter, the original is never
//! touched.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ty::{TypeDescriptor, TypeName};

/// Which annotation put the field up for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// Instance state saved and restored across recreation.
    #[default]
    Retained,
    /// Launch arguments handed to the instance by an argument builder.
    Argument,
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnnotationKind::Retained => "retained",
            AnnotationKind::Argument => "argument",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// Defer to the next level (field → class → global).
    #[default]
    Default,
    Overwrite,
    IfNull,
    IfNotNull,
}

impl RestorePolicy {
    /// `self` unless it defers, in which case `fallback`.
    pub fn or(self, fallback: RestorePolicy) -> RestorePolicy {
        match self {
            RestorePolicy::Default => fallback,
            other => other,
        }
    }
}

// ------------------------------ Access ------------------------------------ //

/// How generated code reaches the field: `target` is assigned on restore,
/// `read` is evaluated on save and may carry wrapping transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccess {
    target: String,
    read: String,
}

impl FieldAccess {
    /// Plain `instance.field` access.
    pub fn field(instance: &str, name: &str) -> Self {
        let expr = format!("{instance}.{name}");
        Self { target: expr.clone(), read: expr }
    }

    pub fn target(&self) -> &str { &self.target }
    pub fn read(&self) -> &str { &self.read }

    pub fn wrapped(&self, wrap: impl FnOnce(&str) -> String) -> Self {
        Self { target: self.target.clone(), read: wrap(&self.read) }
    }
}

// ---------------------------- Descriptor ---------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    owner: TypeName,
    name: String,
    declared: TypeDescriptor,
    refined: TypeDescriptor,
    access: FieldAccess,
    key: String,
    depth: u32,
    skip: bool,
    converter: Option<TypeName>,
    restore_policy: RestorePolicy,
}

impl FieldDescriptor {
    pub fn new(owner: impl Into<TypeName>, name: impl Into<String>, declared: TypeDescriptor) -> Self {
        let name = name.into();
        Self {
            owner: owner.into(),
            access: FieldAccess::field("source", &name),
            key: name.clone(),
            name,
            refined: declared.clone(),
            declared,
            depth: 0,
            skip: false,
            converter: None,
            restore_policy: RestorePolicy::Default,
        }
    }

    pub fn with_access(mut self, access: FieldAccess) -> Self { self.access = access; self }
    pub fn with_key(mut self, key: impl Into<String>) -> Self { self.key = key.into(); self }
    pub fn with_skip(mut self, skip: bool) -> Self { self.skip = skip; self }
    pub fn with_converter(mut self, converter: Option<TypeName>) -> Self { self.converter = converter; self }
    pub fn with_restore_policy(mut self, policy: RestorePolicy) -> Self { self.restore_policy = policy; self }

    pub fn owner(&self) -> &TypeName { &self.owner }
    pub fn name(&self) -> &str { &self.name }
    pub fn declared(&self) -> &TypeDescriptor { &self.declared }
    pub fn refined(&self) -> &TypeDescriptor { &self.refined }
    pub fn access(&self) -> &FieldAccess { &self.access }
    pub fn key(&self) -> &str { &self.key }
    pub fn depth(&self) -> u32 { self.depth }
    pub fn skip(&self) -> bool { self.skip }
    pub fn converter(&self) -> Option<&TypeName> { self.converter.as_ref() }
    pub fn restore_policy(&self) -> RestorePolicy { self.restore_policy }

    /// Narrowed copy for one cascade step.
    pub fn refine(&self, refined: TypeDescriptor) -> Self {
        Self { refined, depth: self.depth + 1, ..self.clone() }
    }

    /// Copy whose save-side read expression is wrapped.
    pub fn wrap_read(&self, wrap: impl FnOnce(&str) -> String) -> Self {
        Self { access: self.access.wrapped(wrap), ..self.clone() }
    }
}

/// Key for a field that may shadow a same-named persisted ancestor field.
pub fn unique_key(name: &str, owner: &TypeName, shadows_ancestor: bool) -> String {
    if shadows_ancestor { format!("{name}_{owner}") } else { name.to_string() }
}

// ------------------------------- Tests ------------------------------------ //
