//! Type filters attached to converters and templates.
//!
//! A filter is one constraint on the raw type plus, optionally, one
//! constraint per type argument. A constraint names either an ordinary type
//! (matched structurally or by subtyping) or an annotation type (matched by
//! the annotation being present on the type's element).
use serde::{Deserialize, Serialize};

use crate::ty::{TypeDescriptor, TypeName};
use crate::universe::TypeUniverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Same erased type, or annotation declared directly on the element.
    #[default]
    Exactly,
    /// Assignable to the named type, or annotation present including inherited ones.
    Extends,
    /// Named type is a proper ancestor, or annotation present including inherited ones.
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConstraint {
    #[serde(rename = "type")]
    pub type_name: TypeName,
    #[serde(default)]
    pub bound: Bound,
}

impl TypeConstraint {
    pub fn new(type_name: impl Into<TypeName>, bound: Bound) -> Self {
        Self { type_name: type_name.into(), bound }
    }

    pub fn matches(&self, ty: &TypeDescriptor, universe: &TypeUniverse) -> bool {
        if universe.is_annotation(&self.type_name) {
            let present = match self.bound {
                Bound::Exactly => universe.declared_annotations(ty),
                Bound::Extends | Bound::Super => universe.inherited_annotations(ty),
            };
            return present.contains(&self.type_name);
        }

        let wanted = TypeDescriptor::declared(self.type_name.clone());
        match self.bound {
            Bound::Exactly => ty.erasure() == wanted,
            Bound::Extends => universe.is_assignable(ty, &wanted),
            Bound::Super => ty
                .raw_name()
                .is_some_and(|name| universe.ancestors(name).contains(&self.type_name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilter {
    #[serde(flatten)]
    pub raw: TypeConstraint,
    /// Positional constraints on the type arguments. Empty means "any".
    #[serde(default)]
    pub arguments: Vec<TypeConstraint>,
}

impl TypeFilter {
    pub fn new(raw: TypeConstraint) -> Self {
        Self { raw, arguments: Vec::new() }
    }

    pub fn with_arguments(mut self, arguments: Vec<TypeConstraint>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn matches(&self, ty: &TypeDescriptor, universe: &TypeUniverse) -> bool {
        if !self.raw.matches(ty, universe) {
            return false;
        }
        if self.arguments.is_empty() {
            return true;
        }
        let args = ty.type_args();
        args.len() == self.arguments.len()
            && self
                .arguments
                .iter()
                .zip(args)
                .all(|(constraint, arg)| constraint.matches(arg, universe))
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::{TypeInfo, TypeKind};

    fn d(text: &str) -> TypeDescriptor { TypeDescriptor::parse(text).unwrap() }

    fn universe() -> TypeUniverse {
        let mut u = TypeUniverse::platform();
        u.insert(TypeInfo::new("com.example.Keep", TypeKind::Annotation));
        u.insert(TypeInfo::new("com.example.Base", TypeKind::Class).annotated_with("com.example.Keep"));
        u.insert(TypeInfo::new("com.example.Child", TypeKind::Class).extends("com.example.Base"));
        u
    }

    #[test]
    fn exactly_ignores_generic_arguments() {
        let u = universe();
        let f = TypeFilter::new(TypeConstraint::new("java.util.List", Bound::Exactly));
        assert!(f.matches(&d("java.util.List<java.lang.String>"), &u));
        assert!(!f.matches(&d("java.util.ArrayList<java.lang.String>"), &u));
    }

    #[test]
    fn extends_includes_self_but_super_does_not() {
        let u = universe();
        let extends = TypeConstraint::new("com.example.Base", Bound::Extends);
        let sup = TypeConstraint::new("com.example.Base", Bound::Super);
        assert!(extends.matches(&d("com.example.Base"), &u));
        assert!(extends.matches(&d("com.example.Child"), &u));
        assert!(!sup.matches(&d("com.example.Base"), &u));
        assert!(sup.matches(&d("com.example.Child"), &u));
    }

    #[test]
    fn annotation_constraints_respect_inheritance() {
        let u = universe();
        let exact = TypeConstraint::new("com.example.Keep", Bound::Exactly);
        let inherited = TypeConstraint::new("com.example.Keep", Bound::Extends);
        assert!(exact.matches(&d("com.example.Base"), &u));
        assert!(!exact.matches(&d("com.example.Child"), &u));
        assert!(inherited.matches(&d("com.example.Child"), &u));
        assert!(exact.matches(&d("@com.example.Keep com.example.Other"), &u));
    }

    #[test]
    fn super_annotation_constraint_sees_inherited_annotations() {
        let u = universe();
        let sup = TypeConstraint::new("com.example.Keep", Bound::Super);
        assert!(sup.matches(&d("com.example.Base"), &u));
        assert!(sup.matches(&d("com.example.Child"), &u));
        assert!(!sup.matches(&d("java.lang.String"), &u));
    }

    #[test]
    fn annotation_constraints_apply_to_arguments() {
        let u = universe();
        let f = TypeFilter::new(TypeConstraint::new("java.util.List", Bound::Extends))
            .with_arguments(vec![TypeConstraint::new("com.example.Keep", Bound::Exactly)]);
        assert!(f.matches(&d("java.util.ArrayList<@com.example.Keep java.lang.String>"), &u));
        assert!(f.matches(&d("java.util.List<com.example.Base>"), &u));
        assert!(!f.matches(&d("java.util.List<com.example.Child>"), &u));
        assert!(!f.matches(&d("java.util.List<java.lang.String>"), &u));

        let inherited = TypeFilter::new(TypeConstraint::new("java.util.List", Bound::Extends))
            .with_arguments(vec![TypeConstraint::new("com.example.Keep", Bound::Extends)]);
        assert!(inherited.matches(&d("java.util.List<com.example.Child>"), &u));
    }

    #[test]
    fn argument_constraints_need_matching_arity() {
        let u = universe();
        let f = TypeFilter::new(TypeConstraint::new("java.util.List", Bound::Extends))
            .with_arguments(vec![TypeConstraint::new("java.lang.CharSequence", Bound::Extends)]);
        assert!(f.matches(&d("java.util.ArrayList<java.lang.String>"), &u));
        assert!(!f.matches(&d("java.util.ArrayList<java.lang.Integer>"), &u));
        assert!(!f.matches(&d("java.util.ArrayList"), &u));
    }

    #[test]
    fn filters_deserialize_from_model_json() {
        let f: TypeFilter = serde_json::from_str(
            r#"{"type": "java.util.Date", "bound": "extends"}"#
        ).unwrap();
        assert_eq!(f.raw.bound, Bound::Extends);
        assert!(f.arguments.is_empty());
    }
}
