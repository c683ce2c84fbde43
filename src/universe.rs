//! Nominal type knowledge: who extends whom, and who carries which annotation.
//!
//! The universe starts with the platform types the store registry mentions and
//! is extended from the declaration model. Unknown names are tolerated: they
//! are only assignable to themselves and to `java.lang.Object`.
use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ty::{TypeDescriptor, TypeName};

pub const OBJECT: &str = "java.lang.Object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Annotation,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: TypeName,
    pub kind: TypeKind,
    pub superclass: Option<TypeName>,
    pub interfaces: Vec<TypeName>,
    pub annotations: Vec<TypeName>,
}

impl TypeInfo {
    pub fn new(name: impl Into<TypeName>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<TypeName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn annotated_with(mut self, annotation: impl Into<TypeName>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    fn supertypes(&self) -> impl Iterator<Item = &TypeName> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}

// (name, kind, superclass, interfaces)
type Builtin = (&'static str, TypeKind, Option<&'static str>, &'static [&'static str]);

const BUILTINS: &[Builtin] = &[
    (OBJECT, TypeKind::Class, None, &[]),
    ("java.io.Serializable", TypeKind::Interface, None, &[]),
    ("java.lang.Cloneable", TypeKind::Interface, None, &[]),
    ("java.lang.Comparable", TypeKind::Interface, None, &[]),
    ("java.lang.CharSequence", TypeKind::Interface, None, &[]),
    ("java.lang.String", TypeKind::Class, Some(OBJECT), &["java.io.Serializable", "java.lang.Comparable", "java.lang.CharSequence"]),
    ("java.lang.Number", TypeKind::Class, Some(OBJECT), &["java.io.Serializable"]),
    ("java.lang.Boolean", TypeKind::Class, Some(OBJECT), &["java.io.Serializable", "java.lang.Comparable"]),
    ("java.lang.Character", TypeKind::Class, Some(OBJECT), &["java.io.Serializable", "java.lang.Comparable"]),
    ("java.lang.Byte", TypeKind::Class, Some("java.lang.Number"), &["java.lang.Comparable"]),
    ("java.lang.Short", TypeKind::Class, Some("java.lang.Number"), &["java.lang.Comparable"]),
    ("java.lang.Integer", TypeKind::Class, Some("java.lang.Number"), &["java.lang.Comparable"]),
    ("java.lang.Long", TypeKind::Class, Some("java.lang.Number"), &["java.lang.Comparable"]),
    ("java.lang.Float", TypeKind::Class, Some("java.lang.Number"), &["java.lang.Comparable"]),
    ("java.lang.Double", TypeKind::Class, Some("java.lang.Number"), &["java.lang.Comparable"]),
    ("java.lang.Iterable", TypeKind::Interface, None, &[]),
    ("java.util.Collection", TypeKind::Interface, None, &["java.lang.Iterable"]),
    ("java.util.List", TypeKind::Interface, None, &["java.util.Collection"]),
    ("java.util.Set", TypeKind::Interface, None, &["java.util.Collection"]),
    ("java.util.Queue", TypeKind::Interface, None, &["java.util.Collection"]),
    ("java.util.Deque", TypeKind::Interface, None, &["java.util.Queue"]),
    ("java.util.RandomAccess", TypeKind::Interface, None, &[]),
    ("java.util.AbstractCollection", TypeKind::Class, Some(OBJECT), &["java.util.Collection"]),
    ("java.util.AbstractList", TypeKind::Class, Some("java.util.AbstractCollection"), &["java.util.List"]),
    ("java.util.AbstractSequentialList", TypeKind::Class, Some("java.util.AbstractList"), &[]),
    ("java.util.ArrayList", TypeKind::Class, Some("java.util.AbstractList"), &["java.util.List", "java.util.RandomAccess", "java.lang.Cloneable", "java.io.Serializable"]),
    ("java.util.LinkedList", TypeKind::Class, Some("java.util.AbstractSequentialList"), &["java.util.List", "java.util.Deque", "java.lang.Cloneable", "java.io.Serializable"]),
    ("java.util.Vector", TypeKind::Class, Some("java.util.AbstractList"), &["java.util.List", "java.util.RandomAccess", "java.lang.Cloneable", "java.io.Serializable"]),
    ("java.util.Stack", TypeKind::Class, Some("java.util.Vector"), &[]),
    ("java.util.concurrent.CopyOnWriteArrayList", TypeKind::Class, Some(OBJECT), &["java.util.List", "java.util.RandomAccess", "java.lang.Cloneable", "java.io.Serializable"]),
    ("java.util.HashSet", TypeKind::Class, Some("java.util.AbstractCollection"), &["java.util.Set", "java.lang.Cloneable", "java.io.Serializable"]),
    ("java.util.Map", TypeKind::Interface, None, &[]),
    ("java.util.AbstractMap", TypeKind::Class, Some(OBJECT), &["java.util.Map"]),
    ("java.util.HashMap", TypeKind::Class, Some("java.util.AbstractMap"), &["java.util.Map", "java.lang.Cloneable", "java.io.Serializable"]),
    ("java.util.TreeMap", TypeKind::Class, Some("java.util.AbstractMap"), &["java.util.Map", "java.lang.Cloneable", "java.io.Serializable"]),
    ("java.util.Date", TypeKind::Class, Some(OBJECT), &["java.io.Serializable", "java.lang.Cloneable", "java.lang.Comparable"]),
    ("android.os.Parcelable", TypeKind::Interface, None, &[]),
    ("android.os.BaseBundle", TypeKind::Class, Some(OBJECT), &[]),
    ("android.os.Bundle", TypeKind::Class, Some("android.os.BaseBundle"), &["android.os.Parcelable", "java.lang.Cloneable"]),
    ("android.os.IBinder", TypeKind::Interface, None, &[]),
    ("android.os.Binder", TypeKind::Class, Some(OBJECT), &["android.os.IBinder"]),
    ("android.util.Size", TypeKind::Class, Some(OBJECT), &[]),
    ("android.util.SizeF", TypeKind::Class, Some(OBJECT), &[]),
    ("android.util.SparseArray", TypeKind::Class, Some(OBJECT), &["java.lang.Cloneable"]),
];

static PLATFORM: Lazy<IndexMap<TypeName, TypeInfo>> = Lazy::new(|| {
    BUILTINS
        .iter()
        .map(|(name, kind, superclass, interfaces)| {
            let info = TypeInfo {
                name: TypeName::from(*name),
                kind: *kind,
                superclass: superclass.map(TypeName::from),
                interfaces: interfaces.iter().map(|i| TypeName::from(*i)).collect(),
                annotations: Vec::new(),
            };
            (info.name.clone(), info)
        })
        .collect()
});

// ------------------------------- Universe --------------------------------- //

#[derive(Debug, Clone)]
pub struct TypeUniverse {
    types: IndexMap<TypeName, TypeInfo>,
}

impl Default for TypeUniverse {
    fn default() -> Self { Self::platform() }
}

impl TypeUniverse {
    /// Universe holding only the platform types.
    pub fn platform() -> Self {
        Self { types: PLATFORM.clone() }
    }

    /// Adds or replaces a type. Returns the previous entry.
    pub fn insert(&mut self, info: TypeInfo) -> Option<TypeInfo> {
        self.types.insert(info.name.clone(), info)
    }

    pub fn get(&self, name: &TypeName) -> Option<&TypeInfo> { self.types.get(name) }

    pub fn contains(&self, name: &TypeName) -> bool { self.types.contains_key(name) }

    pub fn is_annotation(&self, name: &TypeName) -> bool {
        self.get(name).is_some_and(|info| info.kind == TypeKind::Annotation)
    }

    /// Proper ancestors, breadth first, superclass before interfaces,
    /// without repeats. Interfaces and classes alike end at `java.lang.Object`.
    pub fn ancestors(&self, name: &TypeName) -> Vec<TypeName> {
        let mut seen: HashSet<TypeName> = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<TypeName> = VecDeque::new();
        seen.insert(name.clone());
        // held back so it always comes last
        seen.insert(TypeName::from(OBJECT));
        queue.push_back(name.clone());

        while let Some(current) = queue.pop_front() {
            let Some(info) = self.get(&current) else { continue };
            for parent in info.supertypes() {
                if seen.insert(parent.clone()) {
                    out.push(parent.clone());
                    queue.push_back(parent.clone());
                }
            }
        }
        if name != OBJECT {
            out.push(TypeName::from(OBJECT));
        }
        out
    }

    /// Nominal subtyping on erased names (reflexive).
    pub fn is_subtype(&self, from: &TypeName, to: &TypeName) -> bool {
        from == to || to == OBJECT || self.ancestors(from).iter().any(|a| a == to)
    }

    /// Whether a value of `from` can be stored into a slot of type `to`.
    ///
    /// Generic arguments are not compared (erasure semantics); boxing and
    /// unboxing conversions are allowed; arrays are covariant over reference
    /// elements; a type variable is assignable wherever one of its bounds is.
    pub fn is_assignable(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
        use TypeDescriptor as T;
        if from == to {
            return true;
        }
        match (from, to) {
            (T::Primitive(a), T::Primitive(b)) => a == b,
            (T::Primitive(kind), _) => {
                self.is_assignable(&TypeDescriptor::declared(kind.boxed()), to)
            }
            (_, T::Primitive(kind)) => from.boxed_primitive() == Some(*kind),
            (T::TypeVariable { name: a, .. }, T::TypeVariable { name: b, .. }) if a == b => true,
            (T::TypeVariable { bounds, .. }, _) => {
                to.is_named(OBJECT) || bounds.iter().any(|bound| self.is_assignable(bound, to))
            }
            (_, T::TypeVariable { .. }) => false,
            (T::Array(a), T::Array(b)) => match (a.as_ref(), b.as_ref()) {
                (T::Primitive(x), T::Primitive(y)) => x == y,
                (T::Primitive(_), _) | (_, T::Primitive(_)) => false,
                (x, y) => self.is_assignable(x, y),
            },
            (T::Array(_), _) => {
                to.is_named(OBJECT)
                    || to.is_named("java.io.Serializable")
                    || to.is_named("java.lang.Cloneable")
            }
            (_, T::Array(_)) => false,
            _ => match (from.raw_name(), to.raw_name()) {
                (Some(f), Some(t)) => self.is_subtype(f, t),
                _ => false,
            },
        }
    }

    /// Annotations written directly on the element of `ty`: the use-site ones
    /// plus those on the type's own declaration.
    pub fn declared_annotations(&self, ty: &TypeDescriptor) -> Vec<TypeName> {
        let mut out: Vec<TypeName> = ty.annotations().to_vec();
        if let Some(info) = ty.raw_name().and_then(|name| self.get(name)) {
            for a in &info.annotations {
                if !out.contains(a) { out.push(a.clone()); }
            }
        }
        out
    }

    /// Declared annotations plus everything carried by any ancestor.
    pub fn inherited_annotations(&self, ty: &TypeDescriptor) -> Vec<TypeName> {
        let mut out = self.declared_annotations(ty);
        let Some(name) = ty.raw_name() else { return out };
        for ancestor in self.ancestors(name) {
            if let Some(info) = self.get(&ancestor) {
                for a in &info.annotations {
                    if !out.contains(a) { out.push(a.clone()); }
                }
            }
        }
        out
    }
}

// ------------------------------- Tests ------------------------------------ //
