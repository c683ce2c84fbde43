//! Closed type model the resolver pattern-matches over.
//!
//! The host's declaration layer produces these values once, at the boundary;
//! nothing past this point asks a live type system anything.
//!
//! - `TypeName` is always fully qualified (`java.util.ArrayList`).
//! - `Parameterized` with zero arguments is the same type as its `Declared`
//!   form; [`TypeDescriptor::parameterized`] collapses it and `PartialEq`
//!   treats the two spellings as equal.
//! - `Display` renders Java-like source text, which is what casts and
//!   copy-constructor wrappers splice into generated statements.
pub mod parse;

use std::fmt;
use serde::{Deserialize, Serialize};

pub use parse::TypeSyntaxError;

// ------------------------------- Names ------------------------------------ //

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }
    pub fn as_str(&self) -> &str { &self.0 }

    /// Last dotted segment: `java.util.ArrayList` → `ArrayList`.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self { Self(value) }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool { self.0 == other }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool { self.0 == *other }
}

// ----------------------------- Primitives --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        Self::Boolean, Self::Byte, Self::Short, Self::Int,
        Self::Long, Self::Char, Self::Float, Self::Double,
    ];

    /// Source keyword (`int`).
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Capitalized kind name used in accessor names (`Int`).
    pub fn accessor_name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Char => "Char",
            Self::Float => "Float",
            Self::Double => "Double",
        }
    }

    pub fn boxed_name(self) -> &'static str {
        match self {
            Self::Boolean => "java.lang.Boolean",
            Self::Byte => "java.lang.Byte",
            Self::Short => "java.lang.Short",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Char => "java.lang.Character",
            Self::Float => "java.lang.Float",
            Self::Double => "java.lang.Double",
        }
    }

    pub fn boxed(self) -> TypeName { TypeName::from(self.boxed_name()) }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }

    pub fn from_boxed(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.boxed_name() == name)
    }
}

// ----------------------------- Descriptor --------------------------------- //

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Array(Box<TypeDescriptor>),
    Parameterized { raw: TypeName, args: Vec<TypeDescriptor> },
    Declared { name: TypeName, annotations: Vec<TypeName> },
    TypeVariable { name: String, bounds: Vec<TypeDescriptor> },
}

impl TypeDescriptor {
    pub fn primitive(kind: PrimitiveKind) -> Self { Self::Primitive(kind) }

    pub fn declared(name: impl Into<TypeName>) -> Self {
        Self::Declared { name: name.into(), annotations: Vec::new() }
    }

    pub fn annotated(name: impl Into<TypeName>, annotations: Vec<TypeName>) -> Self {
        Self::Declared { name: name.into(), annotations }
    }

    /// Zero arguments collapse to the raw `Declared` form.
    pub fn parameterized(raw: impl Into<TypeName>, args: Vec<TypeDescriptor>) -> Self {
        let raw = raw.into();
        if args.is_empty() {
            Self::declared(raw)
        } else {
            Self::Parameterized { raw, args }
        }
    }

    pub fn array_of(element: TypeDescriptor) -> Self { Self::Array(Box::new(element)) }

    pub fn type_variable(name: impl Into<String>, bounds: Vec<TypeDescriptor>) -> Self {
        Self::TypeVariable { name: name.into(), bounds }
    }

    /// Reads a type expression without type-variable context.
    pub fn parse(text: &str) -> Result<Self, TypeSyntaxError> {
        parse::parse_type(text, &parse::NoTypeParams)
    }

    /// Nominal name of declared and parameterized types.
    pub fn raw_name(&self) -> Option<&TypeName> {
        match self {
            Self::Parameterized { raw, .. } => Some(raw),
            Self::Declared { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[TypeDescriptor] {
        match self {
            Self::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    /// Annotations written on the type use itself.
    pub fn annotations(&self) -> &[TypeName] {
        match self {
            Self::Declared { annotations, .. } => annotations,
            _ => &[],
        }
    }

    /// Same type with generic arguments and use-site annotations dropped.
    pub fn erasure(&self) -> TypeDescriptor {
        match self {
            Self::Parameterized { raw, .. } => Self::declared(raw.clone()),
            Self::Declared { name, .. } => Self::declared(name.clone()),
            Self::Array(element) => Self::array_of(element.erasure()),
            other => other.clone(),
        }
    }

    pub fn is_primitive(&self) -> bool { matches!(self, Self::Primitive(_)) }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// `java.lang.Integer` → `Int`, only for the bare boxed class.
    pub fn boxed_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Declared { name, .. } => PrimitiveKind::from_boxed(name.as_str()),
            _ => None,
        }
    }

    /// Primitive kind of either spelling.
    pub fn primitive_or_boxed(&self) -> Option<PrimitiveKind> {
        self.as_primitive().or_else(|| self.boxed_primitive())
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.raw_name().is_some_and(|n| n == name)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        use TypeDescriptor::*;
        match (self, other) {
            (Primitive(a), Primitive(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Parameterized { raw: r1, args: a1 }, Parameterized { raw: r2, args: a2 }) => {
                r1 == r2 && a1 == a2
            }
            (Declared { name: n1, annotations: x1 }, Declared { name: n2, annotations: x2 }) => {
                n1 == n2 && x1 == x2
            }
            (Parameterized { raw, args }, Declared { name, annotations })
            | (Declared { name, annotations }, Parameterized { raw, args }) => {
                args.is_empty() && annotations.is_empty() && raw == name
            }
            (TypeVariable { name: n1, bounds: b1 }, TypeVariable { name: n2, bounds: b2 }) => {
                n1 == n2 && b1 == b2
            }
            _ => false,
        }
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.write_str(kind.keyword()),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Parameterized { raw, args } => {
                write!(f, "{raw}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Declared { name, .. } => write!(f, "{name}"),
            Self::TypeVariable { name, .. } => f.write_str(name),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
