//! Type-expression reader used by the declaration model.
//!
//! Grammar (whitespace insignificant):
//!
//! ```text
//! type       := annotation* base ('[' ']')*
//! annotation := '@' qname
//! base       := qname ('<' type (',' type)* '>')?
//! ```
//!
//! A bare keyword (`int`) is a primitive; a bare name that the caller knows
//! as a type parameter is a type variable; everything else is nominal.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{PrimitiveKind, TypeDescriptor, TypeName};

static QUALIFIED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("qualified-name pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type `{text}` at offset {offset}: {message}")]
pub struct TypeSyntaxError {
    pub text: String,
    pub offset: usize,
    pub message: String,
}

/// Type parameters in scope while reading a field type.
pub trait TypeParams {
    fn bounds_of(&self, name: &str) -> Option<Vec<TypeDescriptor>>;
}

pub struct NoTypeParams;

impl TypeParams for NoTypeParams {
    fn bounds_of(&self, _name: &str) -> Option<Vec<TypeDescriptor>> { None }
}

impl TypeParams for IndexMap<String, Vec<TypeDescriptor>> {
    fn bounds_of(&self, name: &str) -> Option<Vec<TypeDescriptor>> { self.get(name).cloned() }
}

pub fn parse_type(text: &str, params: &dyn TypeParams) -> Result<TypeDescriptor, TypeSyntaxError> {
    let mut cursor = Cursor { text, pos: 0, params };
    let ty = cursor.parse_type()?;
    cursor.skip_ws();
    if cursor.pos != text.len() {
        return Err(cursor.error("trailing input"));
    }
    Ok(ty)
}

// ------------------------------ Internals --------------------------------- //

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    params: &'a dyn TypeParams,
}

impl Cursor<'_> {
    fn error(&self, message: &str) -> TypeSyntaxError {
        TypeSyntaxError {
            text: self.text.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn rest(&self) -> &str { &self.text[self.pos..] }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), TypeSyntaxError> {
        if self.eat(c) { Ok(()) } else { Err(self.error(&format!("expected `{c}`"))) }
    }

    fn qualified_name(&mut self) -> Result<&str, TypeSyntaxError> {
        self.skip_ws();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'))
            .unwrap_or(self.rest().len());
        let name = &self.text[start..start + len];
        if !QUALIFIED_NAME.is_match(name) {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(name)
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor, TypeSyntaxError> {
        let mut annotations = Vec::new();
        while self.eat('@') {
            annotations.push(TypeName::from(self.qualified_name()?));
        }

        let name = self.qualified_name()?.to_string();
        let mut ty = if self.eat('<') {
            let mut args = vec![self.parse_type()?];
            while self.eat(',') {
                args.push(self.parse_type()?);
            }
            self.expect('>')?;
            if !annotations.is_empty() {
                return Err(self.error("annotations are only supported on raw declared types"));
            }
            TypeDescriptor::parameterized(name, args)
        } else if let Some(kind) = PrimitiveKind::from_keyword(&name) {
            if !annotations.is_empty() {
                return Err(self.error("primitive types cannot carry annotations"));
            }
            TypeDescriptor::primitive(kind)
        } else if let Some(bounds) = self.params.bounds_of(&name) {
            TypeDescriptor::type_variable(name, bounds)
        } else {
            TypeDescriptor::annotated(name, annotations)
        };

        while self.eat('[') {
            self.expect(']')?;
            ty = TypeDescriptor::array_of(ty);
        }
        Ok(ty)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_generics_and_arrays() {
        let ty = TypeDescriptor::parse("java.util.Map<java.lang.String, java.util.List<int[]>>[][]").unwrap();
        assert_eq!(ty.to_string(), "java.util.Map<java.lang.String, java.util.List<int[]>>[][]");
        match ty {
            TypeDescriptor::Array(inner) => assert!(matches!(*inner, TypeDescriptor::Array(_))),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn type_parameters_become_variables() {
        let mut params = IndexMap::new();
        params.insert("T".to_string(), vec![TypeDescriptor::declared("android.os.Parcelable")]);
        let ty = parse_type("T", &params).unwrap();
        assert_eq!(
            ty,
            TypeDescriptor::type_variable("T", vec![TypeDescriptor::declared("android.os.Parcelable")])
        );
    }

    #[test]
    fn annotations_attach_to_declared() {
        let ty = TypeDescriptor::parse("@com.example.Keep com.example.Model").unwrap();
        assert_eq!(ty.annotations(), &[TypeName::from("com.example.Keep")]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(TypeDescriptor::parse("java.util.List<").is_err());
        assert!(TypeDescriptor::parse("int]").is_err());
        assert!(TypeDescriptor::parse("9lives").is_err());
        assert!(TypeDescriptor::parse("@com.example.Keep int").is_err());
    }
}
