//! What the store can hold natively, and what the host registered on top.
//!
//! Built-in tables are ordered; every lookup returns the first assignable
//! entry, so more specific types must come before the types they implement.
//! Converters and templates are kept in registration order and are read-only
//! once the registry is built.
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::render::{self, TemplateError};
use crate::filter::TypeFilter;
use crate::strategy::template::SCOPE_NAMES;
use crate::ty::{TypeDescriptor, TypeName};
use crate::universe::TypeUniverse;

pub const SEQUENCE: &str = "java.util.List";
pub const CANONICAL_LIST: &str = "java.util.ArrayList";
pub const MAP: &str = "java.util.Map";
pub const PARCELABLE: &str = "android.os.Parcelable";
pub const SPARSE_ARRAY: &str = "android.util.SparseArray";
pub const SPARSE_FRAGMENT: &str = "SparseParcelableArray";
pub const BOXED_INTEGER: &str = "java.lang.Integer";

/// List implementations restored by copying the canonical list.
pub const ALTERNATE_LISTS: &[&str] = &["java.util.LinkedList", "java.util.concurrent.CopyOnWriteArrayList"];

/// Element types with a dedicated `…Array` accessor.
pub const OBJECT_ARRAY_TYPES: &[&str] = &["java.lang.String", "java.lang.CharSequence", PARCELABLE];

/// Non-parcelable element types with a dedicated `…ArrayList` accessor.
pub const COLLECTION_SIMPLE_TYPES: &[&str] = &["java.lang.String", "java.lang.CharSequence"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeType {
    pub name: &'static str,
    pub alias: Option<&'static str>,
}

impl NativeType {
    const fn plain(name: &'static str) -> Self { Self { name, alias: None } }

    /// Accessor-name fragment: alias if any, else the simple name.
    pub fn fragment(&self) -> &'static str {
        self.alias.unwrap_or_else(|| self.name.rsplit('.').next().unwrap_or(self.name))
    }

    pub fn descriptor(&self) -> TypeDescriptor { TypeDescriptor::declared(self.name) }
}

pub const NATIVE_OBJECT_TYPES: &[NativeType] = &[
    NativeType::plain("java.lang.String"),
    NativeType::plain("java.lang.CharSequence"),
    NativeType::plain("android.os.Bundle"),
    NativeType { name: "android.os.IBinder", alias: Some("Binder") },
    NativeType::plain("android.util.Size"),
    NativeType::plain("android.util.SizeF"),
    NativeType::plain(PARCELABLE),
    NativeType::plain("java.io.Serializable"),
];

// ----------------------------- Extensions --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Converter {
    pub converter: TypeName,
    pub filter: TypeFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// Consulted before the built-in strategies.
    #[default]
    Before,
    /// Never applied; only reported when nothing else matched.
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub filter: TypeFilter,
    #[serde(default)]
    pub execution: Execution,
    pub save: String,
    pub restore: String,
    #[serde(default)]
    pub save_pre: Vec<String>,
    #[serde(default)]
    pub save_post: Vec<String>,
    #[serde(default)]
    pub restore_pre: Vec<String>,
    #[serde(default)]
    pub restore_post: Vec<String>,
}

impl Template {
    fn validate(&self) -> Result<(), TemplateError> {
        std::iter::once(&self.save)
            .chain(std::iter::once(&self.restore))
            .chain(&self.save_pre)
            .chain(&self.save_post)
            .chain(&self.restore_pre)
            .chain(&self.restore_post)
            .try_for_each(|t| render::validate_names(t, SCOPE_NAMES))
    }
}

// ------------------------------ Registry ---------------------------------- //

#[derive(Debug, Clone, Default)]
pub struct StoreAccessorRegistry {
    converters: Vec<Converter>,
    templates: Vec<Arc<Template>>,
}

impl StoreAccessorRegistry {
    /// Builds the registry, rejecting malformed template text and names the
    /// template scope does not provide.
    pub fn new(converters: Vec<Converter>, templates: Vec<Template>) -> Result<Self, (String, TemplateError)> {
        for template in &templates {
            template.validate().map_err(|e| (template.name.clone(), e))?;
        }
        Ok(Self {
            converters,
            templates: templates.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn converters(&self) -> &[Converter] { &self.converters }
    pub fn templates(&self) -> &[Arc<Template>] { &self.templates }

    pub fn converter_for(&self, ty: &TypeDescriptor, universe: &TypeUniverse) -> Option<&Converter> {
        self.converters.iter().find(|c| c.filter.matches(ty, universe))
    }

    pub fn template_for<'a>(
        &'a self,
        ty: &'a TypeDescriptor,
        universe: &'a TypeUniverse,
        execution: Execution,
    ) -> Option<&'a Arc<Template>> {
        self.templates_matching(ty, universe, execution).next()
    }

    pub fn templates_matching<'a>(
        &'a self,
        ty: &'a TypeDescriptor,
        universe: &'a TypeUniverse,
        execution: Execution,
    ) -> impl Iterator<Item = &'a Arc<Template>> + 'a {
        self.templates
            .iter()
            .filter(move |t| t.execution == execution && t.filter.matches(ty, universe))
    }

    // -------- built-in tables --------

    pub fn native_object(&self, ty: &TypeDescriptor, universe: &TypeUniverse) -> Option<&'static NativeType> {
        NATIVE_OBJECT_TYPES
            .iter()
            .find(|native| universe.is_assignable(ty, &native.descriptor()))
    }

    /// Either a native object type or the keyed-array capability.
    pub fn accepts_object(&self, ty: &TypeDescriptor, universe: &TypeUniverse) -> bool {
        ty.is_named(SPARSE_ARRAY) || self.native_object(ty, universe).is_some()
    }

    pub fn object_array_element(&self, element: &TypeDescriptor, universe: &TypeUniverse) -> Option<TypeDescriptor> {
        first_assignable(OBJECT_ARRAY_TYPES, element, universe)
    }

    pub fn collection_simple_element(&self, element: &TypeDescriptor, universe: &TypeUniverse) -> Option<TypeDescriptor> {
        first_assignable(COLLECTION_SIMPLE_TYPES, element, universe)
    }
}

fn first_assignable(table: &[&str], ty: &TypeDescriptor, universe: &TypeUniverse) -> Option<TypeDescriptor> {
    table
        .iter()
        .map(|name| TypeDescriptor::declared(*name))
        .find(|candidate| universe.is_assignable(ty, candidate))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Bound, TypeConstraint};

    fn d(text: &str) -> TypeDescriptor { TypeDescriptor::parse(text).unwrap() }

    #[test]
    fn native_lookup_prefers_specific_types() {
        let u = TypeUniverse::platform();
        let r = StoreAccessorRegistry::default();
        assert_eq!(r.native_object(&d("java.lang.String"), &u).map(NativeType::fragment), Some("String"));
        assert_eq!(r.native_object(&d("android.os.Bundle"), &u).map(NativeType::fragment), Some("Bundle"));
        assert_eq!(r.native_object(&d("android.os.Binder"), &u).map(NativeType::fragment), Some("Binder"));
        assert_eq!(r.native_object(&d("java.util.Date"), &u).map(NativeType::fragment), Some("Serializable"));
        assert!(r.native_object(&d("java.lang.Object"), &u).is_none());
    }

    #[test]
    fn array_and_collection_tables() {
        let u = TypeUniverse::platform();
        let r = StoreAccessorRegistry::default();
        assert_eq!(r.object_array_element(&d("java.lang.String"), &u), Some(d("java.lang.String")));
        assert_eq!(r.object_array_element(&d("android.os.Bundle"), &u), Some(d("android.os.Parcelable")));
        assert_eq!(r.object_array_element(&d("java.util.Date"), &u), None);
        assert_eq!(r.collection_simple_element(&d("java.lang.CharSequence"), &u), Some(d("java.lang.CharSequence")));
    }

    #[test]
    fn malformed_templates_fail_registration() {
        let bad = Template {
            name: "broken".into(),
            filter: TypeFilter::new(TypeConstraint::new("java.util.Date", Bound::Exactly)),
            execution: Execution::Before,
            save: "{{#cast}}".into(),
            restore: "{{fieldName}} = null;".into(),
            save_pre: vec![],
            save_post: vec![],
            restore_pre: vec![],
            restore_post: vec![],
        };
        let err = StoreAccessorRegistry::new(vec![], vec![bad.clone()]).unwrap_err();
        assert_eq!(err.0, "broken");

        let misspelled = Template {
            save: "{{store}}.putLong(\"{{keyName}}\", {{fieldName}});".into(),
            restore: "{{fieldName}} = {{#cast}}({{castExpresion}}) {{/cast}}null;".into(),
            ..bad
        };
        let (name, err) = StoreAccessorRegistry::new(vec![], vec![misspelled]).unwrap_err();
        assert_eq!(name, "broken");
        assert!(matches!(err, TemplateError::UnknownVariable { ref name, .. } if name == "castExpresion"));
    }

    #[test]
    fn templates_filter_by_execution() {
        let u = TypeUniverse::platform();
        let t = Template {
            name: "dates".into(),
            filter: TypeFilter::new(TypeConstraint::new("java.util.Date", Bound::Exactly)),
            execution: Execution::Never,
            save: "{{store}}.putLong(\"{{keyName}}\", {{fieldName}}.getTime());".into(),
            restore: "{{fieldName}} = new java.util.Date({{store}}.getLong(\"{{keyName}}\"));".into(),
            save_pre: vec![],
            save_post: vec![],
            restore_pre: vec![],
            restore_post: vec![],
        };
        let r = StoreAccessorRegistry::new(vec![], vec![t]).unwrap();
        assert!(r.template_for(&d("java.util.Date"), &u, Execution::Before).is_none());
        assert_eq!(r.template_for(&d("java.util.Date"), &u, Execution::Never).map(|t| t.name.as_str()), Some("dates"));
    }
}
