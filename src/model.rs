//! Declaration model: the JSON description of the types whose fields are
//! persisted, plus the host's converters and templates.
//!
//! Goals:
//! - Merge any number of documents, in load order, into one [`Model`].
//! - Extend the platform [`TypeUniverse`] with every declared type.
//! - Turn declared fields into [`FieldDescriptor`]s with collision-safe keys.
//!
//! ```json
//! {
//!   "types": [{
//!     "name": "com.example.Profile",
//!     "superclass": "com.example.Base",
//!     "interfaces": ["android.os.Parcelable"],
//!     "type_parameters": [{ "name": "T", "bounds": ["java.lang.CharSequence"] }],
//!     "fields": [{ "name": "tags", "type": "java.util.ArrayList<java.lang.String>" }]
//!   }],
//!   "converters": [{ "converter": "com.example.DateConverter", "filter": { "type": "java.util.Date" } }],
//!   "templates": []
//! }
//! ```
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::TemplateError;
use crate::field::{unique_key, AnnotationKind, FieldAccess, FieldDescriptor, RestorePolicy};
use crate::path_de::{self, PathError};
use crate::registry::{Converter, StoreAccessorRegistry, Template};
use crate::ty::parse::parse_type;
use crate::ty::{TypeDescriptor, TypeName, TypeSyntaxError};
use crate::universe::{TypeInfo, TypeKind, TypeUniverse, OBJECT};

// ------------------------------ Documents --------------------------------- //

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub converters: Vec<Converter>,
    #[serde(default)]
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: TypeName,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub superclass: Option<TypeName>,
    #[serde(default)]
    pub interfaces: Vec<TypeName>,
    #[serde(default)]
    pub annotations: Vec<TypeName>,
    #[serde(default)]
    pub type_parameters: Vec<TypeParamDecl>,
    #[serde(default)]
    pub restore_policy: RestorePolicy,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeParamDecl {
    pub name: String,
    /// Type expressions; none means `java.lang.Object`.
    #[serde(default)]
    pub bounds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub kind: AnnotationKind,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub converter: Option<TypeName>,
    #[serde(default)]
    pub restore_policy: RestorePolicy,
}

// ------------------------------- Errors ----------------------------------- //

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: PathError,
    },
    #[error("{class}: {source}")]
    TypeSyntax {
        class: TypeName,
        #[source]
        source: TypeSyntaxError,
    },
    #[error("type {0} is declared more than once")]
    DuplicateType(TypeName),
    #[error("{class} declares field `{field}` more than once")]
    DuplicateField { class: TypeName, field: String },
    #[error("template `{name}`: {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
    #[error("no declared type named {0}")]
    UnknownClass(TypeName),
}

// -------------------------------- Model ----------------------------------- //

#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel {
    pub name: TypeName,
    pub restore_policy: RestorePolicy,
    pub fields: Vec<FieldModel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldModel {
    pub name: String,
    pub ty: TypeDescriptor,
    pub kind: AnnotationKind,
    pub skip: bool,
    pub converter: Option<TypeName>,
    pub restore_policy: RestorePolicy,
}

#[derive(Debug, Clone)]
pub struct Model {
    pub universe: TypeUniverse,
    pub registry: StoreAccessorRegistry,
    pub classes: IndexMap<TypeName, ClassModel>,
    /// Types the engine can serialize as a whole: those with retained fields.
    pub persisted: IndexSet<TypeName>,
}

impl Model {
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ModelError> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let bytes = std::fs::read(path).map_err(|source| ModelError::Io { path: path.to_path_buf(), source })?;
            let document = path_de::from_slice_with_path(&bytes).map_err(|source| ModelError::Parse {
                path: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), "loaded model document");
            documents.push(document);
        }
        Self::from_documents(documents)
    }

    pub fn from_json_str(src: &str) -> Result<Self, ModelError> {
        let document = path_de::from_str_with_path(src).map_err(|source| ModelError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        Self::from_documents(vec![document])
    }

    pub fn from_documents(documents: Vec<ModelDocument>) -> Result<Self, ModelError> {
        let mut universe = TypeUniverse::platform();
        let mut declared: IndexMap<TypeName, TypeDecl> = IndexMap::new();
        let mut converters = Vec::new();
        let mut templates = Vec::new();

        for document in documents {
            for decl in document.types {
                if declared.contains_key(&decl.name) {
                    return Err(ModelError::DuplicateType(decl.name));
                }
                declared.insert(decl.name.clone(), decl);
            }
            converters.extend(document.converters);
            templates.extend(document.templates);
        }

        // every type goes in before any field type is read
        for decl in declared.values() {
            let mut info = TypeInfo::new(decl.name.clone(), decl.kind);
            info.superclass = decl.superclass.clone();
            info.interfaces = decl.interfaces.clone();
            info.annotations = decl.annotations.clone();
            universe.insert(info);
        }

        let mut classes = IndexMap::new();
        for decl in declared.values() {
            let class = class_model(decl)?;
            classes.insert(class.name.clone(), class);
        }

        let persisted = classes
            .values()
            .filter(|class| class.fields.iter().any(|f| f.kind == AnnotationKind::Retained && !f.skip))
            .map(|class| class.name.clone())
            .collect();

        let registry = StoreAccessorRegistry::new(converters, templates)
            .map_err(|(name, source)| ModelError::Template { name, source })?;

        Ok(Self { universe, registry, classes, persisted })
    }

    pub fn class(&self, name: &TypeName) -> Result<&ClassModel, ModelError> {
        self.classes.get(name).ok_or_else(|| ModelError::UnknownClass(name.clone()))
    }

    /// Classes with at least one field of `kind`, in declaration order.
    pub fn classes_with(&self, kind: AnnotationKind) -> impl Iterator<Item = &ClassModel> {
        self.classes
            .values()
            .filter(move |class| class.fields.iter().any(|f| f.kind == kind))
    }

    /// Descriptors for the fields of `kind` declared on `class` itself.
    ///
    /// A field whose name is also used by a field of the same kind on a
    /// declared ancestor gets a key qualified with the owning class.
    pub fn field_descriptors(&self, class: &TypeName, kind: AnnotationKind, instance: &str) -> Result<Vec<FieldDescriptor>, ModelError> {
        Ok(self.descriptors_of(self.class(class)?, kind, instance))
    }

    pub fn descriptors_of(&self, model: &ClassModel, kind: AnnotationKind, instance: &str) -> Vec<FieldDescriptor> {
        let class = &model.name;
        let inherited: IndexSet<&str> = self
            .universe
            .ancestors(class)
            .iter()
            .filter_map(|ancestor| self.classes.get(ancestor))
            .flat_map(|ancestor| ancestor.fields.iter())
            .filter(|f| f.kind == kind)
            .map(|f| f.name.as_str())
            .collect();

        model
            .fields
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| {
                let key = unique_key(&f.name, class, inherited.contains(f.name.as_str()));
                FieldDescriptor::new(class.clone(), f.name.clone(), f.ty.clone())
                    .with_access(FieldAccess::field(instance, &f.name))
                    .with_key(key)
                    .with_skip(f.skip)
                    .with_converter(f.converter.clone())
                    .with_restore_policy(f.restore_policy)
            })
            .collect()
    }
}

fn class_model(decl: &TypeDecl) -> Result<ClassModel, ModelError> {
    let syntax = |source: TypeSyntaxError| ModelError::TypeSyntax { class: decl.name.clone(), source };

    // bounds may mention parameters declared before them
    let mut params: IndexMap<String, Vec<TypeDescriptor>> = IndexMap::new();
    for param in &decl.type_parameters {
        let bounds = if param.bounds.is_empty() {
            vec![TypeDescriptor::declared(OBJECT)]
        } else {
            param
                .bounds
                .iter()
                .map(|bound| parse_type(bound, &params))
                .collect::<Result<Vec<_>, _>>()
                .map_err(syntax)?
        };
        params.insert(param.name.clone(), bounds);
    }

    let mut names = IndexSet::new();
    let mut fields = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        if !names.insert(field.name.as_str()) {
            return Err(ModelError::DuplicateField { class: decl.name.clone(), field: field.name.clone() });
        }
        fields.push(FieldModel {
            name: field.name.clone(),
            ty: parse_type(&field.ty, &params).map_err(syntax)?,
            kind: field.kind,
            skip: field.skip,
            converter: field.converter.clone(),
            restore_policy: field.restore_policy,
        });
    }

    Ok(ClassModel { name: decl.name.clone(), restore_policy: decl.restore_policy, fields })
}

// ------------------------------- Tests ------------------------------------ //
