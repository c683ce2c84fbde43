//! Emission accumulator for one (field, direction) pair.
//!
//! A strategy fills the scope and picks a statement template; callers may add
//! pre/post statements and string transforms before `emit()` renders
//! `pre… transformed(main) post…`, one statement per line.
//!
//! Restore statements are assignments. Their value half stays addressable so
//! a cascading parent can wrap it (copy constructors) without reparsing text.
pub mod render;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use render::TemplateError;

pub type Transform = Box<dyn Fn(String) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Save,
    Restore,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Save => "save",
            Direction::Restore => "restore",
        })
    }
}

// ------------------------------- Scope ------------------------------------ //

/// Ordered name → text substitutions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scope(IndexMap<String, String>);

impl Scope {
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> { self.0.get(name).map(String::as_str) }

    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty() && v != "false")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ----------------------------- Statements --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A complete statement template, terminator included.
    Raw(String),
    /// `target = value;`, both halves templates.
    Assign { target: String, value: String },
}

// ------------------------------ Analysis ---------------------------------- //

pub struct Analysis {
    direction: Direction,
    scope: Scope,
    statement: Statement,
    pre: Vec<String>,
    post: Vec<String>,
    transforms: Vec<Transform>,
}

impl fmt::Debug for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analysis")
            .field("direction", &self.direction)
            .field("scope", &self.scope)
            .field("statement", &self.statement)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

impl Analysis {
    pub fn new(direction: Direction, scope: Scope, statement: Statement) -> Self {
        Self {
            direction,
            scope,
            statement,
            pre: Vec::new(),
            post: Vec::new(),
            transforms: Vec::new(),
        }
    }

    pub fn direction(&self) -> Direction { self.direction }
    pub fn scope(&self) -> &Scope { &self.scope }
    pub fn statement(&self) -> &Statement { &self.statement }

    /// Wraps the value half of an assignment, e.g. `v` → `new X<>(v)`.
    /// Raw statements have no value half and are left alone.
    pub fn wrap_value(mut self, wrap: impl FnOnce(&str) -> String) -> Self {
        if let Statement::Assign { value, .. } = &mut self.statement {
            *value = wrap(value);
        }
        self
    }

    /// Renders `template` against the current scope and queues it before the main statement.
    pub fn pre(mut self, template: &str) -> Result<Self, TemplateError> {
        let rendered = render::render(template, &self.scope)?;
        self.pre.push(rendered);
        Ok(self)
    }

    /// Renders `template` against the current scope and queues it after the main statement.
    pub fn post(mut self, template: &str) -> Result<Self, TemplateError> {
        let rendered = render::render(template, &self.scope)?;
        self.post.push(rendered);
        Ok(self)
    }

    /// Appends a transform applied to the rendered main statement.
    pub fn transform(mut self, f: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        self.transforms.push(Box::new(f));
        self
    }

    /// The main statement before transforms.
    pub fn render_main(&self) -> Result<String, TemplateError> {
        match &self.statement {
            Statement::Raw(template) => render::render(template, &self.scope),
            Statement::Assign { target, value } => Ok(format!(
                "{} = {};",
                render::render(target, &self.scope)?,
                render::render(value, &self.scope)?,
            )),
        }
    }

    pub fn emit(&self) -> Result<String, TemplateError> {
        let main = self
            .transforms
            .iter()
            .fold(self.render_main()?, |acc, transform| transform(acc));
        let lines: Vec<&str> = self
            .pre
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(main.as_str()))
            .chain(self.post.iter().map(String::as_str))
            .collect();
        Ok(lines.join("\n"))
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn restore() -> Analysis {
        let mut scope = Scope::default();
        scope.set("fieldName", "source.names");
        scope.set("store", "store");
        scope.set("keyName", "names");
        Analysis::new(
            Direction::Restore,
            scope,
            Statement::Assign {
                target: "{{fieldName}}".into(),
                value: "{{store}}.getStringArrayList(\"{{keyName}}\")".into(),
            },
        )
    }

    #[test]
    fn emit_orders_pre_main_post() {
        let out = restore()
            .pre("// before {{keyName}}").unwrap()
            .post("// after").unwrap()
            .transform(|s| format!("{{ {s} }}"))
            .emit()
            .unwrap();
        assert_eq!(
            out,
            "// before names\n{ source.names = store.getStringArrayList(\"names\"); }\n// after"
        );
    }

    #[test]
    fn wrap_value_keeps_assignment_target() {
        let out = restore()
            .wrap_value(|v| format!("new java.util.LinkedList<>({v})"))
            .emit()
            .unwrap();
        assert_eq!(out, "source.names = new java.util.LinkedList<>(store.getStringArrayList(\"names\"));");
    }

    #[test]
    fn transforms_apply_in_order() {
        let out = restore()
            .transform(|s| format!("a({s})"))
            .transform(|s| format!("b({s})"))
            .render_main()
            .unwrap();
        // render_main ignores transforms
        assert!(out.starts_with("source.names ="));
        let emitted = restore()
            .transform(|s| format!("a[{s}]"))
            .transform(|s| format!("b[{s}]"))
            .emit()
            .unwrap();
        assert!(emitted.starts_with("b[a[source.names"));
    }
}
