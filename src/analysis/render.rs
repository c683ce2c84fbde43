//! Mustache-flavoured statement templates.
//!
//! Supported tags:
//! - `{{name}}` substitutes a scope entry; unknown names are an error.
//! - `{{#flag}}…{{/flag}}` renders its body when `flag` is truthy.
//! - `{{^flag}}…{{/flag}}` renders its body when `flag` is not truthy.
//!
//! A flag is truthy when the scope holds it with a non-empty value other than
//! `"false"`. Sections nest.
use super::Scope;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown variable `{name}` in template `{template}`")]
    UnknownVariable { name: String, template: String },
    #[error("unclosed tag in template `{template}`")]
    UnclosedTag { template: String },
    #[error("section `{name}` is never closed in template `{template}`")]
    UnclosedSection { name: String, template: String },
    #[error("`{{{{/{found}}}}}` closes `{expected}` in template `{template}`")]
    MismatchedSection { expected: String, found: String, template: String },
    #[error("empty tag in template `{template}`")]
    EmptyTag { template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Var(String),
    Section { name: String, inverted: bool, body: Vec<Node> },
}

pub fn render(template: &str, scope: &Scope) -> Result<String, TemplateError> {
    let nodes = parse(template)?;
    let mut out = String::with_capacity(template.len());
    render_nodes(&nodes, scope, template, &mut out)?;
    Ok(out)
}

/// Checks a template without rendering it.
pub fn validate(template: &str) -> Result<(), TemplateError> {
    parse(template).map(|_| ())
}

/// Like [`validate`], and every `{{name}}` must be one of `known`, sections
/// included.
pub fn validate_names(template: &str, known: &[&str]) -> Result<(), TemplateError> {
    let nodes = parse(template)?;
    check_names(&nodes, template, &|name: &str| known.contains(&name))
}

// ------------------------------ Parsing ----------------------------------- //

fn parse(template: &str) -> Result<Vec<Node>, TemplateError> {
    // stack of open sections: (name, inverted, siblings collected before it)
    let mut stack: Vec<(String, bool, Vec<Node>)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            current.push(Node::Text(rest[..open].to_string()));
        }
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            return Err(TemplateError::UnclosedTag { template: template.to_string() });
        };
        let tag = after[..close].trim();
        rest = &after[close + 2..];

        let (sigil, name) = match tag.chars().next() {
            Some(c @ ('#' | '^' | '/')) => (Some(c), tag[1..].trim()),
            _ => (None, tag),
        };
        if name.is_empty() {
            return Err(TemplateError::EmptyTag { template: template.to_string() });
        }

        match sigil {
            Some('#') | Some('^') => {
                let siblings = std::mem::take(&mut current);
                stack.push((name.to_string(), sigil == Some('^'), siblings));
            }
            Some('/') => {
                let Some((open_name, inverted, siblings)) = stack.pop() else {
                    return Err(TemplateError::MismatchedSection {
                        expected: String::new(),
                        found: name.to_string(),
                        template: template.to_string(),
                    });
                };
                if open_name != name {
                    return Err(TemplateError::MismatchedSection {
                        expected: open_name,
                        found: name.to_string(),
                        template: template.to_string(),
                    });
                }
                let body = std::mem::replace(&mut current, siblings);
                current.push(Node::Section { name: open_name, inverted, body });
            }
            _ => current.push(Node::Var(name.to_string())),
        }
    }
    if !rest.is_empty() {
        current.push(Node::Text(rest.to_string()));
    }
    if let Some((name, _, _)) = stack.pop() {
        return Err(TemplateError::UnclosedSection { name, template: template.to_string() });
    }
    Ok(current)
}

// ----------------------------- Rendering ---------------------------------- //

fn render_nodes(nodes: &[Node], scope: &Scope, template: &str, out: &mut String) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) => match scope.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(TemplateError::UnknownVariable {
                        name: name.clone(),
                        template: template.to_string(),
                    });
                }
            },
            Node::Section { name, inverted, body } => {
                if scope.is_truthy(name) != *inverted {
                    render_nodes(body, scope, template, out)?;
                } else {
                    check_names(body, template, &|name: &str| scope.get(name).is_some())?;
                }
            }
        }
    }
    Ok(())
}

/// Walks every variable, rendered or not.
fn check_names(nodes: &[Node], template: &str, known: &dyn Fn(&str) -> bool) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Var(name) if known(name) => {}
            Node::Var(name) => {
                return Err(TemplateError::UnknownVariable {
                    name: name.clone(),
                    template: template.to_string(),
                });
            }
            Node::Section { body, .. } => check_names(body, template, known)?,
        }
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        let mut s = Scope::default();
        s.set("fieldName", "source.count");
        s.set("keyName", "count");
        s.set("cast", "true");
        s.set("castExpression", "java.lang.Integer");
        s
    }

    #[test]
    fn substitutes_and_honours_sections() {
        let out = render(
            "{{fieldName}} = {{#cast}}({{castExpression}}) {{/cast}}get(\"{{keyName}}\")",
            &scope(),
        )
        .unwrap();
        assert_eq!(out, "source.count = (java.lang.Integer) get(\"count\")");
    }

    #[test]
    fn false_flags_and_inverted_sections() {
        let mut s = scope();
        s.set("cast", "false");
        let out = render("{{#cast}}yes{{/cast}}{{^cast}}no{{/cast}}|{{^missing}}absent{{/missing}}", &s).unwrap();
        assert_eq!(out, "no|absent");
    }

    #[test]
    fn nested_sections() {
        let mut s = scope();
        s.set("outer", "x");
        let out = render("{{#outer}}[{{#cast}}{{keyName}}{{/cast}}]{{/outer}}", &s).unwrap();
        assert_eq!(out, "[count]");
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert!(matches!(render("{{nope}}", &scope()), Err(TemplateError::UnknownVariable { .. })));
        assert!(matches!(validate("{{#a}}x"), Err(TemplateError::UnclosedSection { .. })));
        assert!(matches!(validate("{{#a}}x{{/b}}"), Err(TemplateError::MismatchedSection { .. })));
        assert!(matches!(validate("{{/a}}"), Err(TemplateError::MismatchedSection { .. })));
        assert!(matches!(validate("{{a"), Err(TemplateError::UnclosedTag { .. })));
        assert!(matches!(validate("{{ }}"), Err(TemplateError::EmptyTag { .. })));
    }

    #[test]
    fn skipped_sections_still_name_known_variables() {
        let err = render("x{{#cast}}({{castExpresion}}){{/cast}}", &Scope::default()).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownVariable { ref name, .. } if name == "castExpresion"));

        let mut s = scope();
        s.set("cast", "false");
        assert_eq!(render("x{{#cast}}({{castExpression}}){{/cast}}", &s).unwrap(), "x");
    }

    #[test]
    fn names_are_checked_against_a_vocabulary() {
        let known = ["fieldName", "keyName", "cast", "castExpression"];
        assert!(validate_names("{{fieldName}} = {{#cast}}({{castExpression}}){{/cast}}{{keyName}}", &known).is_ok());
        assert!(matches!(
            validate_names("{{typo}}", &known),
            Err(TemplateError::UnknownVariable { ref name, .. }) if name == "typo"
        ));
        assert!(matches!(
            validate_names("{{^cast}}{{castExpresion}}{{/cast}}", &known),
            Err(TemplateError::UnknownVariable { .. })
        ));
    }
}
