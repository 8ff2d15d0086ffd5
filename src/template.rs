//! The template compiler.
//!
//! A [`Template`] is a string containing zero or more `{{name}}` placeholders. Placeholders are
//! parsed once, when the template is created, and [`Template::compile`] substitutes every one of
//! them from a [`VariableSet`].
//!
//! Compilation is strict: if any placeholder has no matching variable, nothing is rendered and
//! a [`CompileError::MissingVariable`] listing every missing name is returned instead.
//!
//! ```rust
//! use prompt_compile::template::{Template, VariableSet};
//!
//! let template = Template::new("Hello {{user_name}}, the answer is {{answer}}.");
//! let variables = VariableSet::new()
//!     .with_variable("user_name", "Sam")
//!     .with_variable("answer", 42);
//!
//! assert_eq!(template.compile(&variables).unwrap(), "Hello Sam, the answer is 42.");
//! ```
//!
//! There is no escape syntax: any `{{identifier}}` sequence is treated as a placeholder.
use std::{collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// `{{name}}` or `{{ name }}`, where `name` is one or more word characters.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder pattern is a valid regex")
});

/// Name reported in errors for templates that were created without one.
const INLINE_TEMPLATE_NAME: &str = "<inline>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// An immutable prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: Option<String>,
    source: String,
    segments: Vec<Segment>,
    variables: Vec<String>,
}

impl Template {
    /// Parse an anonymous template.
    pub fn new(source: impl Into<String>) -> Self {
        Self::parse(None, source.into())
    }

    /// Parse a template that reports `name` in compile errors.
    pub fn named(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::parse(Some(name.into()), source.into())
    }

    fn parse(name: Option<String>, source: String) -> Self {
        let mut segments = Vec::new();
        let mut variables: Vec<String> = Vec::new();
        let mut last = 0;

        for captures in PLACEHOLDER.captures_iter(&source) {
            let (Some(whole), Some(ident)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }

            let ident = ident.as_str().to_string();
            if !variables.contains(&ident) {
                variables.push(ident.clone());
            }
            segments.push(Segment::Placeholder(ident));
            last = whole.end();
        }

        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Self {
            name,
            source,
            segments,
            variables,
        }
    }

    /// The template name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The raw, uncompiled template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names, in order of first appearance.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Whether the template contains any placeholder at all.
    pub fn has_placeholders(&self) -> bool {
        !self.variables.is_empty()
    }

    /// Substitute every placeholder with the text form of its variable.
    ///
    /// Fails with [`CompileError::MissingVariable`] naming every placeholder that `variables`
    /// does not cover. Variables that no placeholder references are ignored.
    pub fn compile(&self, variables: &VariableSet) -> Result<String, CompileError> {
        let missing: Vec<String> = self
            .variables
            .iter()
            .filter(|name| !variables.contains(name))
            .cloned()
            .collect();

        if !missing.is_empty() {
            let template = self.name.as_deref().unwrap_or(INLINE_TEMPLATE_NAME);
            tracing::debug!("Template `{template}` is missing variables: {missing:?}");
            return Err(CompileError::MissingVariable {
                template: template.to_string(),
                missing,
            });
        }

        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    if let Some(value) = variables.get(name) {
                        render_value(value, &mut out);
                    }
                }
            }
        }

        Ok(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Template {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Compile `template` against `variables`. Shorthand for [`Template::compile`].
pub fn compile(template: &Template, variables: &VariableSet) -> Result<String, CompileError> {
    template.compile(variables)
}

fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

/// Values to substitute into a [`Template`], keyed by placeholder name.
///
/// Strings are substituted as-is; every other value is substituted as its JSON text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSet {
    values: BTreeMap<String, Value>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a variable set from anything that serializes to a map (a struct, a hashmap, a btree, etc...).
    pub fn from_serialize<V>(v: V) -> Result<Self, CompileError>
    where
        V: Serialize,
    {
        match serde_json::to_value(v) {
            Ok(Value::Object(map)) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            Ok(other) => Err(CompileError::InvalidVariables(format!(
                "expected a map of variables, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(CompileError::InvalidVariables(e.to_string())),
        }
    }

    pub fn with_variable(mut self, k: &str, v: impl Into<Value>) -> Self {
        self.insert(k, v);
        self
    }

    pub fn insert(&mut self, k: &str, v: impl Into<Value>) {
        self.values.insert(k.to_string(), v.into());
    }

    pub fn get(&self, k: &str) -> Option<&Value> {
        self.values.get(k)
    }

    pub fn contains(&self, k: &str) -> bool {
        self.values.contains_key(k)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every variable of `other` into this set, overwriting on name clashes.
    pub fn extend(&mut self, other: VariableSet) {
        self.values.extend(other.values);
    }
}

impl<K, V> FromIterator<(K, V)> for VariableSet
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Template `{template}` is missing variables: {}", .missing.join(", "))]
    MissingVariable {
        template: String,
        missing: Vec<String>,
    },
    #[error("Invalid template variables: {0}")]
    InvalidVariables(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use serde::Serialize;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> VariableSet {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn compiles_documented_scenario() {
        let template = Template::new("Hello {{user_name}}, the answer is {{answer}}.");
        let res = template
            .compile(&vars(&[("user_name", "Sam"), ("answer", "42")]))
            .unwrap();
        assert_eq!(res, "Hello Sam, the answer is 42.");
    }

    #[test]
    fn missing_variable_is_named() {
        let template = Template::named(
            "greeting",
            "Hello {{user_name}}, the answer is {{answer}}.",
        );
        let err = template
            .compile(&vars(&[("user_name", "Sam")]))
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingVariable {
                template: "greeting".to_string(),
                missing: vec!["answer".to_string()],
            }
        );
        assert_eq!(
            err.to_string(),
            "Template `greeting` is missing variables: answer"
        );
    }

    #[test]
    fn all_missing_variables_are_batched() {
        let template = Template::new("{{b}} {{a}} {{c}} {{b}}");
        let err = template.compile(&vars(&[("c", "3")])).unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingVariable {
                template: INLINE_TEMPLATE_NAME.to_string(),
                missing: vec!["b".to_string(), "a".to_string()],
            }
        );
    }

    #[test]
    fn preserves_placeholder_order() {
        let res = compile(&Template::new("{{a}}x{{b}}"), &vars(&[("a", "1"), ("b", "2")]));
        assert_eq!(res.unwrap(), "1x2");
    }

    #[test]
    fn repeated_placeholder_gets_same_value() {
        let res = Template::new("{{a}}-{{a}}").compile(&vars(&[("a", "Q")]));
        assert_eq!(res.unwrap(), "Q-Q");
    }

    #[test]
    fn unused_variables_are_ignored() {
        let res = Template::new("{{a}}").compile(&vars(&[("a", "1"), ("b", "2")]));
        assert_eq!(res.unwrap(), "1");
    }

    #[test]
    fn empty_template_compiles_to_empty_string() {
        assert_eq!(Template::new("").compile(&VariableSet::new()).unwrap(), "");
        assert_eq!(Template::new("").compile(&vars(&[("a", "1")])).unwrap(), "");
    }

    #[test]
    fn compiled_output_recompiles_unchanged() {
        let first = Template::new("Dear {{name}},\n{{body}}")
            .compile(&vars(&[("name", "Ana"), ("body", "hi")]))
            .unwrap();
        let second = Template::new(first.as_str())
            .compile(&VariableSet::new())
            .unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn placeholder_names_are_case_sensitive() {
        let err = Template::new("{{Name}}")
            .compile(&vars(&[("name", "x")]))
            .unwrap_err();
        assert!(matches!(err, CompileError::MissingVariable { missing, .. } if missing == ["Name"]));
    }

    #[test]
    fn whitespace_inside_braces_is_allowed() {
        let template = Template::new("Hello {{ user }} and {{user}}!");
        assert_eq!(template.variables(), ["user"]);
        assert_eq!(
            template.compile(&vars(&[("user", "Rig")])).unwrap(),
            "Hello Rig and Rig!"
        );
    }

    #[test]
    fn non_identifier_braces_stay_literal() {
        let template = Template::new("{{not a name}} {{a-b}} {{}} {single}");
        assert!(!template.has_placeholders());
        assert_eq!(
            template.compile(&VariableSet::new()).unwrap(),
            "{{not a name}} {{a-b}} {{}} {single}"
        );
    }

    #[test]
    fn extra_braces_around_placeholder_are_kept() {
        let res = Template::new("{{{a}}}").compile(&vars(&[("a", "1")]));
        assert_eq!(res.unwrap(), "{1}");
    }

    #[test]
    fn non_string_values_render_as_json_text() {
        let variables = VariableSet::new()
            .with_variable("n", 42)
            .with_variable("f", 0.5)
            .with_variable("b", true)
            .with_variable("none", Value::Null)
            .with_variable("list", serde_json::json!(["x", 1]));
        let res = Template::new("{{n}} {{f}} {{b}} {{none}} {{list}}")
            .compile(&variables)
            .unwrap();
        assert_eq!(res, r#"42 0.5 true null ["x",1]"#);
    }

    #[test]
    fn unicode_values_and_names() {
        let res = Template::new("{{이름}}님 안녕하세요")
            .compile(&vars(&[("이름", "세레나")]))
            .unwrap();
        assert_eq!(res, "세레나님 안녕하세요");
    }

    #[test]
    fn variables_from_struct() {
        #[derive(Serialize)]
        struct Review<'a> {
            language: &'a str,
            code: &'a str,
        }

        let variables = VariableSet::from_serialize(Review {
            language: "Rust",
            code: "fn main() {}",
        })
        .unwrap();
        let res = Template::new("Review the following {{language}} code:\n{{code}}")
            .compile(&variables)
            .unwrap();
        assert_eq!(res, "Review the following Rust code:\nfn main() {}");
    }

    #[test]
    fn variables_from_hashmap() {
        let map: HashMap<&str, i32> = HashMap::from([("max_length", 50)]);
        let variables = VariableSet::from_serialize(map).unwrap();
        assert_eq!(variables.get("max_length"), Some(&Value::from(50)));
    }

    #[test]
    fn variables_from_non_map_are_rejected() {
        let err = VariableSet::from_serialize(vec!["a", "b"]).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidVariables("expected a map of variables, got an array".into())
        );
    }

    #[test]
    fn template_exposes_distinct_variables_in_order() {
        let template = Template::new(
            "You are {{assistant_name}}. User {{user_name}} asks: {{question}} ({{user_name}})",
        );
        assert_eq!(
            template.variables(),
            ["assistant_name", "user_name", "question"]
        );
    }

    #[test]
    fn compile_is_shareable_across_threads() {
        let template = std::sync::Arc::new(Template::new("{{a}}"));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let template = template.clone();
                std::thread::spawn(move || {
                    let variables = VariableSet::new().with_variable("a", i);
                    template.compile(&variables).unwrap()
                })
            })
            .collect();

        let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, ["0", "1", "2", "3"]);
    }
}
