use rig::{
    agent::Agent,
    completion::{Chat, CompletionModel, Prompt, PromptError},
    message::Message,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::template::{CompileError, Template, VariableSet};

/// Prompting templates.
/// Write your template with `{{variable}}` placeholders, then use the fluent builder to set variables (or add them in from a type that implements Serialize).
///
/// Usage:
/// ```rust
/// use prompt_compile::PromptTemplate;
///
/// let str = "Hello {{ user }}!";
///
/// let template = PromptTemplate::new(str)
///     .with_variable("user", "Rig");
///
/// let res = template.compile().unwrap();
/// assert_eq!(res, "Hello Rig!".to_string());
/// ```
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: Template,
    variables: VariableSet,
}

impl PromptTemplate {
    /// Create a new PromptTemplate instance from a string, or from an already parsed [`Template`].
    pub fn new(template: impl Into<Template>) -> Self {
        Self {
            template: template.into(),
            variables: VariableSet::new(),
        }
    }

    /// Create a new PromptTemplate instance from the text contents of a file.
    /// The file stem is used as the template name in compile errors.
    pub fn from_file<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let template = match path.file_stem().and_then(|s| s.to_str()) {
            Some(name) => Template::named(name, source),
            None => Template::new(source),
        };

        Ok(Self::new(template))
    }

    /// Set a variable for use in the prompt template.
    pub fn with_variable<V>(mut self, k: &str, v: V) -> Self
    where
        V: Into<Value>,
    {
        self.variables.insert(k, v);
        self
    }

    /// Add variables to be used in a PromptTemplate from a type that implements Serialize (ie, a hashmap, a btree, etc...).
    /// Variables that were already set are overwritten on name clashes.
    pub fn with_variables_from_serialize<V>(mut self, v: V) -> Result<Self, CompileError>
    where
        V: Serialize,
    {
        self.variables.extend(VariableSet::from_serialize(v)?);
        Ok(self)
    }

    /// Sets a variable using &mut.
    pub fn set_variable(&mut self, k: &str, v: &str) {
        self.variables.insert(k, v);
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// Compiles the template into a string.
    pub fn compile(&self) -> Result<String, CompileError> {
        self.template.compile(&self.variables)
    }
}

/// A helper trait to make it easier to idiomatically convert types into custom types that can easily use prompt templating.
pub trait PromptTemplating<T> {
    fn with_prompt_template(self, template: impl Into<Template>) -> PromptTemplatingWrapper<T>;
}

/// A prompt templating wrapper (that wraps over a type).
/// Not intended to be instantiated outside of the crate as this is primarily to be used with [`PromptTemplating<T>`].
#[derive(Debug)]
pub struct PromptTemplatingWrapper<T> {
    template: PromptTemplate,
    inner: T,
}

impl<T> PromptTemplatingWrapper<T>
where
    T: Sized,
{
    /// Set a variable for usage with your prompt template.
    pub fn with_variable<V>(mut self, k: &str, v: V) -> Self
    where
        V: Into<Value>,
    {
        self.template = self.template.with_variable(k, v);
        self
    }

    /// Add variables to be used in a PromptTemplate from a type that implements Serialize (ie, a hashmap, a btree, etc...).
    pub fn with_variables_from_serialize<V>(mut self, v: V) -> Result<Self, CompileError>
    where
        V: Serialize,
    {
        self.template = self.template.with_variables_from_serialize(v)?;
        Ok(self)
    }

    /// Compile the wrapped template without sending it anywhere.
    pub fn compile(&self) -> Result<String, CompileError> {
        self.template.compile()
    }
}

impl<M> PromptTemplating<Agent<M>> for Agent<M>
where
    M: CompletionModel + 'static,
{
    fn with_prompt_template(
        self,
        template: impl Into<Template>,
    ) -> PromptTemplatingWrapper<Agent<M>> {
        PromptTemplatingWrapper {
            template: PromptTemplate::new(template),
            inner: self,
        }
    }
}

impl<M> PromptTemplatingWrapper<Agent<M>>
where
    M: CompletionModel,
{
    /// Prompt your agent using your prompt template and the variables you've set.
    pub async fn prompt(self) -> Result<String, TemplatedPromptError> {
        let res = self.template.compile()?;

        Ok(self.inner.prompt(res).await?)
    }

    /// Prompt your agent using your prompt template and the variables you've set, as well as enabling automatic multi-turn.
    pub async fn prompt_multi_turn(self, turns: usize) -> Result<String, TemplatedPromptError> {
        let res = self.template.compile()?;

        Ok(self.inner.prompt(res).multi_turn(turns).await?)
    }

    /// Chat with your agent using your prompt template and the variables you've set, as well as a message history.
    pub async fn chat(self, message_history: Vec<Message>) -> Result<String, TemplatedPromptError> {
        let res = self.template.compile()?;

        Ok(self.inner.chat(res, message_history).await?)
    }
}

/// Errors from prompting an agent with a template.
/// Compilation happens first, so a [`TemplatedPromptError::Compile`] means the model was never called.
#[derive(thiserror::Error, Debug)]
pub enum TemplatedPromptError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}
