//! Prompt providers: places prompt templates are fetched from.
//!
//! A provider resolves a prompt by name plus a [`PromptSelector`]: the current production
//! version, an exact version number, or a label. Currently supported providers:
//! - [`langfuse`]: the Langfuse public prompt API
//! - [`in_memory`]: a local versioned store, handy for tests and offline work
use std::fmt;

use serde_json::Value;

use crate::template::{CompileError, Template, VariableSet};

pub mod in_memory;
pub mod langfuse;

/// The label a provider resolves when no version or label is requested.
pub const PRODUCTION_LABEL: &str = "production";

/// The label that always points at the newest version of a prompt.
pub const LATEST_LABEL: &str = "latest";

/// Something that can resolve a named prompt template.
pub trait PromptProvider {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl std::future::Future<Output = Result<Prompt, ProviderError>> + Send;
}

/// Which version of a prompt to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PromptSelector {
    /// Whatever the provider considers current; the `production` label for the bundled providers.
    #[default]
    Production,
    Version(u32),
    Label(String),
}

impl fmt::Display for PromptSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "label `{PRODUCTION_LABEL}`"),
            Self::Version(v) => write!(f, "version {v}"),
            Self::Label(l) => write!(f, "label `{l}`"),
        }
    }
}

/// A request for a named prompt. At most one of version or label can be set; setting one replaces the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    name: String,
    selector: PromptSelector,
}

impl FetchRequest {
    pub fn new(name: &str) -> Self {
        Self::from(name)
    }

    /// Build a request from optional version and label arguments.
    /// Supplying both is rejected rather than guessing which one should win.
    pub fn from_options(
        name: &str,
        version: Option<u32>,
        label: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let selector = match (version, label) {
            (Some(_), Some(_)) => {
                return Err(ProviderError::InvalidSelector(format!(
                    "cannot request both a version and a label for prompt `{name}`"
                )));
            }
            (Some(version), None) => PromptSelector::Version(version),
            (None, Some(label)) => PromptSelector::Label(label.to_string()),
            (None, None) => PromptSelector::Production,
        };

        Ok(Self {
            name: name.to_string(),
            selector,
        })
    }

    pub fn version(mut self, version: u32) -> Self {
        self.selector = PromptSelector::Version(version);
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.selector = PromptSelector::Label(label.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selector(&self) -> &PromptSelector {
        &self.selector
    }
}

impl From<&str> for FetchRequest {
    fn from(value: &str) -> Self {
        Self {
            name: value.to_string(),
            selector: PromptSelector::Production,
        }
    }
}

impl From<String> for FetchRequest {
    fn from(value: String) -> Self {
        Self {
            name: value,
            selector: PromptSelector::Production,
        }
    }
}

impl From<(&str, u32)> for FetchRequest {
    fn from((name, version): (&str, u32)) -> Self {
        Self::from(name).version(version)
    }
}

/// A prompt resolved by a [`PromptProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub name: String,
    pub version: u32,
    pub labels: Vec<String>,
    /// Free-form configuration stored alongside the prompt (model parameters and the like).
    pub config: Value,
    template: Template,
}

impl Prompt {
    pub fn new(name: &str, version: u32, source: &str) -> Self {
        Self {
            name: name.to_string(),
            version,
            labels: Vec::new(),
            config: Value::Null,
            template: Template::named(name, source),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// The template, named after the prompt.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// The raw template text.
    pub fn source(&self) -> &str {
        self.template.source()
    }

    pub fn compile(&self, variables: &VariableSet) -> Result<String, CompileError> {
        self.template.compile(variables)
    }
}

impl From<Prompt> for Template {
    fn from(value: Prompt) -> Self {
        value.template
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("Prompt `{name}` not found ({selector})")]
    NotFound {
        name: String,
        selector: PromptSelector,
    },
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid prompt selector: {0}")]
    InvalidSelector(String),
    #[error("Prompt `{name}` is a {kind} prompt; only text prompts are supported")]
    UnsupportedPromptType { name: String, kind: String },
    #[error("Request failed with status {status}: {message}")]
    Request { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ProviderError {
    /// Whether retrying the same request might succeed. This crate never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Request { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_production() {
        let req = FetchRequest::new("langfuse-playground/example");
        assert_eq!(req.name(), "langfuse-playground/example");
        assert_eq!(req.selector(), &PromptSelector::Production);
    }

    #[test]
    fn last_selector_wins() {
        let req = FetchRequest::new("p").version(3).label("251105");
        assert_eq!(req.selector(), &PromptSelector::Label("251105".into()));

        let req = FetchRequest::from(("p", 1));
        assert_eq!(req.selector(), &PromptSelector::Version(1));
    }

    #[test]
    fn from_options_accepts_legal_shapes() {
        let req = FetchRequest::from_options("p", None, None).unwrap();
        assert_eq!(req.selector(), &PromptSelector::Production);

        let req = FetchRequest::from_options("p", Some(2), None).unwrap();
        assert_eq!(req.selector(), &PromptSelector::Version(2));

        let req = FetchRequest::from_options("p", None, Some("staging")).unwrap();
        assert_eq!(req.selector(), &PromptSelector::Label("staging".into()));
    }

    #[test]
    fn from_options_rejects_version_and_label() {
        let err = FetchRequest::from_options("p", Some(2), Some("staging")).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidSelector(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn not_found_message_names_the_selector() {
        let err = ProviderError::NotFound {
            name: "greeting".into(),
            selector: PromptSelector::Version(7),
        };
        assert_eq!(err.to_string(), "Prompt `greeting` not found (version 7)");
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = ProviderError::Request {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_retryable());

        let err = ProviderError::Request {
            status: 400,
            message: "bad".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn prompt_template_is_named_after_prompt() {
        let prompt = Prompt::new("compile-example", 1, "Hi {{user_name}}");
        assert_eq!(prompt.template().name(), Some("compile-example"));
        let err = prompt.compile(&VariableSet::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Template `compile-example` is missing variables: user_name"
        );
    }
}
