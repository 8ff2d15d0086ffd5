//! A local, versioned prompt store.
//!
//! Mirrors how a remote prompt store resolves requests, without the network:
//! - every [`InMemoryPromptStore::insert`] creates the next version of a prompt, starting at 1
//! - a label lives on at most one version of a prompt; re-using it moves it to the new version
//! - `latest` always resolves to the newest version
//! - a request without a version or label resolves the `production` label
use std::collections::HashMap;

use serde_json::Value;

use super::{
    FetchRequest, LATEST_LABEL, PRODUCTION_LABEL, Prompt, PromptProvider, PromptSelector,
    ProviderError,
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryPromptStore {
    prompts: HashMap<String, Vec<Prompt>>,
}

impl InMemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new version of the prompt `name` and return its version number.
    pub fn insert(&mut self, name: &str, source: &str, labels: &[&str]) -> u32 {
        self.insert_with_config(name, source, labels, Value::Null)
    }

    /// Like [`InMemoryPromptStore::insert`], also storing a config object with the prompt.
    pub fn insert_with_config(
        &mut self,
        name: &str,
        source: &str,
        labels: &[&str],
        config: Value,
    ) -> u32 {
        let versions = self.prompts.entry(name.to_string()).or_default();

        for existing in versions.iter_mut() {
            existing.labels.retain(|l| !labels.contains(&l.as_str()));
        }

        let version = versions.last().map_or(1, |p| p.version + 1);
        let labels = labels
            .iter()
            .filter(|l| **l != LATEST_LABEL)
            .map(|l| l.to_string())
            .collect();

        versions.push(
            Prompt::new(name, version, source)
                .with_labels(labels)
                .with_config(config),
        );

        tracing::debug!("Stored prompt `{name}` version {version}");

        version
    }

    fn resolve(&self, request: &FetchRequest) -> Option<Prompt> {
        let versions = self.prompts.get(request.name())?;

        let found = match request.selector() {
            PromptSelector::Version(v) => versions.iter().find(|p| p.version == *v),
            PromptSelector::Label(l) if l == LATEST_LABEL => versions.last(),
            PromptSelector::Label(l) => versions.iter().find(|p| p.labels.contains(l)),
            PromptSelector::Production => versions
                .iter()
                .find(|p| p.labels.iter().any(|l| l == PRODUCTION_LABEL)),
        }?;

        let mut prompt = found.clone();
        if versions.last().is_some_and(|p| p.version == prompt.version) {
            prompt.labels.push(LATEST_LABEL.to_string());
        }

        Some(prompt)
    }
}

impl PromptProvider for InMemoryPromptStore {
    async fn fetch(&self, request: FetchRequest) -> Result<Prompt, ProviderError> {
        match self.resolve(&request) {
            Some(prompt) => Ok(prompt),
            None => Err(ProviderError::NotFound {
                name: request.name().to_string(),
                selector: request.selector().clone(),
            }),
        }
    }
}
