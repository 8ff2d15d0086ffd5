//! The Langfuse prompt provider.
//!
//! Fetches text prompts from the Langfuse public API (`/api/public/v2/prompts/{name}`),
//! authenticating with a project's public/secret key pair.
//!
//! ```rust,no_run
//! use prompt_compile::providers::{FetchRequest, PromptProvider, langfuse::Client};
//! use prompt_compile::template::VariableSet;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::from_env()?;
//!
//! let prompt = client
//!     .fetch(FetchRequest::new("langfuse-playground/example").label("251105"))
//!     .await?;
//!
//! let text = prompt.compile(&VariableSet::new().with_variable("user_name", "Sam"))?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```
use std::fmt::{self, Debug};

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{FetchRequest, Prompt, PromptProvider, PromptSelector, ProviderError};

pub const LANGFUSE_PUBLIC_KEY_ENV: &str = "LANGFUSE_PUBLIC_KEY";
pub const LANGFUSE_SECRET_KEY_ENV: &str = "LANGFUSE_SECRET_KEY";
pub const LANGFUSE_HOST_ENV: &str = "LANGFUSE_HOST";

/// Langfuse Cloud.
pub const LANGFUSE_DEFAULT_HOST: &str = "https://cloud.langfuse.com";

/// Credentials and endpoint for a Langfuse project.
#[derive(Clone, PartialEq, Eq)]
pub struct LangfuseConfig {
    pub public_key: String,
    pub secret_key: String,
    pub base_url: String,
}

impl Debug for LangfuseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LangfuseConfig")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LangfuseConfig {
    pub fn new(public_key: &str, secret_key: &str) -> Self {
        Self {
            public_key: public_key.to_string(),
            secret_key: secret_key.to_string(),
            base_url: LANGFUSE_DEFAULT_HOST.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Read `LANGFUSE_PUBLIC_KEY`, `LANGFUSE_SECRET_KEY` and the optional `LANGFUSE_HOST`
    /// from the process environment.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`LangfuseConfig::from_env`], reading variables through `lookup`.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let public_key = get(LANGFUSE_PUBLIC_KEY_ENV);
        let secret_key = get(LANGFUSE_SECRET_KEY_ENV);

        let (Some(public_key), Some(secret_key)) = (public_key.clone(), secret_key.clone()) else {
            let missing: Vec<&str> = [
                (LANGFUSE_PUBLIC_KEY_ENV, public_key.is_none()),
                (LANGFUSE_SECRET_KEY_ENV, secret_key.is_none()),
            ]
            .into_iter()
            .filter_map(|(key, is_missing)| is_missing.then_some(key))
            .collect();

            return Err(ProviderError::Configuration(format!(
                "{} must be set",
                missing.join(" and ")
            )));
        };

        let base_url = get(LANGFUSE_HOST_ENV).unwrap_or_else(|| LANGFUSE_DEFAULT_HOST.to_string());

        Ok(Self {
            public_key,
            secret_key,
            base_url,
        })
    }
}

#[derive(Clone)]
pub struct Client {
    config: LangfuseConfig,
    http_client: reqwest::Client,
}

impl Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("http_client", &self.http_client)
            .finish()
    }
}

impl Client {
    pub fn new(public_key: &str, secret_key: &str) -> Self {
        Self::with_config(LangfuseConfig::new(public_key, secret_key))
    }

    pub fn from_url(public_key: &str, secret_key: &str, base_url: &str) -> Self {
        Self::with_config(LangfuseConfig::new(public_key, secret_key).with_base_url(base_url))
    }

    pub fn with_config(config: LangfuseConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client from the environment, failing before any request if credentials are missing.
    pub fn from_env() -> Result<Self, ProviderError> {
        Ok(Self::with_config(LangfuseConfig::from_env()?))
    }

    pub fn with_custom_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn config(&self) -> &LangfuseConfig {
        &self.config
    }

    fn prompt_url(&self, request: &FetchRequest) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            ProviderError::Configuration(format!(
                "invalid Langfuse host `{}`: {e}",
                self.config.base_url
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::Configuration(format!(
                    "Langfuse host `{}` cannot be used as a base URL",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "public", "v2", "prompts", request.name()]);

        match request.selector() {
            PromptSelector::Production => {}
            PromptSelector::Version(v) => {
                url.query_pairs_mut()
                    .append_pair("version", &v.to_string());
            }
            PromptSelector::Label(l) => {
                url.query_pairs_mut().append_pair("label", l);
            }
        }

        Ok(url)
    }
}

impl PromptProvider for Client {
    async fn fetch(&self, request: FetchRequest) -> Result<Prompt, ProviderError> {
        let url = self.prompt_url(&request)?;

        tracing::debug!(
            "Fetching prompt `{}` ({}) from {}",
            request.name(),
            request.selector(),
            self.config.base_url
        );

        let response = self
            .http_client
            .get(url)
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, body, request));
        }

        let prompt = match serde_json::from_str::<PromptResponse>(&body)? {
            PromptResponse::Text {
                name,
                version,
                prompt,
                config,
                labels,
            } => Prompt::new(&name, version, &prompt)
                .with_labels(labels)
                .with_config(config),
            PromptResponse::Chat { name } => {
                return Err(ProviderError::UnsupportedPromptType {
                    name,
                    kind: "chat".to_string(),
                });
            }
        };

        tracing::info!(
            "Retrieved prompt `{}` version {} (labels: {:?})",
            prompt.name,
            prompt.version,
            prompt.labels
        );

        Ok(prompt)
    }
}

fn error_for_status(status: StatusCode, body: String, request: FetchRequest) -> ProviderError {
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::warn!("Langfuse rejected the configured credentials: {message}");
            ProviderError::Authentication(message)
        }
        StatusCode::NOT_FOUND => ProviderError::NotFound {
            name: request.name().to_string(),
            selector: request.selector().clone(),
        },
        _ => ProviderError::Request {
            status: status.as_u16(),
            message,
        },
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum PromptResponse {
    Text {
        name: String,
        version: u32,
        prompt: String,
        #[serde(default)]
        config: Value,
        #[serde(default)]
        labels: Vec<String>,
    },
    Chat {
        name: String,
    },
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}
