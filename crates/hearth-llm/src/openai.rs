//! OpenAI Provider Implementation
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint.
//!
//! # Features
//!
//! - Async HTTP communication, wrapped for the synchronous provider trait
//! - JSON mode (`response_format: json_object`) for structured requests
//! - Configurable endpoint, key and default model, loadable from the environment
//! - Single attempt per call; callers own any fallback policy
//!
//! # Examples
//!
//! ```no_run
//! use hearth_llm::{OpenAiConfig, OpenAiProvider};
//!
//! let config = OpenAiConfig::from_env().expect("LLM_API_KEY must be set");
//! let provider = OpenAiProvider::new(config).expect("HTTP client");
//! ```

use crate::LlmError;
use hearth_domain::{CompletionOptions, LlmProvider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model when neither the config nor the call names one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default HTTP timeout for a single request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for an OpenAI-compatible API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL, without the trailing endpoint path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Model used when a call does not override it
    #[serde(default = "default_model")]
    pub default_model: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl OpenAiConfig {
    /// Create a config for the public endpoint with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            api_key: api_key.into(),
            default_model: default_model(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load from `LLM_API_KEY`, `LLM_DEFAULT_MODEL` and `LLM_BASE_URL`
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| LlmError::Config("LLM_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override model and base URL from the environment when set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("LLM_DEFAULT_MODEL") {
            self.default_model = model;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            self.base_url = url;
        }
    }
}

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// Connection pooling is disabled: each trait call drives the request on
    /// its own short-lived runtime, so pooled connections would outlive it.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Model a call will use
    fn model_for<'a>(&'a self, options: &'a CompletionOptions) -> &'a str {
        options
            .model
            .as_deref()
            .unwrap_or(self.config.default_model.as_str())
    }

    /// Send one chat completion request and return the message content
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The endpoint is unreachable
    /// - The model is not available (HTTP 404)
    /// - The API rate-limits the key (HTTP 429)
    /// - Any other non-success status (the API's error message is kept)
    /// - The response carries no message content
    pub async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        options: &CompletionOptions,
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let model = self.model_for(options);

        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let request_body = ChatRequest {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!("POST {} (model {}, json_mode {})", url, model, json_mode);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(model.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(LlmError::Communication(format!("API Error ({}): {}", status, message)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no message content".to_string()))
    }

    /// Request a JSON object, appending the schema to the user prompt
    pub async fn complete_json(
        &self,
        system_prompt: &str,
        prompt: &str,
        schema: &Value,
        options: &CompletionOptions,
    ) -> Result<Value, LlmError> {
        let prompt = format!(
            "{}\n\nRespond with a valid JSON object matching this schema: {}",
            prompt, schema
        );
        let content = self.complete(system_prompt, &prompt, options, true).await?;

        serde_json::from_str(&content).map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse structured response: {}", e))
        })
    }
}

/// Drive a future to completion on a private current-thread runtime
fn block_on<F: Future>(future: F) -> Result<F::Output, LlmError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, Self::Error> {
        block_on(self.complete(system_prompt, prompt, options, false))?
    }

    fn generate_structured(
        &self,
        system_prompt: &str,
        prompt: &str,
        schema: &Value,
        options: &CompletionOptions,
    ) -> Result<Value, Self::Error> {
        block_on(self.complete_json(system_prompt, prompt, schema, options))?
    }
}
