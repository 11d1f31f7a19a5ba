//! Hearth LLM Provider Layer
//!
//! Pluggable implementations of the `LlmProvider` trait from `hearth-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing and offline runs
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//!
//! # Examples
//!
//! ```
//! use hearth_llm::MockProvider;
//! use hearth_domain::{CompletionOptions, LlmProvider};
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let options = CompletionOptions::default();
//! let result = provider.generate("system", "test prompt", &options).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod openai;

use hearth_domain::{CompletionOptions, LlmProvider};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use openai::{OpenAiConfig, OpenAiProvider};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider is missing required configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock LLM provider for deterministic testing
///
/// Text completions return pre-configured responses. Structured completions
/// return the configured structured object if one is set, otherwise they
/// parse the text response as JSON, the way a JSON-mode endpoint would.
///
/// # Examples
///
/// ```
/// use hearth_llm::MockProvider;
/// use hearth_domain::{CompletionOptions, LlmProvider};
/// use serde_json::json;
///
/// let options = CompletionOptions::default();
///
/// // Structured output parsed from the text response
/// let provider = MockProvider::new(r#"{"search_name": "Beach Homes"}"#);
/// let value = provider.generate_structured("sys", "prompt", &json!({}), &options).unwrap();
/// assert_eq!(value["search_name"], "Beach Homes");
///
/// // Structured endpoint down, text endpoint still answering
/// let provider = MockProvider::new("plain text").failing_structured();
/// assert!(provider.generate_structured("sys", "prompt", &json!({}), &options).is_err());
/// assert_eq!(provider.generate("sys", "prompt", &options).unwrap(), "plain text");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    structured_response: Option<Value>,
    fail_structured: bool,
    fail_text: bool,
    responses: Arc<Mutex<HashMap<String, String>>>,
    call_count: Arc<Mutex<usize>>,
    structured_call_count: Arc<Mutex<usize>>,
    last_system_prompt: Arc<Mutex<Option<String>>>,
    last_options: Arc<Mutex<Option<CompletionOptions>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    /// Create a new MockProvider with a fixed text response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            structured_response: None,
            fail_structured: false,
            fail_text: false,
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
            structured_call_count: Arc::new(Mutex::new(0)),
            last_system_prompt: Arc::new(Mutex::new(None)),
            last_options: Arc::new(Mutex::new(None)),
        }
    }

    /// Return this object from every structured call
    pub fn with_structured(mut self, response: Value) -> Self {
        self.structured_response = Some(response);
        self
    }

    /// Make every structured call fail
    pub fn failing_structured(mut self) -> Self {
        self.fail_structured = true;
        self
    }

    /// Make every text call fail
    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    /// Add a specific text response for a given user prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), response.into());
    }

    /// Configure to return an error for a specific user prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), "ERROR".to_string());
    }

    /// Total number of calls (text and structured)
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Number of structured calls
    pub fn structured_call_count(&self) -> usize {
        *lock(&self.structured_call_count)
    }

    /// Reset both call counters
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
        *lock(&self.structured_call_count) = 0;
    }

    /// System prompt of the most recent call
    pub fn last_system_prompt(&self) -> Option<String> {
        lock(&self.last_system_prompt).clone()
    }

    /// Completion options of the most recent call
    pub fn last_options(&self) -> Option<CompletionOptions> {
        lock(&self.last_options).clone()
    }

    fn record(&self, system_prompt: &str, options: &CompletionOptions) {
        *lock(&self.call_count) += 1;
        *lock(&self.last_system_prompt) = Some(system_prompt.to_string());
        *lock(&self.last_options) = Some(options.clone());
    }

    fn text_for(&self, prompt: &str) -> Result<String, LlmError> {
        if self.fail_text {
            return Err(LlmError::Communication("Mock provider unavailable".to_string()));
        }
        match lock(&self.responses).get(prompt) {
            Some(response) if response == "ERROR" => Err(LlmError::Other("Mock error".to_string())),
            Some(response) => Ok(response.clone()),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, Self::Error> {
        self.record(system_prompt, options);
        self.text_for(prompt)
    }

    fn generate_structured(
        &self,
        system_prompt: &str,
        prompt: &str,
        _schema: &Value,
        options: &CompletionOptions,
    ) -> Result<Value, Self::Error> {
        self.record(system_prompt, options);
        *lock(&self.structured_call_count) += 1;

        if self.fail_structured {
            return Err(LlmError::InvalidResponse(
                "Mock structured output failure".to_string(),
            ));
        }
        if let Some(response) = &self.structured_response {
            return Ok(response.clone());
        }

        let text = self.text_for(prompt)?;
        serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("Response is not JSON: {}", e)))
    }
}
