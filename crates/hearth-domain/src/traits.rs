//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-call completion settings
///
/// Passed by value into every provider call so that model choice and
/// sampling parameters are never shared, mutable provider state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Model override; `None` means the provider's default model
    #[serde(default)]
    pub model: Option<String>,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (hearth-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a free-text completion
    fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, Self::Error>;

    /// Generate a JSON object conforming (best-effort) to `schema`
    ///
    /// Returns an error when the provider fails or its output is not JSON.
    /// Schema conformance is not guaranteed; callers must validate.
    fn generate_structured(
        &self,
        system_prompt: &str,
        prompt: &str,
        schema: &Value,
        options: &CompletionOptions,
    ) -> Result<Value, Self::Error>;
}
