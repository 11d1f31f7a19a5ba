//! LLM provider selection for CLI commands.

use crate::config::Config;
use crate::error::{CliError, Result};
use hearth_domain::{CompletionOptions, LlmProvider};
use hearth_llm::{LlmError, MockProvider, OpenAiProvider};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "LLM_API_KEY";

/// Provider used by a command run.
///
/// `Mock` answers every call with the contents of a file: structured calls
/// parse it as JSON, text calls return it verbatim.
pub enum CliProvider {
    /// Canned reply read from disk
    Mock(MockProvider),
    /// OpenAI-compatible HTTP endpoint
    OpenAi(OpenAiProvider),
}

impl CliProvider {
    /// Pick the mock provider when a reply file is given, the HTTP provider otherwise.
    pub fn select(mock: Option<&Path>, config: &Config) -> Result<Self> {
        match mock {
            Some(path) => {
                debug!("Using mock reply from {}", path.display());
                let contents = fs::read_to_string(path)?;
                Ok(CliProvider::Mock(MockProvider::new(contents)))
            }
            None => {
                let api_key = std::env::var(API_KEY_VAR).map_err(|_| {
                    CliError::Config(format!(
                        "{} is not set; export it or pass --mock <file>",
                        API_KEY_VAR
                    ))
                })?;
                let provider = OpenAiProvider::new(config.openai_config(api_key))?;
                Ok(CliProvider::OpenAi(provider))
            }
        }
    }
}

impl LlmProvider for CliProvider {
    type Error = LlmError;

    fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> std::result::Result<String, Self::Error> {
        match self {
            CliProvider::Mock(p) => p.generate(system_prompt, prompt, options),
            CliProvider::OpenAi(p) => p.generate(system_prompt, prompt, options),
        }
    }

    fn generate_structured(
        &self,
        system_prompt: &str,
        prompt: &str,
        schema: &Value,
        options: &CompletionOptions,
    ) -> std::result::Result<Value, Self::Error> {
        match self {
            CliProvider::Mock(p) => p.generate_structured(system_prompt, prompt, schema, options),
            CliProvider::OpenAi(p) => p.generate_structured(system_prompt, prompt, schema, options),
        }
    }
}
