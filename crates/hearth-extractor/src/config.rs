//! Configuration for the Extractor

use hearth_domain::CompletionOptions;
use serde::{Deserialize, Serialize};

/// Configuration for the Extractor
///
/// Model choice and sampling parameters are a value owned by each
/// `Extractor`; they are turned into per-call `CompletionOptions` and never
/// written back to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Model used for filter extraction
    pub model: String,

    /// Sampling temperature for filter extraction
    pub temperature: f32,

    /// Maximum tokens for the extraction reply
    pub max_tokens: u32,

    /// Model used to name a filter set
    pub naming_model: String,

    /// Sampling temperature for naming
    pub naming_temperature: f32,

    /// Maximum applied filters shown to the model as context
    pub context_filters_limit: usize,

    /// Characters of the prompt used in the fallback search name
    pub name_prompt_chars: usize,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.naming_model.trim().is_empty() {
            return Err("naming_model must not be empty".to_string());
        }
        for (name, temperature) in [
            ("temperature", self.temperature),
            ("naming_temperature", self.naming_temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("{} must be between 0.0 and 2.0", name));
            }
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.name_prompt_chars == 0 {
            return Err("name_prompt_chars must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Completion options for the extraction call
    pub fn extraction_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: Some(self.model.clone()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Completion options for the naming call
    pub fn naming_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: Some(self.naming_model.clone()),
            temperature: self.naming_temperature,
            max_tokens: 100,
        }
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            naming_model: "gpt-4o-mini".to_string(),
            naming_temperature: 0.7,
            context_filters_limit: 20,
            name_prompt_chars: 30,
        }
    }
}

impl ExtractorConfig {
    /// Precise preset: deterministic sampling, more applied-filter context
    pub fn precise() -> Self {
        Self {
            temperature: 0.0,
            naming_temperature: 0.2,
            context_filters_limit: 50,
            ..Self::default()
        }
    }

    /// Economy preset: the small model for both calls, shorter replies
    pub fn economy() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            context_filters_limit: 10,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
