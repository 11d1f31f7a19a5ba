//! Command implementations.

pub mod extract;
pub mod filters;
pub mod name;

pub use self::extract::execute_extract;
pub use self::filters::execute_filters;
pub use self::name::execute_name;

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::provider::CliProvider;
use hearth_extractor::Extractor;
use hearth_gatekeeper::Gatekeeper;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Build an extractor over the configured catalog and selected provider.
pub(crate) fn build_extractor(config: &Config, mock: Option<&Path>) -> Result<Extractor<CliProvider>> {
    let catalog = Arc::new(config.catalog()?);
    let provider = CliProvider::select(mock, config)?;
    Ok(Extractor::new(
        provider,
        Gatekeeper::new(catalog),
        config.extractor.clone(),
    ))
}

/// Read a JSON array of applied filters from a file.
pub(crate) fn read_applied(path: &Path) -> Result<Vec<Value>> {
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    match value {
        Value::Array(values) => Ok(values),
        _ => Err(CliError::InvalidInput(format!(
            "{} must contain a JSON array of filters",
            path.display()
        ))),
    }
}
