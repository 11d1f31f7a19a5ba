//! Extract command implementation.

use super::{build_extractor, read_applied};
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use hearth_domain::SourceType;
use hearth_extractor::{parse_applied_filters, ExtractionRequest, ExtractionResult};
use tracing::debug;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let result = run_extract(args, config).await?;
    println!("{}", formatter.format_extraction(&result)?);
    Ok(())
}

/// Run an extraction and return the result without printing it.
pub async fn run_extract(args: ExtractArgs, config: &Config) -> Result<ExtractionResult> {
    let applied = match &args.applied {
        Some(path) => read_applied(path)?,
        None => Vec::new(),
    };
    let (source_override, applied_filters) = parse_applied_filters(applied)?;

    // A source_type entry in the applied list wins over --source
    let source_type = source_override.unwrap_or_else(|| SourceType::from(args.source));
    debug!(
        "Extracting for {} with {} applied filters",
        source_type,
        applied_filters.len()
    );

    let extractor = build_extractor(config, args.mock.as_deref())?;
    let request = ExtractionRequest::new(args.prompt, source_type).with_applied(applied_filters);
    Ok(extractor.extract(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SourceArg;
    use crate::error::CliError;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn write_json(value: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    fn args(prompt: &str, applied: Option<PathBuf>, mock: PathBuf) -> ExtractArgs {
        ExtractArgs {
            prompt: prompt.to_string(),
            applied,
            source: SourceArg::Properties,
            mock: Some(mock),
        }
    }

    #[tokio::test]
    async fn test_extract_with_mock_reply() {
        let reply = write_json(json!({
            "filters": [
                {"id": 1, "type": "number", "source_type": "properties", "label": "Property Value",
                 "filterType": "lt", "value": 400000}
            ],
            "explanation": {"matched": "under 400k", "unmatched": ""},
            "search_name": "Homes Under 400K"
        }));

        let result = run_extract(
            args("homes under 400k", None, reply.path().to_path_buf()),
            &Config::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.search_name, "Homes Under 400K");
        assert_eq!(result.filter_count, 1);
        assert_eq!(result.new_filter_count, 1);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_source_override_from_applied_file() {
        let reply = write_json(json!({"filters": [], "search_name": "Contacts"}));
        let applied = write_json(json!([{"type": "source_type", "value": "contacts"}]));

        let result = run_extract(
            args(
                "anyone",
                Some(applied.path().to_path_buf()),
                reply.path().to_path_buf(),
            ),
            &Config::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.search_type, SourceType::Contacts.search_type());
        assert_eq!(result.applied_filters_count, 0);
    }

    #[tokio::test]
    async fn test_malformed_applied_filter() {
        let reply = write_json(json!({"filters": []}));
        let applied = write_json(json!([{"id": "three"}]));

        let result = run_extract(
            args(
                "homes",
                Some(applied.path().to_path_buf()),
                reply.path().to_path_buf(),
            ),
            &Config::default(),
        )
        .await;

        assert!(matches!(result, Err(CliError::Extractor(_))));
    }
}
