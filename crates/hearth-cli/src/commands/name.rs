//! Name command implementation.

use super::{build_extractor, read_applied};
use crate::cli::NameArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use hearth_domain::SourceType;
use hearth_extractor::parse_applied_filters;

/// Execute the name command.
pub async fn execute_name(args: NameArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let name = run_name(args, config).await?;
    println!("{}", formatter.format_name(&name)?);
    Ok(())
}

/// Generate a name for the filters in the applied file.
pub async fn run_name(args: NameArgs, config: &Config) -> Result<String> {
    let (source_override, filters) = parse_applied_filters(read_applied(&args.applied)?)?;
    let source_type = source_override.unwrap_or_else(|| SourceType::from(args.source));

    let extractor = build_extractor(config, args.mock.as_deref())?;
    Ok(extractor.name_filters(&filters, source_type).await)
}
