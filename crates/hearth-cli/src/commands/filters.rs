//! Filters command implementation.

use crate::cli::FiltersArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use hearth_domain::{FilterCatalog, FilterDefinition, SourceType};

/// Execute the filters command.
pub fn execute_filters(args: FiltersArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let catalog = config.catalog()?;
    let definitions = select(&catalog, args.source.map(SourceType::from));
    println!("{}", formatter.format_catalog(&definitions)?);
    Ok(())
}

fn select(catalog: &FilterCatalog, source: Option<SourceType>) -> Vec<&FilterDefinition> {
    match source {
        Some(source_type) => catalog.for_source(source_type).collect(),
        None => catalog.definitions().iter().collect(),
    }
}
