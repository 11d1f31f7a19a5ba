//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use hearth_domain::SourceType;
use std::path::PathBuf;

/// Hearth CLI - Turn natural-language searches into structured filters.
#[derive(Debug, Parser)]
#[command(name = "hearth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (defaults to ~/.hearth/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract filters from a natural-language prompt
    Extract(ExtractArgs),

    /// List the filter catalog
    Filters(FiltersArgs),

    /// Generate a name for a set of applied filters
    Name(NameArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Search prompt, e.g. "3 bedroom homes under 400k"
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// JSON file with the currently applied filters
    #[arg(short, long)]
    pub applied: Option<PathBuf>,

    /// Dataset to search
    #[arg(short, long, value_enum, default_value = "properties")]
    pub source: SourceArg,

    /// Answer from this file instead of calling the LLM API
    #[arg(long, env = "HEARTH_MOCK_RESPONSE")]
    pub mock: Option<PathBuf>,
}

/// Arguments for the filters command.
#[derive(Debug, Parser)]
pub struct FiltersArgs {
    /// Only list filters for this dataset
    #[arg(short, long, value_enum)]
    pub source: Option<SourceArg>,
}

/// Arguments for the name command.
#[derive(Debug, Parser)]
pub struct NameArgs {
    /// JSON file with the filters to name
    #[arg(short, long)]
    pub applied: PathBuf,

    /// Dataset the filters belong to
    #[arg(short, long, value_enum, default_value = "properties")]
    pub source: SourceArg,

    /// Answer from this file instead of calling the LLM API
    #[arg(long, env = "HEARTH_MOCK_RESPONSE")]
    pub mock: Option<PathBuf>,
}

/// Dataset argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceArg {
    /// Property records
    Properties,
    /// Contact records
    Contacts,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

impl From<SourceArg> for SourceType {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Properties => SourceType::Properties,
            SourceArg::Contacts => SourceType::Contacts,
        }
    }
}
