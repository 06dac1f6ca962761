//! # Agricheck CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `tree` - Print the collection hierarchy
//! - `search` - Search collections by label or comment
//! - `compress` - Reduce a selection to its minimal covering set
//! - `checklist` - Build a checklist for a `groups` value
//! - `query` - Print the SPARQL query that would be sent
//! - `fetch` - Save the raw query results for offline use

mod commands;

use crate::config::AppConfig;
use agricheck_core::AgricheckError;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Agricheck - inspection checklists from the agricultural control taxonomy
///
/// Reads the control point hierarchy from a SPARQL endpoint (or a saved
/// snapshot) and turns a selection of groups into a printable checklist.
#[derive(Parser, Debug)]
#[command(name = "agricheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./agricheck.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SPARQL endpoint URL
    #[arg(short = 'E', long, global = true)]
    pub endpoint: Option<String>,

    /// Language tag for labels and comments
    #[arg(short = 'L', long, global = true)]
    pub lang: Option<String>,

    /// Read results from a file saved with `fetch` instead of the endpoint
    #[arg(short = 'b', long, global = true)]
    pub bindings: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Checklist output formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistFormat {
    Text,
    Html,
    Json,
    Csv,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the collection hierarchy
    Tree,

    /// Search collections by label or comment
    Search {
        /// Text to look for (case-insensitive)
        query: String,
    },

    /// Reduce a selection to its minimal covering set
    Compress {
        /// Selected ids or slugs (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        select: Vec<String>,
    },

    /// Build a checklist
    Checklist {
        /// `groups` value as it appears in a checklist link
        #[arg(short, long)]
        groups: String,

        /// Output format
        #[arg(short = 't', long, value_enum, default_value = "text")]
        format: ChecklistFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the SPARQL query for the configured language
    Query,

    /// Save the raw query results for use with --bindings
    Fetch {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Effective configuration: file and environment, then CLI flags.
pub fn resolve_config(
    config_path: Option<&Path>,
    endpoint: Option<String>,
    lang: Option<String>,
) -> Result<AppConfig, AgricheckError> {
    resolve_config_with(config_path, endpoint, lang, |key| std::env::var(key).ok())
}

/// [`resolve_config`] with an explicit variable lookup. Validation runs once,
/// after the flags are merged.
pub fn resolve_config_with(
    config_path: Option<&Path>,
    endpoint: Option<String>,
    lang: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, AgricheckError> {
    let mut config = AppConfig::read(config_path, lookup)?;
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    if let Some(lang) = lang {
        config.language = lang;
    }
    config.validate()?;
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AgricheckError> {
    let config = resolve_config(cli.config.as_deref(), cli.endpoint, cli.lang)?;
    if cli.verbose {
        tracing::info!(
            endpoint = %config.endpoint,
            language = %config.language,
            base_iri = %config.base_iri,
            "Configuration resolved"
        );
    }

    let bindings = cli.bindings.as_deref();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&config, bindings, host.as_deref(), port).await
        }
        Some(Commands::Tree) | None => cmd_tree(&config, bindings, json_mode).await,
        Some(Commands::Search { query }) => {
            cmd_search(&config, bindings, json_mode, &query).await
        }
        Some(Commands::Compress { select }) => {
            cmd_compress(&config, bindings, json_mode, &select).await
        }
        Some(Commands::Checklist {
            groups,
            format,
            output,
        }) => cmd_checklist(&config, bindings, &groups, format, output.as_deref()).await,
        Some(Commands::Query) => cmd_query(&config),
        Some(Commands::Fetch { output }) => cmd_fetch(&config, bindings, &output).await,
    }
}

// =============================================================================
// TESTS
// =============================================================================
