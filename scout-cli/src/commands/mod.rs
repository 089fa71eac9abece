//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod browse;
mod search;

use anyhow::Result;
use clap::{Args, Subcommand};
use scout_core::dto::search::{DEFAULT_QUERY, SearchQuery, SortField, SortOrder};

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Search repositories and print the results
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Print the merged list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse results interactively, with local edits and deletions
    Browse {
        #[command(flatten)]
        query: QueryArgs,
    },
}

/// Search parameters shared by every command
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Search text
    #[arg(default_value = DEFAULT_QUERY)]
    pub text: String,

    /// Sort key (stars, forks, updated)
    #[arg(long, default_value = "stars")]
    pub sort: SortField,

    /// Sort direction (asc, desc)
    #[arg(long, default_value = "desc")]
    pub order: SortOrder,
}

impl From<QueryArgs> for SearchQuery {
    fn from(args: QueryArgs) -> Self {
        SearchQuery::new(args.text)
            .with_sort(args.sort)
            .with_order(args.order)
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Search { query, pages, json } => {
            search::handle_search_command(query.into(), pages, json, config).await
        }
        Commands::Browse { query } => browse::handle_browse_command(query.into(), config).await,
    }
}
