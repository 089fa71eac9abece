//! Search command handler
//!
//! Loads a fixed number of pages for one query and prints the merged list.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use scout_core::RepositoryStore;
use scout_core::domain::repository::Repository;
use scout_core::dto::search::SearchQuery;

use crate::config::Config;
use crate::explorer::{Explorer, LoadOutcome};
use crate::render;

/// JSON shape printed by `--json`
#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a SearchQuery,
    total_count: u64,
    repositories: &'a [Repository],
}

/// Handle the search command
///
/// # Arguments
/// * `query` - What to search for
/// * `pages` - How many pages to load at most
/// * `json` - Print JSON instead of the colored list
/// * `config` - The CLI configuration
pub async fn handle_search_command(
    query: SearchQuery,
    pages: u32,
    json: bool,
    config: &Config,
) -> Result<()> {
    let client = Arc::new(config.build_client()?);
    let store = Arc::new(Mutex::new(RepositoryStore::new()));
    let explorer = Explorer::new(store, client, query.clone());

    let mut total_count = 0;
    for _ in 0..pages.max(1) {
        match explorer
            .load_more()
            .await
            .context("Failed to search repositories")?
        {
            LoadOutcome::Loaded {
                total_count: total, ..
            } => total_count = total,
            LoadOutcome::Busy | LoadOutcome::Exhausted => break,
        }
    }

    let repositories = explorer.repositories();

    if json {
        let output = SearchOutput {
            query: &query,
            total_count,
            repositories: &repositories,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    render::print_query(&query);
    println!(
        "{}",
        format!("{} matching repositories", total_count).dimmed()
    );
    println!();
    render::print_list(&repositories, query.sort);

    Ok(())
}
