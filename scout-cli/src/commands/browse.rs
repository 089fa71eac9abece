//! Browse command handler
//!
//! Interactive session over one repository store. Each input line is one user
//! action; store changes are rendered after every action.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use colored::*;
use scout_client::ClientError;
use scout_core::domain::repository::{RepositoryId, RepositoryPatch};
use scout_core::dto::search::{SearchQuery, SortField, SortOrder};
use scout_core::{RepositoryStore, StoreEvent};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::{Receiver, error::TryRecvError};
use tracing::debug;

use crate::config::Config;
use crate::explorer::{Explorer, LoadOutcome};
use crate::render;

const HELP: &str = "\
Commands:
  search <text>                    New search from page 1
  sort <stars|forks|updated>       Change the sort key
  order <asc|desc>                 Change the sort direction
  toggle                           Flip the sort direction
  more                             Load the next page
  list                             Show the current list
  edit <id> key=value...           Edit locally (name, description, stars, forks)
  delete <id>                      Delete locally (asks for confirmation)
  help                             Show this help
  quit                             Leave";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Search(String),
    Sort(SortField),
    Order(SortOrder),
    Toggle,
    More,
    List,
    Edit(RepositoryId, RepositoryPatch),
    Delete(RepositoryId),
    Help,
    Quit,
}

/// Parses one input line; blank lines yield `None`
pub fn parse_command(line: &str) -> Result<Option<BrowseCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "search" | "s" => {
            if rest.is_empty() {
                return Err("usage: search <text>".to_string());
            }
            BrowseCommand::Search(rest.to_string())
        }
        "sort" => BrowseCommand::Sort(rest.parse()?),
        "order" => BrowseCommand::Order(rest.parse()?),
        "toggle" => BrowseCommand::Toggle,
        "more" | "m" => BrowseCommand::More,
        "list" | "ls" => BrowseCommand::List,
        "edit" => parse_edit(rest)?,
        "delete" | "rm" => BrowseCommand::Delete(parse_id(rest)?),
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };

    Ok(Some(command))
}

fn parse_id(input: &str) -> Result<RepositoryId, String> {
    input
        .trim()
        .parse()
        .map_err(|_| format!("invalid repository id '{}'", input.trim()))
}

/// Keys accepted by `edit`
const EDIT_KEYS: [&str; 5] = ["name", "description", "desc", "stars", "forks"];

/// Parses `<id> key=value [key=value ...]` into one patch
///
/// A value runs until the next `key=` token, so it may contain spaces.
/// Surrounding quotes are stripped.
fn parse_edit(rest: &str) -> Result<BrowseCommand, String> {
    const USAGE: &str =
        "usage: edit <id> name=<text> description=<text> stars=<n> forks=<n>";

    let mut tokens = rest.split_whitespace();
    let id = parse_id(tokens.next().ok_or(USAGE)?)?;

    let mut fields: Vec<(String, Vec<&str>)> = Vec::new();
    for token in tokens {
        let key = token
            .split_once('=')
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .filter(|(key, _)| EDIT_KEYS.contains(&key.as_str()));

        match key {
            Some((key, value)) => fields.push((key, vec![value])),
            None => match fields.last_mut() {
                Some((_, words)) => words.push(token),
                None => {
                    return Err(match token.split_once('=') {
                        Some((key, _)) => format!("field '{}' cannot be edited", key),
                        None => USAGE.to_string(),
                    });
                }
            },
        }
    }

    if fields.is_empty() {
        return Err(USAGE.to_string());
    }

    let count = |v: &str| {
        v.parse::<u64>()
            .map_err(|_| format!("'{}' is not a non-negative integer", v))
    };

    let mut patch = RepositoryPatch::default();
    for (key, words) in fields {
        let joined = words.join(" ");
        let value = unquote(joined.trim());
        if value.is_empty() {
            return Err(format!("{}= needs a value", key));
        }

        match key.as_str() {
            "name" => patch.name = Some(value.to_string()),
            "description" | "desc" => patch.description = Some(value.to_string()),
            "stars" => patch.stargazers_count = Some(count(value)?),
            "forks" => patch.forks_count = Some(count(value)?),
            other => return Err(format!("field '{}' cannot be edited", other)),
        }
    }

    Ok(BrowseCommand::Edit(id, patch))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| {
            value
                .strip_prefix(*q)
                .and_then(|v| v.strip_suffix(*q))
        })
        .unwrap_or(value)
}

/// Handle the browse command
///
/// # Arguments
/// * `query` - Initial search parameters
/// * `config` - The CLI configuration
pub async fn handle_browse_command(query: SearchQuery, config: &Config) -> Result<()> {
    let client = Arc::new(config.build_client()?);
    let store = Arc::new(Mutex::new(RepositoryStore::new()));
    let explorer = Explorer::new(store, client, query);
    let mut events = explorer.subscribe();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", "Type 'help' for commands.".dimmed());
    render::print_query(&explorer.query());
    report(&explorer, explorer.load_more().await);
    render_changes(&mut events, &explorer);

    loop {
        prompt()?;
        let Some(line) = input.next_line().await.context("Failed to read input")? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message.red());
                continue;
            }
        };
        debug!("Browse command: {:?}", command);

        match command {
            BrowseCommand::Search(text) => {
                report(&explorer, explorer.submit_search(&text).await);
                render::print_query(&explorer.query());
            }
            BrowseCommand::Sort(sort) => {
                report(&explorer, explorer.change_sort(sort).await);
                render::print_query(&explorer.query());
            }
            BrowseCommand::Order(order) => {
                report(&explorer, explorer.change_order(order).await);
                render::print_query(&explorer.query());
            }
            BrowseCommand::Toggle => {
                report(&explorer, explorer.toggle_order().await);
                render::print_query(&explorer.query());
            }
            BrowseCommand::More => report(&explorer, explorer.load_more().await),
            BrowseCommand::List => {
                render::print_query(&explorer.query());
                render::print_list(&explorer.repositories(), explorer.query().sort);
            }
            BrowseCommand::Edit(id, patch) => {
                if explorer.save_edit(id, patch) {
                    println!("{}", "✓ Repository updated".green());
                } else {
                    println!("{}", format!("Repository {} was deleted", id).yellow());
                }
            }
            BrowseCommand::Delete(id) => {
                if confirm_delete(&explorer, id, &mut input).await? {
                    explorer.confirm_delete(id);
                    println!("{}", "✓ Repository deleted".green());
                }
            }
            BrowseCommand::Help => println!("{}", HELP),
            BrowseCommand::Quit => break,
        }

        render_changes(&mut events, &explorer);
    }

    Ok(())
}

fn prompt() -> Result<()> {
    print!("{} ", ">".cyan().bold());
    std::io::stdout().flush().context("Failed to flush stdout")
}

async fn confirm_delete(
    explorer: &Explorer,
    id: RepositoryId,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    let label = explorer
        .with_store(|store| store.get(id).map(|r| format!("{}/{}", r.owner.login, r.name)))
        .unwrap_or_else(|| format!("repository {}", id));

    print!("Delete {}? [y/N] ", label.bold());
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let answer = input.next_line().await.context("Failed to read input")?;
    Ok(matches!(
        answer.as_deref().map(str::trim),
        Some("y") | Some("Y") | Some("yes")
    ))
}

/// Prints the outcome of a fetch
fn report(explorer: &Explorer, result: std::result::Result<LoadOutcome, ClientError>) {
    match result {
        Ok(LoadOutcome::Loaded {
            page,
            count,
            has_more,
            total_count,
        }) => {
            let tail = if has_more { "" } else { ", end of results" };
            println!(
                "{}",
                format!(
                    "Page {} loaded: {} shown of {} matches{}",
                    page, count, total_count, tail
                )
                .dimmed()
            );
        }
        Ok(LoadOutcome::Busy) => println!("{}", "Still loading…".yellow()),
        Ok(LoadOutcome::Exhausted) => println!("{}", "No more results.".yellow()),
        Err(e) => {
            let message = explorer.last_error().unwrap_or_else(|| e.to_string());
            println!("{} {}", "Error:".red().bold(), message);
        }
    }
}

/// Renders whatever changed in the store since the last call
fn render_changes(events: &mut Receiver<StoreEvent>, explorer: &Explorer) {
    let mut replaced = false;
    let mut appended = 0;
    let mut updated = Vec::new();
    let mut deleted = Vec::new();

    loop {
        match events.try_recv() {
            Ok(StoreEvent::Replaced { .. }) => {
                replaced = true;
                appended = 0;
            }
            Ok(StoreEvent::Appended { count }) => appended += count,
            Ok(StoreEvent::Updated { id }) => updated.push(id),
            Ok(StoreEvent::Deleted { id }) => deleted.push(id),
            Ok(StoreEvent::Reset)
            | Ok(StoreEvent::LoadingChanged(_))
            | Ok(StoreEvent::CursorChanged { .. }) => {}
            Err(TryRecvError::Lagged(_)) => replaced = true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }

    let repos = explorer.repositories();
    let sort = explorer.query().sort;

    if replaced {
        render::print_list(&repos, sort);
        return;
    }

    if appended > 0 {
        let start = repos.len().saturating_sub(appended);
        render::print_rows(&repos[start..], start, sort);
    }

    for id in updated {
        if let Some((index, repo)) = repos.iter().enumerate().find(|(_, r)| r.id == id) {
            render::print_repository(index + 1, repo, sort);
        }
    }

    for id in deleted {
        println!("{}", format!("Repository {} removed", id).dimmed());
    }
}
