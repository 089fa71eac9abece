//! Terminal rendering for repository lists

use colored::*;
use scout_core::domain::repository::Repository;
use scout_core::dto::search::{SearchQuery, SortField};

/// Date shown for a repository, falling back to the raw timestamp
pub fn updated_date(repo: &Repository) -> String {
    repo.updated_at_parsed()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| repo.updated_at.clone())
}

/// The value the list is currently sorted by
pub fn sort_value(repo: &Repository, sort: SortField) -> String {
    match sort {
        SortField::Stars => format!("Stars: {}", repo.stargazers_count),
        SortField::Forks => format!("Forks: {}", repo.forks_count),
        SortField::Updated => format!("Updated: {}", updated_date(repo)),
    }
}

/// Print the active query line
pub fn print_query(query: &SearchQuery) {
    println!(
        "{} {}  {} {}  {} {}",
        "Query:".bold(),
        query.text.cyan(),
        "Sort:".bold(),
        query.sort,
        "Order:".bold(),
        query.order
    );
}

/// Print a whole list, numbering from 1
pub fn print_list(repos: &[Repository], sort: SortField) {
    if repos.is_empty() {
        println!("{}", "No repositories found.".yellow());
        return;
    }

    println!(
        "{}",
        format!("Showing {} repositories:", repos.len()).bold()
    );
    println!();
    print_rows(repos, 0, sort);
}

/// Print `repos`, numbering from `offset + 1`
pub fn print_rows(repos: &[Repository], offset: usize, sort: SortField) {
    for (i, repo) in repos.iter().enumerate() {
        print_repository(offset + i + 1, repo, sort);
    }
}

/// Print a single repository card
pub fn print_repository(index: usize, repo: &Repository, sort: SortField) {
    println!(
        "  {} {} {}/{}  {}",
        format!("{:>3}.", index).dimmed(),
        "▸".cyan(),
        repo.owner.login,
        repo.name.bold(),
        format!("[{}]", sort_value(repo, sort)).green()
    );
    if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
        println!("       {}", description);
    }
    println!(
        "       {} {}   {} {}   {} {}   {} {}",
        "★".yellow(),
        repo.stargazers_count,
        "Forks:".dimmed(),
        repo.forks_count,
        "Updated:".dimmed(),
        updated_date(repo),
        "id:".dimmed(),
        repo.id
    );
    println!("       {}", repo.html_url.dimmed());
    println!();
}
