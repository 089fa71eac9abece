//! Repository search DTOs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::repository::Repository;

/// Fixed number of repositories requested per page
pub const PAGE_SIZE: usize = 30;

/// Query text used when the user has not typed anything yet
pub const DEFAULT_QUERY: &str = "javascript";

/// Server-side sort key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Stars,
    Forks,
    Updated,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Stars => "stars",
            SortField::Forks => "forks",
            SortField::Updated => "updated",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stars" => Ok(SortField::Stars),
            "forks" => Ok(SortField::Forks),
            "updated" => Ok(SortField::Updated),
            other => Err(format!(
                "unknown sort field '{}' (expected stars, forks or updated)",
                other
            )),
        }
    }
}

/// Server-side sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// The opposite direction
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!(
                "unknown sort order '{}' (expected asc or desc)",
                other
            )),
        }
    }
}

/// Search parameters chosen by the user
///
/// The page and page size are not part of the query: the page comes from the
/// store's cursor and the page size is always [`PAGE_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub sort: SortField,
    pub order: SortOrder,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }

    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<Repository>,
    pub total_count: u64,
}

impl SearchResponse {
    /// Whether another page may follow this one
    ///
    /// Only a short page proves the result set is exhausted.
    pub fn is_full_page(&self) -> bool {
        self.items.len() == PAGE_SIZE
    }
}
