//! Repository search endpoint

use async_trait::async_trait;
use scout_core::dto::search::{PAGE_SIZE, SearchQuery, SearchResponse};
use tracing::debug;

use crate::GitHubClient;
use crate::error::Result;

/// Source of repository search pages
///
/// Implemented by [`GitHubClient`]; anything that can answer a query for a
/// given page can stand in for it.
#[async_trait]
pub trait RepositorySearch: Send + Sync {
    /// Fetch one page of results for `query`
    ///
    /// # Arguments
    /// * `query` - Search text and server-side ordering
    /// * `page` - 1-based page number
    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchResponse>;
}

impl GitHubClient {
    // =============================================================================
    // Repository Search
    // =============================================================================

    /// Search repositories
    ///
    /// Sends `q`, `sort`, `order`, `page` and a fixed `per_page` of
    /// [`PAGE_SIZE`].
    ///
    /// # Returns
    /// The page of repositories and the total match count
    pub async fn search_repositories(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<SearchResponse> {
        debug!(
            "GET /search/repositories q={:?} sort={} order={} page={}",
            query.text, query.sort, query.order, page
        );

        let page = page.to_string();
        let per_page = PAGE_SIZE.to_string();
        let response = self
            .get("/search/repositories")
            .query(&[
                ("q", query.text.as_str()),
                ("sort", query.sort.as_str()),
                ("order", query.order.as_str()),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl RepositorySearch for GitHubClient {
    async fn search(&self, query: &SearchQuery, page: u32) -> Result<SearchResponse> {
        self.search_repositories(query, page).await
    }
}
