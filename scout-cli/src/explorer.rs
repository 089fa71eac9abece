//! Explorer
//!
//! Maps user actions (search, sort changes, scrolling, edits, deletions) onto
//! the repository store, fetching pages from the search service as needed.
//!
//! At most one fetch runs at a time: `load_more` refuses to start while the
//! store's loading flag is set. Each pagination reset bumps the store's
//! generation; a response that comes back for an older generation is thrown
//! away and the current query is fetched instead.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scout_client::{ClientError, RepositorySearch};
use scout_core::domain::repository::{Repository, RepositoryId, RepositoryPatch};
use scout_core::dto::search::{SearchQuery, SortField, SortOrder};
use scout_core::{RepositoryStore, StoreEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Outcome of a `load_more` request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and merged into the store
    Loaded {
        page: u32,
        count: usize,
        has_more: bool,
        total_count: u64,
    },
    /// Another fetch is already in flight
    Busy,
    /// The last page has already been seen
    Exhausted,
}

/// Controller between user actions and the repository store
pub struct Explorer {
    store: Arc<Mutex<RepositoryStore>>,
    search: Arc<dyn RepositorySearch>,
    query: Mutex<SearchQuery>,
    last_error: Mutex<Option<String>>,
}

/// Clears the store's loading flag however the fetch ends
struct LoadingGuard<'a> {
    store: &'a Mutex<RepositoryStore>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock(self.store).set_loading(false);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Explorer {
    /// Creates an explorer over a shared store
    pub fn new(
        store: Arc<Mutex<RepositoryStore>>,
        search: Arc<dyn RepositorySearch>,
        query: SearchQuery,
    ) -> Self {
        Self {
            store,
            search,
            query: Mutex::new(query),
            last_error: Mutex::new(None),
        }
    }

    // =============================================================================
    // State
    // =============================================================================

    /// Current search parameters
    pub fn query(&self) -> SearchQuery {
        lock(&self.query).clone()
    }

    /// Message for the most recent failed fetch, cleared when a fetch starts
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    /// Copy of the materialized repository list
    pub fn repositories(&self) -> Vec<Repository> {
        lock(&self.store).repositories().to_vec()
    }

    /// Runs `f` against the store
    pub fn with_store<R>(&self, f: impl FnOnce(&RepositoryStore) -> R) -> R {
        f(&lock(&self.store))
    }

    /// Subscribes to store change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        lock(&self.store).subscribe()
    }

    // =============================================================================
    // Query changes
    // =============================================================================

    /// New search text: start over from page 1
    pub async fn submit_search(&self, text: &str) -> Result<LoadOutcome, ClientError> {
        lock(&self.query).text = text.trim().to_string();
        self.restart().await
    }

    /// New sort key: start over from page 1
    pub async fn change_sort(&self, sort: SortField) -> Result<LoadOutcome, ClientError> {
        lock(&self.query).sort = sort;
        self.restart().await
    }

    /// New sort direction: start over from page 1
    pub async fn change_order(&self, order: SortOrder) -> Result<LoadOutcome, ClientError> {
        lock(&self.query).order = order;
        self.restart().await
    }

    /// Flip the sort direction: start over from page 1
    pub async fn toggle_order(&self) -> Result<LoadOutcome, ClientError> {
        {
            let mut query = lock(&self.query);
            query.order = query.order.toggled();
        }
        self.restart().await
    }

    async fn restart(&self) -> Result<LoadOutcome, ClientError> {
        lock(&self.store).reset_pagination();
        self.load_more().await
    }

    // =============================================================================
    // Pagination
    // =============================================================================

    /// Fetch the next page, if one may exist and no fetch is running
    ///
    /// A failed fetch leaves the page cursor and the has-more flag untouched,
    /// so the next call retries the same page.
    pub async fn load_more(&self) -> Result<LoadOutcome, ClientError> {
        loop {
            let (generation, page) = {
                let mut store = lock(&self.store);
                if store.is_loading() {
                    debug!("Fetch already in flight, skipping");
                    return Ok(LoadOutcome::Busy);
                }
                if !store.has_more() {
                    debug!("No more pages to fetch");
                    return Ok(LoadOutcome::Exhausted);
                }
                store.set_loading(true);
                (store.generation(), store.page())
            };
            let _loading = LoadingGuard { store: &self.store };

            *lock(&self.last_error) = None;
            let query = self.query();
            debug!("Fetching page {} for {:?}", page, query.text);

            let result = self.search.search(&query, page).await;

            let mut store = lock(&self.store);
            if store.generation() != generation {
                warn!(
                    "Discarding page {} for superseded query {:?}",
                    page, query.text
                );
                drop(store);
                continue;
            }

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!("Failed to fetch page {}: {}", page, e);
                    *lock(&self.last_error) = Some(e.to_string());
                    return Err(e);
                }
            };

            let has_more = response.is_full_page();
            let total_count = response.total_count;
            let count = if page == 1 {
                store.replace_page(response.items)
            } else {
                store.append_page(response.items)
            };
            store.set_has_more(has_more);
            store.increment_page();

            info!(
                "Loaded page {} ({} shown, {} total matches)",
                page, count, total_count
            );

            return Ok(LoadOutcome::Loaded {
                page,
                count,
                has_more,
                total_count,
            });
        }
    }

    // =============================================================================
    // Local edits
    // =============================================================================

    /// Save a local edit for `id`; false when `id` was deleted
    pub fn save_edit(&self, id: RepositoryId, patch: RepositoryPatch) -> bool {
        lock(&self.store).update_repository(id, patch)
    }

    /// Delete `id` for the rest of the session
    pub fn confirm_delete(&self, id: RepositoryId) {
        lock(&self.store).delete_repository(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scout_core::domain::repository::Owner;
    use scout_core::dto::search::{PAGE_SIZE, SearchResponse};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    type Responder =
        Box<dyn Fn(&SearchQuery, u32) -> scout_client::Result<SearchResponse> + Send + Sync>;

    /// In-memory search service
    struct FakeSearch {
        responder: Responder,
        calls: Mutex<Vec<(SearchQuery, u32)>>,
        /// When set, the first call waits for a notification before answering
        gate: Option<Arc<Notify>>,
        gated: AtomicBool,
    }

    impl FakeSearch {
        fn new(
            responder: impl Fn(&SearchQuery, u32) -> scout_client::Result<SearchResponse>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
                gate: None,
                gated: AtomicBool::new(false),
            }
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn calls(&self) -> Vec<(SearchQuery, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RepositorySearch for FakeSearch {
        async fn search(
            &self,
            query: &SearchQuery,
            page: u32,
        ) -> scout_client::Result<SearchResponse> {
            self.calls.lock().unwrap().push((query.clone(), page));
            if let Some(gate) = &self.gate {
                if !self.gated.swap(true, Ordering::SeqCst) {
                    gate.notified().await;
                }
            }
            (self.responder)(query, page)
        }
    }

    fn repo(id: RepositoryId) -> Repository {
        Repository {
            id,
            name: format!("repo-{}", id),
            description: None,
            stargazers_count: id * 10,
            forks_count: id,
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            html_url: format!("https://github.com/test/repo-{}", id),
            owner: Owner {
                login: "test".to_string(),
                avatar_url: "https://test.com/avatar.png".to_string(),
            },
        }
    }

    fn page(start: RepositoryId, len: usize) -> SearchResponse {
        SearchResponse {
            items: (start..start + len as RepositoryId).map(repo).collect(),
            total_count: 1000,
        }
    }

    /// Full pages forever, ids offset by page
    fn endless(_: &SearchQuery, page_no: u32) -> scout_client::Result<SearchResponse> {
        Ok(page((page_no as u64 - 1) * PAGE_SIZE as u64 + 1, PAGE_SIZE))
    }

    fn explorer(search: Arc<FakeSearch>) -> (Explorer, Arc<Mutex<RepositoryStore>>) {
        let store = Arc::new(Mutex::new(RepositoryStore::new()));
        let explorer = Explorer::new(store.clone(), search, SearchQuery::default());
        (explorer, store)
    }

    #[tokio::test]
    async fn test_full_first_page_advances_cursor() {
        let search = Arc::new(FakeSearch::new(endless));
        let (explorer, store) = explorer(search.clone());

        let outcome = explorer.load_more().await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                page: 1,
                count: PAGE_SIZE,
                has_more: true,
                total_count: 1000,
            }
        );
        let store = store.lock().unwrap();
        assert_eq!(store.page(), 2);
        assert!(store.has_more());
        assert!(!store.is_loading());
        assert_eq!(store.len(), PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_short_page_exhausts_results() {
        let search = Arc::new(FakeSearch::new(|_, page_no| {
            if page_no == 1 {
                Ok(page(1, PAGE_SIZE))
            } else {
                Ok(page(100, 12))
            }
        }));
        let (explorer, store) = explorer(search.clone());

        explorer.load_more().await.unwrap();
        explorer.load_more().await.unwrap();
        assert!(!store.lock().unwrap().has_more());
        assert_eq!(explorer.repositories().len(), PAGE_SIZE + 12);

        let outcome = explorer.load_more().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Exhausted);
        assert_eq!(search.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_pages_requested_in_order() {
        let search = Arc::new(FakeSearch::new(endless));
        let (explorer, _) = explorer(search.clone());

        for _ in 0..3 {
            explorer.load_more().await.unwrap();
        }

        let pages: Vec<u32> = search.calls().into_iter().map(|(_, p)| p).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(explorer.repositories().len(), 3 * PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cursor_and_clears_loading() {
        let search = Arc::new(FakeSearch::new(|_, page_no| {
            if page_no == 2 {
                Err(ClientError::service(503, "Service Unavailable"))
            } else {
                Ok(page(1, PAGE_SIZE))
            }
        }));
        let (explorer, store) = explorer(search.clone());

        explorer.load_more().await.unwrap();
        let err = explorer.load_more().await.unwrap_err();

        assert!(err.is_service());
        {
            let store = store.lock().unwrap();
            assert_eq!(store.page(), 2);
            assert!(store.has_more());
            assert!(!store.is_loading());
            assert_eq!(store.len(), PAGE_SIZE);
        }
        assert!(explorer.last_error().unwrap().contains("503"));

        // The next trigger retries the same page.
        let _ = explorer.load_more().await;
        assert_eq!(search.calls().last().unwrap().1, 2);
    }

    #[tokio::test]
    async fn test_error_cleared_by_next_fetch() {
        let failed = Arc::new(AtomicBool::new(false));
        let flag = failed.clone();
        let search = Arc::new(FakeSearch::new(move |_, _| {
            if !flag.swap(true, Ordering::SeqCst) {
                Err(ClientError::Parse("truncated".to_string()))
            } else {
                Ok(page(1, 3))
            }
        }));
        let (explorer, _) = explorer(search);

        assert!(explorer.load_more().await.is_err());
        assert!(explorer.last_error().is_some());

        explorer.load_more().await.unwrap();
        assert!(explorer.last_error().is_none());
        assert!(failed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_busy_store_refuses_fetch() {
        let search = Arc::new(FakeSearch::new(endless));
        let (explorer, store) = explorer(search.clone());
        store.lock().unwrap().set_loading(true);

        let outcome = explorer.load_more().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Busy);
        assert!(search.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_resets_and_keeps_overlays() {
        let search = Arc::new(FakeSearch::new(|_, _| Ok(page(1, 5))));
        let (explorer, store) = explorer(search.clone());

        explorer.load_more().await.unwrap();
        explorer.save_edit(2, RepositoryPatch::name("local-name"));
        explorer.confirm_delete(3);
        assert!(!explorer.save_edit(3, RepositoryPatch::name("too-late")));

        explorer.submit_search("  rust ").await.unwrap();

        let ids: Vec<RepositoryId> = explorer.repositories().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
        assert_eq!(explorer.repositories()[1].name, "local-name");
        assert_eq!(store.lock().unwrap().page(), 2);

        let (query, page_no) = search.calls().last().unwrap().clone();
        assert_eq!(query.text, "rust");
        assert_eq!(page_no, 1);
    }

    #[tokio::test]
    async fn test_sort_changes_restart_from_first_page() {
        let search = Arc::new(FakeSearch::new(endless));
        let (explorer, _) = explorer(search.clone());

        explorer.load_more().await.unwrap();
        explorer.load_more().await.unwrap();
        explorer.change_sort(SortField::Updated).await.unwrap();
        explorer.toggle_order().await.unwrap();
        explorer.change_order(SortOrder::Desc).await.unwrap();

        let calls = search.calls();
        assert_eq!(calls[2].0.sort, SortField::Updated);
        assert_eq!(calls[2].1, 1);
        assert_eq!(calls[3].0.order, SortOrder::Asc);
        assert_eq!(calls[3].1, 1);
        assert_eq!(calls[4].0.order, SortOrder::Desc);
        assert_eq!(explorer.repositories().len(), PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_deleted_repository_not_resurrected_by_scrolling() {
        let search = Arc::new(FakeSearch::new(|_, _| Ok(page(1, PAGE_SIZE))));
        let (explorer, _) = explorer(search);

        explorer.load_more().await.unwrap();
        explorer.confirm_delete(7);
        explorer.load_more().await.unwrap();

        let repos = explorer.repositories();
        assert!(repos.iter().all(|r| r.id != 7));
        assert_eq!(repos.len(), 2 * (PAGE_SIZE - 1));
    }

    #[tokio::test]
    async fn test_stale_response_discarded_after_new_search() {
        let gate = Arc::new(Notify::new());
        let search = Arc::new(
            FakeSearch::new(|query, _| {
                if query.text == "rust" {
                    Ok(page(500, 4))
                } else {
                    Ok(page(1, PAGE_SIZE))
                }
            })
            .gated(gate.clone()),
        );
        let (explorer, store) = explorer(search.clone());

        let (first, second) = tokio::join!(explorer.load_more(), async {
            tokio::task::yield_now().await;
            let outcome = explorer.submit_search("rust").await;
            gate.notify_one();
            outcome
        });

        // The new search found a fetch in flight; the in-flight call then
        // threw away its stale page and fetched the new query.
        assert_eq!(second.unwrap(), LoadOutcome::Busy);
        assert!(matches!(first.unwrap(), LoadOutcome::Loaded { count: 4, .. }));

        let ids: Vec<RepositoryId> = explorer.repositories().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![500, 501, 502, 503]);

        let queries: Vec<String> = search.calls().into_iter().map(|(q, _)| q.text).collect();
        assert_eq!(queries, vec!["javascript".to_string(), "rust".to_string()]);

        let store = store.lock().unwrap();
        assert!(!store.is_loading());
        assert!(!store.has_more());
    }

    #[tokio::test]
    async fn test_stale_failure_discarded_after_new_search() {
        let gate = Arc::new(Notify::new());
        let search = Arc::new(
            FakeSearch::new(|query, _| {
                if query.text == "rust" {
                    Ok(page(500, PAGE_SIZE))
                } else {
                    Err(ClientError::service(502, "Bad Gateway"))
                }
            })
            .gated(gate.clone()),
        );
        let (explorer, store) = explorer(search.clone());

        let (first, second) = tokio::join!(explorer.load_more(), async {
            tokio::task::yield_now().await;
            let outcome = explorer.submit_search("rust").await;
            gate.notify_one();
            outcome
        });

        // The failure belonged to the superseded query, so it is neither
        // returned nor shown; the new query loads instead.
        assert_eq!(second.unwrap(), LoadOutcome::Busy);
        assert_eq!(
            first.unwrap(),
            LoadOutcome::Loaded {
                page: 1,
                count: PAGE_SIZE,
                has_more: true,
                total_count: 1000,
            }
        );
        assert!(explorer.last_error().is_none());
        assert_eq!(explorer.repositories()[0].id, 500);
        assert_eq!(search.calls().len(), 2);

        let store = store.lock().unwrap();
        assert!(!store.is_loading());
        assert_eq!(store.page(), 2);
    }
}
