//! Repository store
//!
//! Session-scoped state behind the repository list. Every page fetched from
//! the search endpoint passes through the store, which drops tombstoned ids
//! and re-applies local edits before the page becomes visible.
//!
//! The store never sorts: ordering is whatever the endpoint returned, with
//! later pages appended after earlier ones.

mod event;

pub use event::StoreEvent;

use std::collections::{HashMap, HashSet};

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::repository::{Repository, RepositoryId, RepositoryPatch};

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 256;

/// Repository list state for one session
#[derive(Debug)]
pub struct RepositoryStore {
    /// Materialized view: fetched pages after tombstones and overlays
    repositories: Vec<Repository>,
    /// Next page to fetch, 1-based
    page: u32,
    /// True while a fetch is in flight
    loading: bool,
    /// False once a short page has been observed
    has_more: bool,
    /// Tombstones, never cleared for the session
    deleted_ids: HashSet<RepositoryId>,
    /// Local edit overlays, keyed by repository id
    edited_repos: HashMap<RepositoryId, RepositoryPatch>,
    /// Bumped on every pagination reset
    generation: u64,
    events: broadcast::Sender<StoreEvent>,
}

impl RepositoryStore {
    /// Creates an empty store positioned at page 1
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            repositories: Vec::new(),
            page: 1,
            loading: false,
            has_more: true,
            deleted_ids: HashSet::new(),
            edited_repos: HashMap::new(),
            generation: 0,
            events,
        }
    }

    /// Subscribes to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // =============================================================================
    // Accessors
    // =============================================================================

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn get(&self, id: RepositoryId) -> Option<&Repository> {
        self.repositories.iter().find(|repo| repo.id == id)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_deleted(&self, id: RepositoryId) -> bool {
        self.deleted_ids.contains(&id)
    }

    pub fn overlay(&self, id: RepositoryId) -> Option<&RepositoryPatch> {
        self.edited_repos.get(&id)
    }

    /// Query generation, incremented by [`reset_pagination`](Self::reset_pagination)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =============================================================================
    // Mutations
    // =============================================================================

    /// Sets the in-flight flag
    ///
    /// Callers check [`is_loading`](Self::is_loading) before starting a fetch.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.emit(StoreEvent::LoadingChanged(loading));
    }

    /// Replaces the materialized view with a freshly fetched first page
    ///
    /// Returns the number of repositories that survived the merge.
    pub fn replace_page(&mut self, items: Vec<Repository>) -> usize {
        self.repositories = self.materialize(items);
        let count = self.repositories.len();
        debug!("Replaced repository list with {} item(s)", count);
        self.emit(StoreEvent::Replaced { count });
        count
    }

    /// Appends a subsequent page after the existing view
    ///
    /// Returns the number of repositories that survived the merge.
    pub fn append_page(&mut self, items: Vec<Repository>) -> usize {
        let merged = self.materialize(items);
        let count = merged.len();
        self.repositories.extend(merged);
        debug!(
            "Appended {} item(s), {} total",
            count,
            self.repositories.len()
        );
        self.emit(StoreEvent::Appended { count });
        count
    }

    /// Advances the pagination cursor after a successful fetch
    pub fn increment_page(&mut self) {
        self.page += 1;
        self.emit_cursor();
    }

    /// Records whether another page may follow
    pub fn set_has_more(&mut self, has_more: bool) {
        self.has_more = has_more;
        self.emit_cursor();
    }

    /// Starts over for a new query
    ///
    /// Clears the view and rewinds the cursor. Tombstones and overlays are
    /// kept: they belong to the session, not to the query.
    pub fn reset_pagination(&mut self) {
        self.page = 1;
        self.has_more = true;
        self.repositories.clear();
        self.generation += 1;
        debug!("Pagination reset (generation {})", self.generation);
        self.emit(StoreEvent::Reset);
    }

    /// Records a local edit for `id`
    ///
    /// The patch is layered on any earlier overlay for the same id, then the
    /// combined overlay is applied in place to the visible entry, if any.
    /// Tombstoned ids take no overlay; returns false for them.
    pub fn update_repository(&mut self, id: RepositoryId, patch: RepositoryPatch) -> bool {
        if self.deleted_ids.contains(&id) {
            debug!("Ignoring edit for deleted repository {}", id);
            return false;
        }

        let overlay = self.edited_repos.entry(id).or_default();
        overlay.merge(patch);
        let overlay = overlay.clone();

        if let Some(repo) = self.repositories.iter_mut().find(|repo| repo.id == id) {
            repo.apply_in_place(&overlay);
        }

        debug!("Recorded local edit for repository {}", id);
        self.emit(StoreEvent::Updated { id });
        true
    }

    /// Removes `id` from the view and tombstones it for the session
    pub fn delete_repository(&mut self, id: RepositoryId) {
        self.repositories.retain(|repo| repo.id != id);
        self.deleted_ids.insert(id);
        self.edited_repos.remove(&id);

        debug!("Tombstoned repository {}", id);
        self.emit(StoreEvent::Deleted { id });
    }

    // =============================================================================
    // Merge policy
    // =============================================================================

    /// Drops tombstoned ids and applies overlays to an incoming page
    fn materialize(&self, items: Vec<Repository>) -> Vec<Repository> {
        items
            .into_iter()
            .filter(|repo| !self.deleted_ids.contains(&repo.id))
            .map(|mut repo| {
                if let Some(overlay) = self.edited_repos.get(&repo.id) {
                    repo.apply_in_place(overlay);
                }
                repo
            })
            .collect()
    }

    fn emit_cursor(&self) {
        self.emit(StoreEvent::CursorChanged {
            page: self.page,
            has_more: self.has_more,
        });
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for RepositoryStore {
    fn default() -> Self {
        Self::new()
    }
}
