//! Store change notifications

use crate::domain::repository::RepositoryId;

/// A change applied to the [`RepositoryStore`](super::RepositoryStore)
///
/// Emitted once per mutating operation, after the mutation is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// The materialized view was replaced by a fresh first page
    Replaced { count: usize },
    /// `count` repositories were appended to the end of the view
    Appended { count: usize },
    /// A local edit was recorded for `id`
    Updated { id: RepositoryId },
    /// `id` was removed and tombstoned
    Deleted { id: RepositoryId },
    /// Pagination was reset for a new query
    Reset,
    /// The in-flight flag changed
    LoadingChanged(bool),
    /// The pagination cursor or the has-more flag changed
    CursorChanged { page: u32, has_more: bool },
}
