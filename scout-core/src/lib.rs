//! Scout Core
//!
//! Core types and state for the Scout repository explorer.
//!
//! This crate contains:
//! - Domain types: Repository snapshots and local edit overlays
//! - DTOs: Search parameters and responses exchanged with the search endpoint
//! - Store: The session-scoped repository list that reconciles fetched pages
//!   with local edits and deletions

pub mod domain;
pub mod dto;
pub mod store;

pub use store::{RepositoryStore, StoreEvent};
