//! Core domain types
//!
//! Repository snapshots as returned by the search endpoint, and the partial
//! overlays used to edit them locally.

pub mod repository;
