//! Data Transfer Objects for the search endpoint
//!
//! Request parameters and response bodies for repository search.

pub mod search;
