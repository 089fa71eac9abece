//! Repository domain types

use serde::{Deserialize, Serialize};

/// Repository identity, stable across fetches
pub type RepositoryId = u64;

/// Repository owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: String,
}

/// Repository snapshot as returned by the search endpoint
///
/// Server-origin values are immutable; local edits are expressed as a
/// [`RepositoryPatch`] applied on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub updated_at: String,
    pub html_url: String,
    pub owner: Owner,
}

impl Repository {
    /// Returns a copy of this repository with `patch` applied field by field
    pub fn apply(&self, patch: &RepositoryPatch) -> Repository {
        let mut repo = self.clone();
        repo.apply_in_place(patch);
        repo
    }

    /// Applies `patch` to this repository, overwriting every field it sets
    pub fn apply_in_place(&mut self, patch: &RepositoryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(stars) = patch.stargazers_count {
            self.stargazers_count = stars;
        }
        if let Some(forks) = patch.forks_count {
            self.forks_count = forks;
        }
        if let Some(updated_at) = &patch.updated_at {
            self.updated_at = updated_at.clone();
        }
        if let Some(html_url) = &patch.html_url {
            self.html_url = html_url.clone();
        }
        if let Some(owner) = &patch.owner {
            self.owner = owner.clone();
        }
    }

    /// Parsed `updated_at`, if it is a valid RFC 3339 timestamp
    pub fn updated_at_parsed(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::parse_from_rfc3339(&self.updated_at)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

/// Partial field overlay for a repository
///
/// Every field is optional; unset fields leave the underlying value alone.
/// The id is never part of a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stargazers_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forks_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
}

impl RepositoryPatch {
    /// Patch that only renames
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Patch that only replaces the description
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// True when the patch sets no field at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layers `newer` on top of this patch
    ///
    /// Fields set in `newer` win; fields only set here survive.
    pub fn merge(&mut self, newer: RepositoryPatch) {
        let RepositoryPatch {
            name,
            description,
            stargazers_count,
            forks_count,
            updated_at,
            html_url,
            owner,
        } = newer;

        if name.is_some() {
            self.name = name;
        }
        if description.is_some() {
            self.description = description;
        }
        if stargazers_count.is_some() {
            self.stargazers_count = stargazers_count;
        }
        if forks_count.is_some() {
            self.forks_count = forks_count;
        }
        if updated_at.is_some() {
            self.updated_at = updated_at;
        }
        if html_url.is_some() {
            self.html_url = html_url;
        }
        if owner.is_some() {
            self.owner = owner;
        }
    }
}
