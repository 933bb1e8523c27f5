//! Repository discovery types

use serde::{Deserialize, Serialize};

/// A code repository that may contain a tool
///
/// Produced per search call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryCandidate {
    pub name: String,
    pub full_name: String,
    pub description: String,
    /// Browser URL
    pub url: String,
    pub clone_url: String,
    pub stars: u64,
    pub forks: u64,
    pub updated_at: String,
    pub topics: Vec<String>,
    /// Whether the repository carries a tool manifest at its root
    pub has_manifest: bool,
}
