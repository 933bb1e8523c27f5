//! Repository discovery against a code-hosting search API
//!
//! Discovery is advisory: every failure is logged and turned into an empty
//! result or a negative probe, never an error.

use std::sync::Arc;

use futures::future::join_all;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;

use crate::config::DiscoverySettings;
use crate::logging::Logger;
use crate::types::RepositoryCandidate;

use super::manifest::{ToolManifest, MANIFEST_FILE};

/// Largest page the search API serves
pub const MAX_PER_PAGE: u32 = 100;

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RepositoryItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RepositoryItem {
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    clone_url: String,
    stargazers_count: u64,
    forks_count: u64,
    updated_at: String,
    topics: Vec<String>,
}

impl RepositoryItem {
    fn into_candidate(self, has_manifest: bool) -> RepositoryCandidate {
        RepositoryCandidate {
            name: self.name,
            full_name: self.full_name,
            description: self.description.unwrap_or_default(),
            url: self.html_url,
            clone_url: self.clone_url,
            stars: self.stargazers_count,
            forks: self.forks_count,
            updated_at: self.updated_at,
            topics: self.topics,
            has_manifest,
        }
    }
}

/// Searches for tool repositories and probes them for manifests
pub struct RepositoryDiscovery {
    client: reqwest::Client,
    api_base: String,
    language: String,
    token: Option<String>,
    logger: Arc<dyn Logger>,
}

impl RepositoryDiscovery {
    pub fn new(
        client: reqwest::Client,
        settings: &DiscoverySettings,
        token: Option<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
            token: token.filter(|t| !t.is_empty()),
            logger,
        }
    }

    /// The search query: base term, language filter, one topic per tag
    pub fn build_query(&self, query: &str, tags: &[String]) -> String {
        let mut terms = vec![query.trim().to_string()];
        if !self.language.is_empty() {
            terms.push(format!("language:{}", self.language));
        }
        terms.extend(tags.iter().map(|tag| format!("topic:{}", tag.trim())));
        terms.retain(|t| !t.is_empty());
        terms.join(" ")
    }

    /// Repositories matching `query` and `tags`, most-starred first
    ///
    /// `max_results` is clamped to the API's page range. Order is the
    /// API's; nothing is re-sorted locally.
    pub async fn search(
        &self,
        query: &str,
        tags: &[String],
        max_results: u32,
    ) -> Vec<RepositoryCandidate> {
        let per_page = max_results.clamp(1, MAX_PER_PAGE);
        let q = self.build_query(query, tags);

        self.logger.debug(&format!("[RepositoryDiscovery] Searching: {}", q));

        let request = self
            .authorized(self.client.get(format!("{}/search/repositories", self.api_base)))
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .query(&[
                ("q", q.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.to_string().as_str()),
            ]);

        let items = match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<SearchResponse>().await {
                    Ok(body) => body.items,
                    Err(e) => {
                        self.logger.error(&format!(
                            "[RepositoryDiscovery] Invalid search response: {}",
                            e
                        ));
                        return Vec::new();
                    }
                }
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                self.logger.error(&format!(
                    "[RepositoryDiscovery] Search API error: {} - {}",
                    status, body
                ));
                return Vec::new();
            }
            Err(e) => {
                self.logger.error(&format!(
                    "[RepositoryDiscovery] Search request failed: {}",
                    e
                ));
                return Vec::new();
            }
        };

        let probes = items.iter().map(|item| self.has_manifest(&item.full_name));
        let flags = join_all(probes).await;

        let candidates: Vec<RepositoryCandidate> = items
            .into_iter()
            .zip(flags)
            .map(|(item, has_manifest)| item.into_candidate(has_manifest))
            .collect();

        self.logger.info(&format!(
            "[RepositoryDiscovery] Found {} repositories for {:?}",
            candidates.len(),
            query
        ));
        candidates
    }

    /// Repositories that look like MCP servers
    pub async fn search_mcp_servers(&self, max_results: u32) -> Vec<RepositoryCandidate> {
        let tags = ["mcp".to_string(), "server".to_string()];
        self.search("mcp server", &tags, max_results).await
    }

    /// Whether `full_name` carries a manifest at its root
    pub async fn has_manifest(&self, full_name: &str) -> bool {
        if full_name.is_empty() {
            return false;
        }
        let request = self
            .authorized(self.client.get(self.contents_url(full_name)))
            .header(ACCEPT, JSON_MEDIA_TYPE);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                self.logger.debug(&format!(
                    "[RepositoryDiscovery] Manifest probe for {} failed: {}",
                    full_name, e
                ));
                false
            }
        }
    }

    /// The manifest of `full_name`, if it has a valid one
    pub async fn get_manifest(&self, full_name: &str) -> Option<ToolManifest> {
        let request = self
            .authorized(self.client.get(self.contents_url(full_name)))
            .header(ACCEPT, RAW_MEDIA_TYPE);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.logger.error(&format!(
                    "[RepositoryDiscovery] Error fetching manifest for {}: {}",
                    full_name, e
                ));
                return None;
            }
        };

        if !response.status().is_success() {
            self.logger.warn(&format!(
                "[RepositoryDiscovery] No tool manifest found for {}",
                full_name
            ));
            return None;
        }

        let text = response.text().await.ok()?;
        match ToolManifest::from_json(&text) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                self.logger.error(&format!(
                    "[RepositoryDiscovery] Invalid manifest for {}: {}",
                    full_name, e
                ));
                None
            }
        }
    }

    fn contents_url(&self, full_name: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, full_name, MANIFEST_FILE)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("token {}", token)),
            None => request,
        }
    }
}

impl std::fmt::Debug for RepositoryDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryDiscovery")
            .field("api_base", &self.api_base)
            .field("language", &self.language)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}
