//! Model catalog fetching with static fallback
//!
//! A [`ModelCatalog`] owns one backend's catalog: it fetches the live model
//! list over HTTP, normalizes each record through the backend's
//! [`CatalogFormat`], and caches the result for the lifetime of the policy.
//! Any failure degrades to the format's static fallback list.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};

use crate::logging::Logger;
use crate::resolver::ProviderEndpoint;
use crate::types::{BackendId, ModelDescriptor};

use super::error::{ProviderError, ProviderResult};

/// Backend-specific shape of a catalog endpoint
pub trait CatalogFormat: Send + Sync {
    /// The backend this format belongs to
    fn backend(&self) -> BackendId;

    /// Path appended to the API base, e.g. `/models`
    fn path(&self) -> &'static str {
        "/models"
    }

    /// Top-level key holding the model list
    fn list_key(&self) -> &'static str {
        "data"
    }

    /// Whether the request carries a bearer token
    fn authenticated(&self) -> bool {
        true
    }

    /// Convert one backend record into a descriptor
    ///
    /// Returning `None` drops the record from the catalog.
    fn normalize(&self, record: &Value) -> Option<ModelDescriptor>;

    /// Static catalog used when the live fetch fails
    fn fallback(&self) -> Vec<ModelDescriptor>;

    /// Order the catalog; `(family, name)` unless the backend says otherwise
    fn sort(&self, models: &mut [ModelDescriptor]) {
        models.sort_by(|a, b| (&a.family, &a.name).cmp(&(&b.family, &b.name)));
    }

    /// Details reported for an entry that carries none
    fn missing_details(&self, id: &str) -> Value {
        json!({ "id": id })
    }
}

/// Cached model catalog for one backend
pub struct ModelCatalog<F> {
    format: F,
    client: reqwest::Client,
    endpoint: ProviderEndpoint,
    cache: RwLock<Option<Vec<ModelDescriptor>>>,
    logger: Arc<dyn Logger>,
}

impl<F: CatalogFormat> ModelCatalog<F> {
    /// Create an empty catalog
    pub fn new(
        format: F,
        client: reqwest::Client,
        endpoint: ProviderEndpoint,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            format,
            client,
            endpoint,
            cache: RwLock::new(None),
            logger,
        }
    }

    /// Endpoint the catalog is fetched from
    pub fn endpoint(&self) -> &ProviderEndpoint {
        &self.endpoint
    }

    /// The catalog, from cache when a live fetch already succeeded
    pub async fn list_models(&self) -> Vec<ModelDescriptor> {
        if let Some(cached) = self.cache.read().as_ref() {
            return cached.clone();
        }

        match self.fetch_live().await {
            Ok(models) if !models.is_empty() => {
                self.logger.debug(&format!(
                    "[ModelCatalog:{}] Fetched {} models",
                    self.format.backend(),
                    models.len()
                ));
                *self.cache.write() = Some(models.clone());
                models
            }
            Ok(_) => {
                self.logger.warn(&format!(
                    "[ModelCatalog:{}] Live catalog is empty, using fallback models",
                    self.format.backend()
                ));
                self.fallback()
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "[ModelCatalog:{}] Failed to fetch models, using fallback: {}",
                    self.format.backend(),
                    e
                ));
                self.fallback()
            }
        }
    }

    /// Backend-native record for one model
    pub async fn details(&self, model_id: &str) -> ProviderResult<Value> {
        self.list_models()
            .await
            .into_iter()
            .find(|m| m.id == model_id)
            .map(|m| {
                m.details
                    .unwrap_or_else(|| self.format.missing_details(&m.id))
            })
            .ok_or_else(|| ProviderError::model_not_found(self.format.backend(), model_id))
    }

    /// Drop the cached catalog
    pub fn clear(&self) {
        *self.cache.write() = None;
    }

    fn fallback(&self) -> Vec<ModelDescriptor> {
        let mut models = self.format.fallback();
        self.format.sort(&mut models);
        models
    }

    async fn fetch_live(&self) -> ProviderResult<Vec<ModelDescriptor>> {
        let backend = self.format.backend();
        let url = format!(
            "{}{}",
            self.endpoint.api_base.trim_end_matches('/'),
            self.format.path()
        );

        let mut request = self.client.get(&url);
        if self.format.authenticated() {
            if let Some(key) = &self.endpoint.api_key {
                request = request.bearer_auth(key);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api_error(
                backend.as_str(),
                status.as_u16(),
                body,
            ));
        }

        let payload: Value = response.json().await?;
        let records = payload
            .get(self.format.list_key())
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ProviderError::invalid_response(
                    backend.as_str(),
                    format!("missing '{}' list", self.format.list_key()),
                )
            })?;

        let mut seen = HashSet::new();
        let mut models: Vec<ModelDescriptor> = records
            .iter()
            .filter_map(|record| self.format.normalize(record))
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        self.format.sort(&mut models);
        Ok(models)
    }
}

/// String field of a catalog record, if present and non-empty
pub(crate) fn str_field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Capitalize the first letter of every word, lowercasing the rest
///
/// A letter starts a word when the preceding character is not alphabetic,
/// so `"llama3-8b"` becomes `"Llama3-8B"`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
