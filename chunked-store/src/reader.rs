//! Load path: manifest, cache check, batched chunk reads, verification.

use std::collections::HashMap;
use std::sync::Arc;
use futures::{stream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use param_store::ParameterStore;
use crate::cache::TemplateCache;
use crate::codec::decode_payload;
use crate::config::StoreConfig;
use crate::errors::{StoreError, StoreResult};
use crate::integrity::verify;
use crate::manifest::{chunk_key, Manifest, TemplatePath};

pub struct TemplateReader {
    store: Arc<dyn ParameterStore>,
    cache: Arc<TemplateCache>,
    config: StoreConfig,
}

impl TemplateReader {
    pub fn new(store: Arc<dyn ParameterStore>, cache: Arc<TemplateCache>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self { store, cache, config })
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub async fn load_template(&self, path: &TemplatePath) -> StoreResult<Arc<Value>> {
        self.load(&path.manifest_key()).await
    }

    /// Returns the content published under `manifest_path`, verified against
    /// the manifest checksum, or an error. Never returns a payload of another
    /// version than the one the manifest currently names.
    pub async fn load(&self, manifest_path: &str) -> StoreResult<Arc<Value>> {
        let manifest = self.fetch_manifest(manifest_path).await?;

        if let Some(cached) = self.cache.get(manifest_path) {
            if cached.version == manifest.version {
                tracing::debug!("{} version {} served from cache", manifest_path, manifest.version);
                return Ok(cached.payload);
            }
        }

        let encoded = self.fetch_chunks(&manifest).await?;
        if let Err(e) = verify(&encoded, &manifest.sha256) {
            tracing::warn!("{} version {} failed verification: {}", manifest_path, manifest.version, e);
            return Err(e);
        }
        let payload = Arc::new(decode_payload(&encoded)?);

        self.cache.set(manifest_path, &manifest.version, payload.clone());
        tracing::info!("loaded {} version {} ({} chunks)", manifest_path, manifest.version, manifest.num_parts);
        Ok(payload)
    }

    /// Like `load`, deserialized into `T`.
    pub async fn load_as<T: DeserializeOwned>(&self, manifest_path: &str) -> StoreResult<T> {
        let payload = self.load(manifest_path).await?;
        T::deserialize(payload.as_ref()).map_err(|e| StoreError::decode("payload shape", e))
    }

    pub async fn fetch_manifest(&self, manifest_path: &str) -> StoreResult<Manifest> {
        let store = &self.store;
        let decrypt = self.config.with_decryption;
        let raw = self.config.retry
            .run(manifest_path, move || store.get_parameter(manifest_path, decrypt))
            .await
            .map_err(|source| StoreError::Backend { op: "get", key: manifest_path.to_string(), source })?
            .ok_or_else(|| StoreError::NotFound { key: manifest_path.to_string() })?;
        Manifest::parse(&raw)
    }

    /// Concatenated chunk values in index order.
    async fn fetch_chunks(&self, manifest: &Manifest) -> StoreResult<String> {
        let batch_size = self.config.batch_size.min(self.store.limits().max_batch_size).max(1);
        let num_parts = manifest.num_parts;
        let prefix = manifest.prefix.as_str();

        // keys are built one batch at a time, never for the whole manifest up front
        let batches: Vec<Vec<String>> = stream::iter((1..=num_parts).step_by(batch_size))
            .map(|first| {
                let last = first.saturating_add(batch_size - 1).min(num_parts);
                let names: Vec<String> = (first..=last).map(|i| chunk_key(prefix, i)).collect();
                async move { self.fetch_batch(&names).await }
            })
            .buffered(self.config.fetch_concurrency)
            .try_collect()
            .await?;

        let mut encoded = String::with_capacity(batches.iter().flatten().map(String::len).sum());
        for value in batches.iter().flatten() {
            encoded.push_str(value);
        }
        Ok(encoded)
    }

    /// Values for `names`, in the order of `names` whatever order the backend used.
    async fn fetch_batch(&self, names: &[String]) -> StoreResult<Vec<String>> {
        let store = &self.store;
        let decrypt = self.config.with_decryption;
        let label = batch_label(names);
        let found = self.config.retry
            .run(&label, move || store.get_parameters(names, decrypt))
            .await
            .map_err(|source| StoreError::Backend { op: "get_many", key: label.clone(), source })?;
        tracing::debug!("fetched {} of {} chunks for {}", found.len(), names.len(), label);

        let mut by_name: HashMap<String, String> = found.into_iter().map(|p| (p.name, p.value)).collect();
        names.iter()
            .map(|name| by_name.remove(name).ok_or_else(|| StoreError::ChunkMissing { key: name.clone() }))
            .collect()
    }
}

fn batch_label(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [first, .., last] => format!("{}..{}", first, last),
    }
}
