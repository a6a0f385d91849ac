//! Publish path: encode, chunk, upload chunks, upload the manifest last.
//!
//! The backend has no transactions. The manifest is the only thing readers
//! look up, and it is written after every chunk it references, so an
//! interrupted publish leaves the previous manifest (if any) in charge.

use std::fmt;
use std::sync::Arc;
use serde::Serialize;
use serde_json::Value;
use param_store::{ParameterStore, ParameterType, PutOptions};
use crate::codec::{encode_content, split_chunks};
use crate::config::StoreConfig;
use crate::errors::{StoreError, StoreResult};
use crate::integrity::sha256_hex;
use crate::manifest::{default_version, Manifest, TemplatePath, MAX_PARTS};
use crate::source::ContentSource;

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Defaults to the publish time in epoch milliseconds.
    pub version: Option<String>,
    pub parameter_type: ParameterType,
    pub key_id: Option<String>,
    pub source: Option<Value>,
}

impl PublishOptions {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn secure(mut self, key_id: Option<String>) -> Self {
        self.parameter_type = ParameterType::Secure;
        self.key_id = key_id;
        self
    }

    fn put_options(&self) -> PutOptions {
        PutOptions { parameter_type: self.parameter_type, key_id: self.key_id.clone() }
    }
}

/// Progress of a publish, in the order the steps happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    ChunksUploading { uploaded: usize, total: usize },
    ChunksComplete { total: usize },
    ManifestPublished,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStage::ChunksUploading { uploaded, total } => write!(f, "uploading chunks ({}/{})", uploaded, total),
            PublishStage::ChunksComplete { total } => write!(f, "all {} chunks uploaded", total),
            PublishStage::ManifestPublished => write!(f, "manifest published"),
        }
    }
}

pub struct TemplateWriter {
    store: Arc<dyn ParameterStore>,
    config: StoreConfig,
}

impl TemplateWriter {
    pub fn new(store: Arc<dyn ParameterStore>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Publishes `content` as a new generation of `path` and returns the
    /// manifest that was written.
    pub async fn publish<T: Serialize + ?Sized>(
        &self,
        path: &TemplatePath,
        content: &T,
        options: &PublishOptions,
    ) -> StoreResult<Manifest> {
        let encoded = encode_content(content)?;
        let chunks = split_chunks(&encoded, self.config.chunk_size);
        if chunks.is_empty() {
            return Err(StoreError::encode("payload", "encoding produced no chunks"));
        }

        if chunks.len() > MAX_PARTS {
            return Err(StoreError::encode(
                "payload",
                format!("{} chunks exceed the {} part limit, raise chunk_size", chunks.len(), MAX_PARTS),
            ));
        }

        let base = path.base_path();
        let version = options.version.clone().unwrap_or_else(default_version);
        let put_options = options.put_options();
        let total = chunks.len();
        let manifest = Manifest::new(
            base.clone(),
            version,
            total,
            sha256_hex(&encoded),
            options.source.clone().unwrap_or_else(|| Value::Object(Default::default())),
        );
        let manifest_json = manifest.to_json()?;

        // Reject the whole publish before the first put.
        let max = self.store.limits().max_value_len;
        if let Some((i, chunk)) = chunks.iter().enumerate().find(|(_, c)| c.len() > max) {
            return Err(StoreError::OversizedChunk { index: i + 1, len: chunk.len(), max });
        }
        if manifest_json.len() > max {
            return Err(StoreError::OversizedManifest { len: manifest_json.len(), max });
        }
        tracing::info!("publishing {} version {} as {} chunks ({} chars)", base, manifest.version, total, encoded.len());

        let mut stage = PublishStage::ChunksUploading { uploaded: 0, total };
        for (i, chunk) in chunks.iter().enumerate() {
            let key = path.chunk_key(i + 1);
            if let Err(e) = self.put(&key, chunk, &put_options).await {
                tracing::warn!("publish of {} aborted while {}; uploaded chunks are left in place", base, stage);
                return Err(e);
            }
            tracing::debug!("uploaded {} ({} chars)", key, chunk.len());
            stage = PublishStage::ChunksUploading { uploaded: i + 1, total };
        }
        stage = PublishStage::ChunksComplete { total };
        tracing::debug!("{}: {}", base, stage);

        let manifest_key = path.manifest_key();
        if let Err(e) = self.put(&manifest_key, &manifest_json, &put_options).await {
            tracing::warn!("publish of {} aborted after {}; previous manifest still in effect", base, stage);
            return Err(e);
        }
        stage = PublishStage::ManifestPublished;
        tracing::info!("{}: {} (version {})", manifest_key, stage, manifest.version);
        Ok(manifest)
    }

    /// Fetches content from `source` and publishes it. Nothing is written if
    /// the source fails.
    pub async fn publish_from(
        &self,
        path: &TemplatePath,
        source: &dyn ContentSource,
        options: &PublishOptions,
    ) -> StoreResult<Manifest> {
        let content = source.fetch().await?;
        let mut options = options.clone();
        if options.source.is_none() {
            options.source = Some(source.describe());
        }
        self.publish(path, &content, &options).await
    }

    async fn put(&self, key: &str, value: &str, options: &PutOptions) -> StoreResult<()> {
        let store = &self.store;
        self.config.retry
            .run(key, move || store.put_parameter(key, value, options))
            .await
            .map_err(|source| StoreError::Backend { op: "put", key: key.to_string(), source })
    }
}
