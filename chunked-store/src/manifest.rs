use std::fmt;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::errors::{StoreError, StoreResult};

/// How the stored text was derived from the original content.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    #[serde(rename = "base64+gzip")]
    Base64Gzip,
}

/// Where one logical template lives: `/{prefix}/{logical_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplatePath {
    prefix: String,
    logical_id: String,
}

impl TemplatePath {
    pub fn new(prefix: &str, logical_id: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
            logical_id: logical_id.trim_matches('/').to_string(),
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The namespace every key of this template starts with.
    pub fn base_path(&self) -> String {
        if self.prefix.is_empty() {
            format!("/{}", self.logical_id)
        } else {
            format!("/{}/{}", self.prefix, self.logical_id)
        }
    }

    pub fn manifest_key(&self) -> String {
        self.base_path()
    }

    pub fn chunk_key(&self, index: usize) -> String {
        chunk_key(&self.base_path(), index)
    }
}

impl fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_path())
    }
}

/// Key of the 1-based `index`-th chunk under `base`.
pub fn chunk_key(base: &str, index: usize) -> String {
    format!("{}/parts/part-{:05}", base, index)
}

/// Largest chunk count the five-digit part naming can address.
pub const MAX_PARTS: usize = 99_999;

/// Descriptor of one published generation of a template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Base path the chunks live under.
    pub prefix: String,
    pub version: String,
    pub num_parts: usize,
    pub encoding: Encoding,
    /// Hex SHA-256 of the concatenated base64 text.
    pub sha256: String,
    pub updated_at: String,
    /// Provenance, informational only.
    #[serde(default = "empty_source")]
    pub source: Value,
}

fn empty_source() -> Value {
    Value::Object(Default::default())
}

impl Manifest {
    pub fn new(prefix: String, version: String, num_parts: usize, sha256: String, source: Value) -> Self {
        Self {
            prefix,
            version,
            num_parts,
            encoding: Encoding::Base64Gzip,
            sha256,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source,
        }
    }

    /// Parses and validates a stored manifest.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let manifest: Manifest = serde_json::from_str(raw)
            .map_err(|e| StoreError::decode("manifest", e))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(self).map_err(|e| StoreError::encode("manifest", e))
    }

    fn validate(&self) -> StoreResult<()> {
        if self.num_parts == 0 || self.num_parts > MAX_PARTS {
            return Err(StoreError::decode(
                "manifest",
                format!("numParts must be between 1 and {}, got {}", MAX_PARTS, self.num_parts),
            ));
        }
        if self.sha256.len() != 64 || !self.sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(StoreError::decode("manifest", format!("sha256 is not a hex digest: {:?}", self.sha256)));
        }
        Ok(())
    }

    /// Chunk keys in index order, `1..=num_parts`.
    pub fn chunk_keys(&self) -> Vec<String> {
        (1..=self.num_parts).map(|i| chunk_key(&self.prefix, i)).collect()
    }
}

/// Default version: publish time in epoch milliseconds.
pub fn default_version() -> String {
    Utc::now().timestamp_millis().to_string()
}
