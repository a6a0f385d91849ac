use std::error::Error;
use thiserror::Error;
use crate::source::SourceError;

pub type BoxError = Box<dyn Error + Send + Sync>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parameter {key} not found")]
    NotFound { key: String },

    #[error("failed to decode {what}")]
    Decode {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("checksum mismatch: manifest says {expected}, content hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("chunk {index} is {len} characters, backend accepts at most {max}")]
    OversizedChunk { index: usize, len: usize, max: usize },

    #[error("manifest is {len} characters, backend accepts at most {max}")]
    OversizedManifest { len: usize, max: usize },

    #[error("chunk {key} is missing")]
    ChunkMissing { key: String },

    #[error("failed to obtain content from its source")]
    UpstreamSource(#[from] SourceError),

    #[error("backend {op} failed for {key}")]
    Backend {
        op: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to encode {what}")]
    Encode {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    pub(crate) fn decode(what: &'static str, source: impl Into<BoxError>) -> Self {
        StoreError::Decode { what, source: source.into() }
    }

    pub(crate) fn encode(what: &'static str, source: impl Into<BoxError>) -> Self {
        StoreError::Encode { what, source: source.into() }
    }

    /// True for errors that mean "nothing usable is stored here".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. } | StoreError::ChunkMissing { .. })
    }
}
