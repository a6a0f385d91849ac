use serde::Deserialize;
use crate::errors::{StoreError, StoreResult};
use crate::retry::RetryPolicy;

/// Tuning shared by the writer and the reader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Characters per chunk; leaves headroom under the backend's value cap.
    pub chunk_size: usize,
    /// Names per batch read, further capped by the backend's own limit.
    pub batch_size: usize,
    /// Batch reads allowed in flight at once.
    pub fetch_concurrency: usize,
    pub with_decryption: bool,
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3500,
            batch_size: 10,
            fetch_concurrency: 4,
            with_decryption: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> StoreResult<()> {
        if self.chunk_size == 0 {
            return Err(StoreError::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(StoreError::InvalidConfig("batch_size must be positive".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(StoreError::InvalidConfig("fetch_concurrency must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.chunk_size, 3500);
        assert_eq!(config.batch_size, 10);
        assert!(config.with_decryption);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        for config in [
            StoreConfig::default().with_chunk_size(0),
            StoreConfig { batch_size: 0, ..StoreConfig::default() },
            StoreConfig { fetch_concurrency: 0, ..StoreConfig::default() },
        ] {
            assert!(matches!(config.validate(), Err(StoreError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"chunk_size": 1200}"#).unwrap();
        assert_eq!(config.chunk_size, 1200);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
