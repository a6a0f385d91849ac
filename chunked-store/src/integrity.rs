use sha2::{Digest, Sha256};
use crate::errors::{StoreError, StoreResult};

/// Lowercase hex SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    result.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Fails with `ChecksumMismatch` unless `text` hashes to `expected`.
pub fn verify(text: &str, expected: &str) -> StoreResult<()> {
    let actual = sha256_hex(text);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(StoreError::ChecksumMismatch { expected: expected.to_string(), actual })
    }
}
