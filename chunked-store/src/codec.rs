//! Payload encoding: JSON text, gzip, then standard base64.
//!
//! Base64 output is pure ASCII, which is what lets `split_chunks` cut the
//! encoded text at arbitrary byte offsets.

use std::io::{Read, Write};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::Value;
use crate::errors::{StoreError, StoreResult};

/// Serializes `content` and returns the base64 text of its gzip stream.
pub fn encode_content<T: Serialize + ?Sized>(content: &T) -> StoreResult<String> {
    let json = serde_json::to_vec(content).map_err(|e| StoreError::encode("content as json", e))?;
    encode_bytes(&json)
}

pub fn encode_bytes(raw: &[u8]) -> StoreResult<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)
        .and_then(|_| encoder.finish())
        .map(|gz| STANDARD.encode(gz))
        .map_err(|e| StoreError::encode("gzip stream", e))
}

/// Reverses `encode_content`: base64, gunzip, JSON.
pub fn decode_payload(encoded: &str) -> StoreResult<Value> {
    let gz = STANDARD.decode(encoded)
        .map_err(|e| StoreError::decode("base64 payload", e))?;
    let mut json = Vec::new();
    GzDecoder::new(gz.as_slice())
        .read_to_end(&mut json)
        .map_err(|e| StoreError::decode("gzip payload", e))?;
    serde_json::from_slice(&json)
        .map_err(|e| StoreError::decode("json payload", e))
}

/// Cuts `encoded` into consecutive pieces of `chunk_size` characters; the last
/// piece may be shorter. `encoded` must be ASCII.
pub fn split_chunks(encoded: &str, chunk_size: usize) -> Vec<&str> {
    debug_assert!(encoded.is_ascii());
    encoded.as_bytes()
        .chunks(chunk_size.max(1))
        .map(|piece| std::str::from_utf8(piece).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_then_decode_template() {
        let template = json!({
            "html": "<p>Bonjour {{USERNAME}}, votre code : {{CODE}}</p>",
            "text": "Code: {{CODE}}",
            "subject": "{{BRAND}} – Votre code",
        });
        let encoded = encode_content(&template).unwrap();

        assert!(encoded.is_ascii());
        assert_eq!(decode_payload(&encoded).unwrap(), template);
    }

    #[test]
    fn test_encoded_output_is_gzip() {
        let encoded = encode_content(&json!({"a": 1})).unwrap();
        let raw = STANDARD.decode(encoded).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_repetitive_content_compresses() {
        let html = "<tr><td>row</td></tr>".repeat(2000);
        let encoded = encode_content(&json!({ "html": html })).unwrap();
        assert!(encoded.len() < html.len() / 10);
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode_payload("not base64!!").unwrap_err();
        assert!(matches!(err, StoreError::Decode { what: "base64 payload", .. }));
    }

    #[test]
    fn test_decode_rejects_non_gzip() {
        let err = decode_payload(&STANDARD.encode(b"plain bytes")).unwrap_err();
        assert!(matches!(err, StoreError::Decode { what: "gzip payload", .. }));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let encoded = encode_bytes(b"{ not json").unwrap();
        let err = decode_payload(&encoded).unwrap_err();
        assert!(matches!(err, StoreError::Decode { what: "json payload", .. }));
    }

    #[test]
    fn test_split_chunks() {
        assert_eq!(split_chunks("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(split_chunks("abcdef", 3), vec!["abc", "def"]);
        assert_eq!(split_chunks("ab", 10), vec!["ab"]);
        assert!(split_chunks("", 3).is_empty());
    }

    #[test]
    fn test_split_chunks_concatenates_back() {
        let encoded = encode_content(&json!({ "html": "x".repeat(10_000) })).unwrap();
        let chunks = split_chunks(&encoded, 7);
        assert_eq!(chunks.concat(), encoded);
        assert!(chunks.iter().all(|c| c.len() <= 7));
    }
}
