//! Process-local cache of decoded templates, one slot per manifest path.
//!
//! A single instance is meant to be created at startup and handed to every
//! reader through an `Arc`, so warm invocations of the same process skip chunk
//! fetches for a version they already verified.

use std::cmp::Ordering;
use std::sync::Arc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedTemplate {
    pub version: String,
    pub payload: Arc<Value>,
}

#[derive(Debug, Default)]
pub struct TemplateCache {
    slots: DashMap<String, CachedTemplate>,
}

/// `Greater` when `incoming` is known to be newer than `current`.
///
/// Only numeric versions (the default epoch-millisecond ones) have a known
/// order; anything else compares as `None`.
fn compare_versions(incoming: &str, current: &str) -> Option<Ordering> {
    match (incoming.parse::<u128>(), current.parse::<u128>()) {
        (Ok(a), Ok(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<CachedTemplate> {
        self.slots.get(path).map(|entry| entry.value().clone())
    }

    /// Stores `payload` for `path` unless the slot already holds a newer
    /// numeric version. Returns whether the slot was written.
    pub fn set(&self, path: &str, version: &str, payload: Arc<Value>) -> bool {
        match self.slots.entry(path.to_string()) {
            Entry::Occupied(mut occupied) => {
                if compare_versions(version, &occupied.get().version) == Some(Ordering::Less) {
                    tracing::debug!(
                        "keeping cached version {} of {}, not downgrading to {}",
                        occupied.get().version, path, version
                    );
                    return false;
                }
                occupied.insert(CachedTemplate { version: version.to_string(), payload });
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CachedTemplate { version: version.to_string(), payload });
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&self) {
        self.slots.clear();
    }
}
