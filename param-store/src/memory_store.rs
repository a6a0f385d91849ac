//! In-process parameter store.
//!
//! Behaves like the remote service as far as callers can observe: values over
//! the size cap and oversized batch reads are rejected, and batch responses do
//! not have to follow request order. Every operation is counted so tests can
//! assert on the exact number of round trips a caller performed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use async_trait::async_trait;
use crate::store::{Parameter, ParameterStore, ParamResult, ParameterType, PutOptions, StoreLimits};

/// Order in which `get_parameters` returns the values it found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchOrder {
    #[default]
    AsRequested,
    Reversed,
    /// Odd positions first, then even ones.
    Interleaved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredValue {
    value: String,
    parameter_type: ParameterType,
    key_id: Option<String>,
}

/// Snapshot of the call counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    pub get: usize,
    pub get_many: usize,
    pub put: usize,
}

#[derive(Debug, Default)]
pub struct MemoryParameterStore {
    values: Mutex<HashMap<String, StoredValue>>,
    limits: StoreLimits,
    batch_order: Mutex<BatchOrder>,
    get_calls: AtomicUsize,
    get_many_calls: AtomicUsize,
    put_calls: AtomicUsize,
    // put attempt number (1-based) that should fail, if any
    fail_put_at: Mutex<Option<usize>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self { limits, ..Self::default() }
    }

    pub fn set_batch_order(&self, order: BatchOrder) {
        *self.batch_order.lock().unwrap() = order;
    }

    /// Makes the `attempt`-th put call from now on (1-based) fail.
    pub fn fail_put_at(&self, attempt: usize) {
        let already = self.put_calls.load(Ordering::SeqCst);
        *self.fail_put_at.lock().unwrap() = Some(already + attempt);
    }

    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            get: self.get_calls.load(Ordering::SeqCst),
            get_many: self.get_many_calls.load(Ordering::SeqCst),
            put: self.put_calls.load(Ordering::SeqCst),
        }
    }

    pub fn reset_counts(&self) {
        self.get_calls.store(0, Ordering::SeqCst);
        self.get_many_calls.store(0, Ordering::SeqCst);
        self.put_calls.store(0, Ordering::SeqCst);
    }

    /// Raw read that bypasses counters.
    pub fn value(&self, name: &str) -> Option<String> {
        self.values.lock().unwrap().get(name).map(|v| v.value.clone())
    }

    pub fn parameter_type(&self, name: &str) -> Option<ParameterType> {
        self.values.lock().unwrap().get(name).map(|v| v.parameter_type)
    }

    pub fn key_id(&self, name: &str) -> Option<String> {
        self.values.lock().unwrap().get(name).and_then(|v| v.key_id.clone())
    }

    /// Raw write that bypasses counters and limits.
    pub fn insert_raw(&self, name: &str, value: &str) {
        self.values.lock().unwrap().insert(name.to_string(), StoredValue {
            value: value.to_string(),
            parameter_type: ParameterType::Plain,
            key_id: None,
        });
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.values.lock().unwrap().remove(name).map(|v| v.value)
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names currently stored under `prefix`, sorted.
    pub fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self.values.lock().unwrap()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn get_parameter(&self, name: &str, _decrypt: bool) -> ParamResult<Option<String>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value(name))
    }

    async fn get_parameters(&self, names: &[String], _decrypt: bool) -> ParamResult<Vec<Parameter>> {
        self.get_many_calls.fetch_add(1, Ordering::SeqCst);
        if names.len() > self.limits.max_batch_size {
            return Err(format!(
                "batch of {} names exceeds the limit of {}", names.len(), self.limits.max_batch_size
            ).into());
        }

        let found: Vec<Parameter> = {
            let values = self.values.lock().unwrap();
            names.iter()
                .filter_map(|name| values.get(name).map(|v| Parameter::new(name.clone(), v.value.clone())))
                .collect()
        };

        let order = *self.batch_order.lock().unwrap();
        Ok(match order {
            BatchOrder::AsRequested => found,
            BatchOrder::Reversed => found.into_iter().rev().collect(),
            BatchOrder::Interleaved => {
                let (odd, even): (Vec<_>, Vec<_>) = found.into_iter()
                    .enumerate()
                    .partition(|(i, _)| i % 2 == 1);
                odd.into_iter().chain(even).map(|(_, p)| p).collect()
            }
        })
    }

    async fn put_parameter(&self, name: &str, value: &str, options: &PutOptions) -> ParamResult<()> {
        let attempt = self.put_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_put_at.lock().unwrap() == Some(attempt) {
            return Err(format!("injected failure writing {}", name).into());
        }
        if value.len() > self.limits.max_value_len {
            return Err(format!(
                "value for {} is {} characters, limit is {}", name, value.len(), self.limits.max_value_len
            ).into());
        }
        self.values.lock().unwrap().insert(name.to_string(), StoredValue {
            value: value.to_string(),
            parameter_type: options.parameter_type,
            key_id: options.key_id.clone(),
        });
        Ok(())
    }

    fn limits(&self) -> StoreLimits {
        self.limits
    }
}
