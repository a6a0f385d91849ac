use std::error::Error;
use std::fmt;
use async_trait::async_trait;

pub type ParamResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Hard per-value ceiling enforced by SSM for standard parameters (in characters).
pub const DEFAULT_MAX_VALUE_LEN: usize = 4000;

/// Maximum number of names accepted by a single `GetParameters` call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// One name/value pair as returned by a batch read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// How a value is stored at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterType {
    #[default]
    Plain,
    /// Encrypted at rest, optionally with a caller-supplied key.
    Secure,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Plain => write!(f, "String"),
            ParameterType::Secure => write!(f, "SecureString"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub parameter_type: ParameterType,
    /// Key reference (alias or ARN) used when `parameter_type` is `Secure`.
    pub key_id: Option<String>,
}

impl PutOptions {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn secure(key_id: Option<String>) -> Self {
        Self { parameter_type: ParameterType::Secure, key_id }
    }
}

/// Properties of the backend that callers must respect but cannot change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_value_len: usize,
    pub max_batch_size: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_value_len: DEFAULT_MAX_VALUE_LEN,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// A remote key-value service with small values and bounded batch reads.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetches a single value, `None` if the name does not exist.
    async fn get_parameter(&self, name: &str, decrypt: bool) -> ParamResult<Option<String>>;

    /// Fetches up to `limits().max_batch_size` values at once.
    ///
    /// Absent names are simply missing from the result, and the result order is
    /// not guaranteed to match `names`.
    async fn get_parameters(&self, names: &[String], decrypt: bool) -> ParamResult<Vec<Parameter>>;

    /// Stores a value, overwriting any previous one.
    async fn put_parameter(&self, name: &str, value: &str, options: &PutOptions) -> ParamResult<()>;

    fn limits(&self) -> StoreLimits {
        StoreLimits::default()
    }
}
