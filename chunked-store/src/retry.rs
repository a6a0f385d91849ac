use std::future::Future;
use std::time::Duration;
use serde::Deserialize;
use tokio::time::sleep;
use param_store::ParamResult;

/// Bounded exponential backoff around a single backend call.
///
/// Every call this crate makes is idempotent (reads, and puts to deterministic
/// keys with the same value), so repeating one is always safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: usize,
    #[serde(with = "millis")]
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(50),
        }
    }
}

mod millis {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, initial_delay: Duration::ZERO }
    }

    pub async fn run<T, F, Fut>(&self, what: &str, mut attempt: F) -> ParamResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ParamResult<T>>,
    {
        let mut retries = 0;
        let mut delay = self.initial_delay;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if retries >= self.max_retries {
                        return Err(err);
                    }
                    retries += 1;
                    tracing::warn!("{} failed (attempt {}/{}): {}. Retrying in {:?}",
                                   what, retries, self.max_retries, err, delay);
                    sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
}
