use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::future::Future;

use crate::cache::{CacheKey, ResultCache};
use crate::retry::RetryPolicy;

/// Cache outside, retry inside: a hit never reaches the retry loop, and only a
/// successful retried call is written back.
#[derive(Debug, Clone)]
pub struct CachedRetryExecutor {
    cache: ResultCache,
    retry: RetryPolicy,
}

impl CachedRetryExecutor {
    pub fn new(cache: ResultCache, retry: RetryPolicy) -> Self {
        Self { cache, retry }
    }

    pub async fn run<T, E, F, Fut>(&self, key: &CacheKey, op: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let retry = self.retry;
        self.cache
            .get_or_compute(key, move || async move { retry.execute(op).await })
            .await
    }
}
