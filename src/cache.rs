use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_WRITE_FAILURES};

// Structured cache key: operation id, positional args (ordered), keyword args (sorted by name)
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    operation: String,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
}

impl CacheKey {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    pub fn arg(mut self, value: impl Serialize) -> Self {
        self.args.push(to_value(value));
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.kwargs.insert(name.into(), to_value(value));
        self
    }

    /// Hex SHA-256 of the canonical encoding. Keyword order never changes the
    /// digest; positional order and value types do.
    pub fn digest(&self) -> String {
        let mut sorted: Vec<(&String, &Value)> = self.kwargs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let canonical = json!({
            "op": self.operation,
            "args": self.args,
            "kwargs": sorted,
        });

        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string());
        format!("{:x}", hasher.finalize())
    }
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| Value::String(format!("<unserializable: {}>", e)))
}

// Cache entry as read back from disk
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub key: String,
    pub value: T,
}

/// On-disk memoization: one pretty-printed JSON file per key, named by its
/// digest. Entries never expire and are never evicted.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::Directory {
            path: dir.clone(),
            source,
        })?;
        debug!(dir = %dir.display(), "result cache opened");
        Ok(Self { dir })
    }

    pub fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.json", digest))
    }

    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let digest = key.digest();

        match self.read::<T>(&digest).await {
            Ok(Some(entry)) => {
                CACHE_HITS.inc();
                debug!(key = %entry.key, "cache hit");
                return Ok(entry.value);
            }
            Ok(None) => {}
            Err(e) => warn!(key = %digest, error = %e, "failed to read cache entry, recomputing"),
        }
        CACHE_MISSES.inc();
        debug!(key = %digest, "cache miss");

        let value = compute().await?;

        if let Err(e) = self.write(&digest, &value).await {
            CACHE_WRITE_FAILURES.inc();
            warn!(key = %digest, error = %e, "failed to persist cache entry");
        }
        Ok(value)
    }

    async fn read<T: DeserializeOwned>(&self, digest: &str) -> Result<Option<CacheEntry<T>>, CacheError> {
        let path = self.entry_path(digest);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        let value = serde_json::from_slice(&bytes).map_err(|source| CacheError::Json { path, source })?;
        Ok(Some(CacheEntry {
            key: digest.to_string(),
            value,
        }))
    }

    async fn write<T: Serialize>(&self, digest: &str, value: &T) -> Result<(), CacheError> {
        let path = self.entry_path(digest);
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| CacheError::Io { path, source })
    }
}
