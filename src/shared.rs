//! Shared Cache Module
//!
//! Async, cloneable handle for event-driven callers. Each call runs the
//! blocking backend operation on tokio's blocking pool.

use std::sync::{Arc, Mutex};

use tokio::task;

use crate::cache::{Cache, CacheStats};
use crate::error::{CacheError, Result};
use crate::frame::DataFrame;

// == Shared Cache ==
/// Thread-safe wrapper around any [`Cache`].
///
/// # Example
/// ```ignore
/// let cache = SharedCache::new(MemoryCache::new("predict", 50)?);
/// let worker = cache.clone();
/// tokio::spawn(async move { worker.set("df", frame).await });
/// ```
#[derive(Debug)]
pub struct SharedCache<C> {
    inner: Arc<Mutex<C>>,
}

impl<C> Clone for SharedCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> SharedCache<C>
where
    C: Cache + Send + 'static,
{
    pub fn new(cache: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Runs `op` against the cache on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut C) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| CacheError::Backend("Cache lock poisoned".to_string()))?;
            op(&mut *guard)
        })
        .await
        .map_err(|e| CacheError::Backend(format!("Cache task failed: {}", e)))?
    }

    pub async fn set(&self, key: impl Into<String>, frame: DataFrame) -> Result<()> {
        let key = key.into();
        self.run(move |cache| cache.set(&key, &frame)).await
    }

    pub async fn get(&self, key: impl Into<String>) -> Result<Option<DataFrame>> {
        let key = key.into();
        self.run(move |cache| cache.get(&key)).await
    }

    pub async fn delete(&self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        self.run(move |cache| cache.delete(&key)).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.run(|cache| cache.len()).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        self.run(|cache| Ok(cache.stats())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::frame::Value;

    fn frame(n: i64) -> DataFrame {
        DataFrame::new()
            .with_column("n", vec![Value::Int(n)])
            .unwrap()
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = SharedCache::new(MemoryCache::new("predict", 4).unwrap());

        cache.set("a", frame(1)).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(frame(1)));

        cache.delete("a").await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
        assert!(cache.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_writers_respect_bound() {
        let cache = SharedCache::new(MemoryCache::new("predict", 3).unwrap());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.set(i.to_string(), frame(i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.len().await.unwrap(), 3);
        assert_eq!(cache.stats().await.unwrap().evictions, 13);
    }
}
