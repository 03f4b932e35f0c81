//! Cache Module
//!
//! Bounded, FIFO-evicting caches for frames and serde values. Every backend
//! implements [`Cache`]; [`get_cache`] picks one from [`Config`].

mod disabled;
mod fifo;
mod file;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod stats;


use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{BackendKind, Config};
use crate::error::{CacheError, Result};
use crate::frame::DataFrame;

// Re-export public types
pub use disabled::NoCache;
pub use fifo::FifoTracker;
pub use file::FileCache;
pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use redis_store::RedisCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

// == Cache Trait ==
/// Contract shared by every backend.
///
/// Backends store opaque blobs; the provided methods layer frame and serde
/// encoding on top. After each write a namespace holds at most
/// [`Cache::max_size`] entries, the oldest insertions being evicted first.
/// Overwriting a key replaces its value but keeps its eviction position.
pub trait Cache {
    /// Partition this instance reads and writes.
    fn namespace(&self) -> &str;

    /// Upper bound on resident entries.
    fn max_size(&self) -> usize;

    /// Stores `blob` under `key`, then trims the namespace to `max_size`.
    fn put_blob(&mut self, key: &str, blob: Vec<u8>) -> Result<()>;

    /// Returns the blob under `key`, or `None` if it was never set, was
    /// deleted, or was evicted.
    fn get_blob(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removes `key`. Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Number of resident entries in the namespace.
    fn len(&mut self) -> Result<usize>;

    /// Removes every entry in the namespace.
    fn clear(&mut self) -> Result<()>;

    /// Counters observed by this instance.
    fn stats(&self) -> CacheStats;

    fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // == Frames ==
    /// Stores a frame.
    fn set(&mut self, key: &str, frame: &DataFrame) -> Result<()> {
        let blob = frame.to_bytes()?;
        self.put_blob(key, blob)
    }

    /// Loads a frame content-equal to the one stored under `key`.
    fn get(&mut self, key: &str) -> Result<Option<DataFrame>> {
        match self.get_blob(key)? {
            Some(blob) => DataFrame::from_bytes(&blob).map(Some),
            None => Ok(None),
        }
    }

    // == Serde Values ==
    /// Stores any serializable value as JSON.
    fn set_value<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        Self: Sized,
    {
        let blob = serde_json::to_vec(value)?;
        self.put_blob(key, blob)
    }

    /// Loads a value stored with [`Cache::set_value`].
    fn get_value<T>(&mut self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        Self: Sized,
    {
        match self.get_blob(key)? {
            Some(blob) => Ok(Some(serde_json::from_slice(&blob)?)),
            None => Ok(None),
        }
    }

    // == Read Through ==
    /// Returns the cached frame for `key`, computing and storing it on a miss.
    ///
    /// Cache faults never reach the caller: a failed read is treated as a
    /// miss and a failed write is logged and dropped. Only `compute` errors
    /// are returned.
    fn get_or_compute<F, E>(&mut self, key: &str, compute: F) -> std::result::Result<DataFrame, E>
    where
        F: FnOnce() -> std::result::Result<DataFrame, E>,
        Self: Sized,
    {
        match self.get(key) {
            Ok(Some(frame)) => return Ok(frame),
            Ok(None) => {}
            Err(e) => warn!(
                namespace = self.namespace(),
                key,
                error = %e,
                "Cache read failed, recomputing"
            ),
        }

        let frame = compute()?;
        if let Err(e) = self.set(key, &frame) {
            warn!(
                namespace = self.namespace(),
                key,
                error = %e,
                "Cache write failed, continuing without cache"
            );
        }
        Ok(frame)
    }
}

// == Validation ==
/// Rejects empty keys and keys longer than [`MAX_KEY_LENGTH`].
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Checks construction parameters common to all backends.
///
/// The namespace must be usable as a single directory name.
pub fn validate_namespace(namespace: &str, max_size: usize) -> Result<()> {
    if namespace.is_empty() || namespace == "." || namespace == ".." {
        return Err(CacheError::InvalidConfig(format!(
            "Invalid cache namespace '{}'",
            namespace
        )));
    }
    if namespace.contains(['/', '\\', '\0']) {
        return Err(CacheError::InvalidConfig(format!(
            "Cache namespace '{}' must not contain path separators",
            namespace
        )));
    }
    if max_size == 0 {
        return Err(CacheError::InvalidConfig(
            "max_size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

// == Cache Handle ==
/// A backend chosen at runtime by [`get_cache`].
#[derive(Debug)]
pub enum CacheHandle {
    File(FileCache),
    #[cfg(feature = "redis")]
    Redis(RedisCache),
    Memory(MemoryCache),
    Disabled(NoCache),
}

macro_rules! dispatch {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            CacheHandle::File($inner) => $body,
            #[cfg(feature = "redis")]
            CacheHandle::Redis($inner) => $body,
            CacheHandle::Memory($inner) => $body,
            CacheHandle::Disabled($inner) => $body,
        }
    };
}

impl Cache for CacheHandle {
    fn namespace(&self) -> &str {
        dispatch!(self, c => c.namespace())
    }

    fn max_size(&self) -> usize {
        dispatch!(self, c => c.max_size())
    }

    fn put_blob(&mut self, key: &str, blob: Vec<u8>) -> Result<()> {
        dispatch!(self, c => c.put_blob(key, blob))
    }

    fn get_blob(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        dispatch!(self, c => c.get_blob(key))
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        dispatch!(self, c => c.delete(key))
    }

    fn len(&mut self) -> Result<usize> {
        dispatch!(self, c => c.len())
    }

    fn clear(&mut self) -> Result<()> {
        dispatch!(self, c => c.clear())
    }

    fn stats(&self) -> CacheStats {
        dispatch!(self, c => c.stats())
    }
}

// == Factory ==
/// Builds the backend selected by `config.backend` for `namespace`.
///
/// The Redis backend connects lazily, so an unreachable server only shows
/// up on the first operation.
pub fn get_cache(namespace: &str, config: &Config) -> Result<CacheHandle> {
    config.validate()?;
    let handle = match config.backend {
        BackendKind::File => {
            CacheHandle::File(FileCache::new(namespace, &config.cache_dir, config.max_size)?)
        }
        #[cfg(feature = "redis")]
        BackendKind::Redis => CacheHandle::Redis(RedisCache::new(
            namespace,
            &config.redis_url,
            config.max_size,
            config.redis_connect_timeout,
        )?),
        #[cfg(not(feature = "redis"))]
        BackendKind::Redis => {
            return Err(CacheError::InvalidConfig(
                "Redis backend requires the `redis` feature".to_string(),
            ))
        }
        BackendKind::Memory => CacheHandle::Memory(MemoryCache::new(namespace, config.max_size)?),
        BackendKind::Disabled => CacheHandle::Disabled(NoCache::new(namespace)),
    };
    info!(
        "Cache ready: namespace={}, backend={:?}, max_size={}",
        namespace, config.backend, config.max_size
    );
    Ok(handle)
}
