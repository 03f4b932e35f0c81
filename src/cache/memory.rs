//! Memory Cache Module
//!
//! In-process backend combining HashMap storage with FIFO tracking.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{validate_key, validate_namespace, Cache, CacheStats, FifoTracker};
use crate::error::Result;

// == Memory Cache ==
/// Process-local cache; entries die with the instance.
#[derive(Debug)]
pub struct MemoryCache {
    namespace: String,
    /// Encoded payloads by key
    entries: HashMap<String, Vec<u8>>,
    /// Insertion order tracker
    fifo: FifoTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_size` entries.
    pub fn new(namespace: &str, max_size: usize) -> Result<Self> {
        validate_namespace(namespace, max_size)?;
        Ok(Self {
            namespace: namespace.to_string(),
            entries: HashMap::new(),
            fifo: FifoTracker::new(),
            stats: CacheStats::new(),
            max_size,
        })
    }

    /// Returns the stored payload without touching statistics.
    pub fn peek(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    // == Evict Overflow ==
    fn evict_overflow(&mut self) -> u64 {
        let mut evicted = 0;
        while self.entries.len() > self.max_size {
            match self.fifo.evict_oldest() {
                Some(key) => {
                    self.entries.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }
}

impl Cache for MemoryCache {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    // == Put ==
    /// Stores a payload, keeping the original slot for existing keys.
    fn put_blob(&mut self, key: &str, blob: Vec<u8>) -> Result<()> {
        validate_key(key)?;

        if self.entries.insert(key.to_string(), blob).is_none() {
            self.fifo.record_insert(key);
        }

        let evicted = self.evict_overflow();
        if evicted > 0 {
            debug!(
                "Evicted {} entries from memory namespace {}",
                evicted, self.namespace
            );
        }
        self.stats.record_evictions(evicted);
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Get ==
    fn get_blob(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        match self.entries.get(key) {
            Some(blob) => {
                self.stats.record_hit();
                Ok(Some(blob.clone()))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Delete ==
    fn delete(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        if self.entries.remove(key).is_some() {
            self.fifo.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        Ok(())
    }

    fn len(&mut self) -> Result<usize> {
        Ok(self.entries.len())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.fifo.clear();
        self.stats.set_total_entries(0);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}
