//! No-op backend used when caching is turned off.

use crate::cache::{validate_key, Cache, CacheStats};
use crate::error::Result;

/// Accepts every write and never returns anything.
#[derive(Debug, Clone)]
pub struct NoCache {
    namespace: String,
    stats: CacheStats,
}

impl NoCache {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            stats: CacheStats::new(),
        }
    }
}

impl Cache for NoCache {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn max_size(&self) -> usize {
        0
    }

    fn put_blob(&mut self, key: &str, _blob: Vec<u8>) -> Result<()> {
        validate_key(key)
    }

    fn get_blob(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        self.stats.record_miss();
        Ok(None)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        validate_key(key)
    }

    fn len(&mut self) -> Result<usize> {
        Ok(0)
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}
