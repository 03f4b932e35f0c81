//! Redis Cache Module
//!
//! Shared backend for several processes pointing at one Redis server.
//!
//! Keys used per namespace:
//!
//! | Key | Type | Purpose |
//! |-----|------|---------|
//! | `{ns}:entry:{key}` | string | encoded payload |
//! | `{ns}:order` | sorted set | keys scored by insertion sequence |
//! | `{ns}:seq` | string | insertion counter |
//!
//! Namespaces may not contain `:`, so the first segment of every key names
//! exactly one namespace.
//!
//! Writes and clears run as server-side scripts, so the bound holds exactly
//! even with many concurrent clients. Requires Redis 5.0 or newer (`ZPOPMIN`).

use std::fmt;
use std::time::Duration;

use redis::{Client, Commands, Connection, RedisResult, Script};
use tracing::{debug, info, warn};

use crate::cache::{validate_key, validate_namespace, Cache, CacheStats};
use crate::error::{CacheError, Result};

/// Stores the payload, records first insertion, then pops the overflow.
///
/// `ZADD NX` leaves an existing member's score alone, which is what keeps an
/// overwritten key in its original eviction slot.
const PUT_SCRIPT: &str = r#"
local seq = redis.call('INCR', KEYS[3])
redis.call('SET', KEYS[1], ARGV[1])
redis.call('ZADD', KEYS[2], 'NX', seq, ARGV[2])
local card = redis.call('ZCARD', KEYS[2])
local excess = card - tonumber(ARGV[3])
local evicted = 0
if excess > 0 then
    local popped = redis.call('ZPOPMIN', KEYS[2], excess)
    for i = 1, #popped, 2 do
        redis.call('DEL', ARGV[4] .. popped[i])
        evicted = evicted + 1
    end
end
return {evicted, card - evicted}
"#;

/// Drops every data key listed in the ordered set, then the set and counter.
const CLEAR_SCRIPT: &str = r#"
local members = redis.call('ZRANGE', KEYS[1], 0, -1)
for _, member in ipairs(members) do
    redis.call('DEL', ARGV[1] .. member)
end
redis.call('DEL', KEYS[1], KEYS[2])
return #members
"#;

/// Separates the namespace from the rest of a Redis key.
const KEY_SEPARATOR: char = ':';

// == Redis Cache ==
/// Cache stored in a Redis keyspace.
///
/// The connection is opened on first use and dropped by [`RedisCache::close`]
/// or after a connection-level failure; the next call reconnects.
pub struct RedisCache {
    namespace: String,
    client: Client,
    conn: Option<Connection>,
    connect_timeout: Duration,
    max_size: usize,
    put_script: Script,
    clear_script: Script,
    stats: CacheStats,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("namespace", &self.namespace)
            .field("connected", &self.conn.is_some())
            .field("max_size", &self.max_size)
            .field("stats", &self.stats)
            .finish()
    }
}

impl RedisCache {
    // == Constructor ==
    /// Creates a client for `url` without connecting.
    ///
    /// # Arguments
    /// * `namespace` - Prefix isolating this cache's keys
    /// * `url` - Redis URL such as `redis://127.0.0.1:6379/0`
    /// * `max_size` - Maximum number of entries kept in the namespace
    /// * `connect_timeout` - Limit for establishing the connection
    pub fn new(
        namespace: &str,
        url: &str,
        max_size: usize,
        connect_timeout: Duration,
    ) -> Result<Self> {
        validate_namespace(namespace, max_size)?;
        if namespace.contains(KEY_SEPARATOR) {
            return Err(CacheError::InvalidConfig(format!(
                "Redis namespace '{}' must not contain '{}'",
                namespace, KEY_SEPARATOR
            )));
        }
        let client = Client::open(url)
            .map_err(|e| CacheError::InvalidConfig(format!("Invalid Redis URL '{}': {}", url, e)))?;

        Ok(Self {
            namespace: namespace.to_string(),
            client,
            conn: None,
            connect_timeout,
            max_size,
            put_script: Script::new(PUT_SCRIPT),
            clear_script: Script::new(CLEAR_SCRIPT),
            stats: CacheStats::new(),
        })
    }

    // == Connection Lifecycle ==
    /// Verifies the server answers `PING`, connecting if needed.
    pub fn check_connection(&mut self) -> Result<()> {
        let reply: String = self.with_connection(|conn| redis::cmd("PING").query(conn))?;
        debug!("Redis PING answered {}", reply);
        Ok(())
    }

    /// Drops the connection; the next operation reconnects.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            debug!("Redis connection for namespace {} closed", self.namespace);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn with_connection<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> RedisResult<T>,
    {
        if self.conn.is_none() {
            let conn = self.client.get_connection_with_timeout(self.connect_timeout)?;
            info!("Connected to Redis for namespace {}", self.namespace);
            self.conn = Some(conn);
        }

        let result = match self.conn.as_mut() {
            Some(conn) => op(conn),
            None => {
                return Err(CacheError::Backend(
                    "Redis connection unavailable".to_string(),
                ))
            }
        };

        if let Err(e) = &result {
            if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
                warn!("Dropping Redis connection after failure: {}", e);
                self.conn = None;
            }
        }
        result.map_err(CacheError::from)
    }

    // == Key Layout ==
    fn entry_prefix(&self) -> String {
        format!("{}:entry:", self.namespace)
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}{}", self.entry_prefix(), key)
    }

    fn order_key(&self) -> String {
        format!("{}:order", self.namespace)
    }

    fn seq_key(&self) -> String {
        format!("{}:seq", self.namespace)
    }
}

impl Cache for RedisCache {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    // == Put ==
    fn put_blob(&mut self, key: &str, blob: Vec<u8>) -> Result<()> {
        validate_key(key)?;

        let script = self.put_script.clone();
        let mut invocation = script.prepare_invoke();
        invocation
            .key(self.entry_key(key))
            .key(self.order_key())
            .key(self.seq_key())
            .arg(blob.as_slice())
            .arg(key)
            .arg(self.max_size)
            .arg(self.entry_prefix());

        let (evicted, remaining): (u64, usize) =
            self.with_connection(|conn| invocation.invoke(conn))?;

        if evicted > 0 {
            info!(
                "Evicted {} entries from Redis namespace {}",
                evicted, self.namespace
            );
        }
        self.stats.record_evictions(evicted);
        self.stats.set_total_entries(remaining);
        Ok(())
    }

    // == Get ==
    fn get_blob(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let entry_key = self.entry_key(key);
        let blob: Option<Vec<u8>> = self.with_connection(|conn| conn.get(&entry_key))?;

        match &blob {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        Ok(blob)
    }

    // == Delete ==
    fn delete(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        let entry_key = self.entry_key(key);
        let order_key = self.order_key();
        self.with_connection(|conn| {
            redis::pipe()
                .atomic()
                .del(&entry_key)
                .ignore()
                .zrem(&order_key, key)
                .ignore()
                .query(conn)
        })
    }

    fn len(&mut self) -> Result<usize> {
        let order_key = self.order_key();
        self.with_connection(|conn| conn.zcard(&order_key))
    }

    fn clear(&mut self) -> Result<()> {
        let script = self.clear_script.clone();
        let mut invocation = script.prepare_invoke();
        invocation
            .key(self.order_key())
            .key(self.seq_key())
            .arg(self.entry_prefix());

        let removed: u64 = self.with_connection(|conn| invocation.invoke(conn))?;
        debug!(
            "Cleared {} entries from Redis namespace {}",
            removed, self.namespace
        );
        self.stats.set_total_entries(0);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> RedisCache {
        RedisCache::new("predict", "redis://127.0.0.1:6379", 2, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_key_layout() {
        let cache = cache();
        assert_eq!(cache.entry_key("df"), "predict:entry:df");
        assert_eq!(cache.order_key(), "predict:order");
        assert_eq!(cache.seq_key(), "predict:seq");
    }

    #[test]
    fn test_namespace_with_separator_rejected() {
        // Would alias `a` + key `b:entry:c` and `a` + key `b:order`
        for namespace in ["a:entry:b", "a:", ":a"] {
            let result =
                RedisCache::new(namespace, "redis://127.0.0.1:6379", 2, Duration::from_secs(1));
            assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_keys_never_cross_namespaces() {
        let a = RedisCache::new("a", "redis://127.0.0.1:6379", 2, Duration::from_secs(1)).unwrap();
        let ab =
            RedisCache::new("ab", "redis://127.0.0.1:6379", 2, Duration::from_secs(1)).unwrap();

        let own = [a.order_key(), a.seq_key(), a.entry_key("b:order")];
        for key in [ab.order_key(), ab.seq_key(), ab.entry_key("c")] {
            assert!(!own.contains(&key));
        }
        assert_ne!(a.entry_key("order"), a.order_key());
        assert_ne!(a.entry_key("seq"), a.seq_key());
    }

    #[test]
    fn test_new_does_not_connect() {
        let cache = cache();
        assert!(!cache.is_connected());
        assert_eq!(cache.max_size(), 2);
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let result = RedisCache::new("predict", "not a url", 2, Duration::from_secs(1));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_unreachable_server_is_backend_error() {
        // Port 1 is reserved and never runs Redis
        let mut cache =
            RedisCache::new("predict", "redis://127.0.0.1:1", 2, Duration::from_millis(200))
                .unwrap();
        let err = cache.get_blob("k").unwrap_err();
        assert!(err.is_backend());
        assert!(!cache.is_connected());
    }
}
