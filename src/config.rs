//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default number of entries kept per namespace.
pub const DEFAULT_MAX_SIZE: usize = 50;

/// Default Redis endpoint.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

// == Backend Kind ==
/// Which storage backend `get_cache` builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// One file per entry under `cache_dir/<namespace>`
    #[default]
    File,
    /// Shared Redis keyspace
    Redis,
    /// Process-local map
    Memory,
    /// Caching disabled
    Disabled,
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "redis" => Ok(BackendKind::Redis),
            "memory" => Ok(BackendKind::Memory),
            "none" | "disabled" => Ok(BackendKind::Disabled),
            other => Err(CacheError::InvalidConfig(format!(
                "Unknown cache backend '{}'",
                other
            ))),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend selected by `get_cache`
    pub backend: BackendKind,
    /// Maximum number of entries kept per namespace
    pub max_size: usize,
    /// Root directory of the file backend
    pub cache_dir: PathBuf,
    /// Redis connection URL
    pub redis_url: String,
    /// Timeout for establishing a Redis connection
    pub redis_connect_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TYPE` - `file`, `redis`, `memory` or `none` (default: file)
    /// - `CACHE_MAX_SIZE` - Entries per namespace (default: 50)
    /// - `CACHE_DIR` - File backend root (default: `<tmp>/frame_cache`)
    /// - `CACHE_REDIS_URL` - Redis URL (default: redis://127.0.0.1:6379)
    /// - `CACHE_REDIS_TIMEOUT` - Connect timeout in seconds (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env::var("CACHE_TYPE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            redis_url: env::var("CACHE_REDIS_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.redis_url),
            redis_connect_timeout: env::var("CACHE_REDIS_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.redis_connect_timeout),
        }
    }

    /// Checks values that have no usable fallback.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            max_size: DEFAULT_MAX_SIZE,
            cache_dir: env::temp_dir().join("frame_cache"),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            redis_connect_timeout: Duration::from_secs(5),
        }
    }
}
