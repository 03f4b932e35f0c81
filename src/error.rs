//! Error types for the frame cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the frame cache.
///
/// `Backend` errors are meant to be non-fatal for callers: a failed read
/// should be handled like a miss and a failed write simply skipped.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be encoded or decoded canonically
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The underlying store is unreachable or reported a fault
    #[error("Backend error: {0}")]
    Backend(String),

    /// Key is empty or too long
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Frame shape is inconsistent (ragged columns, duplicate names)
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Construction parameters are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Returns true for storage-layer faults that callers should degrade on.
    pub fn is_backend(&self) -> bool {
        matches!(self, CacheError::Backend(_))
    }
}

// == Conversions ==
impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Backend(format!("I/O failure: {}", err))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(format!("Redis failure: {}", err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the frame cache.
pub type Result<T> = std::result::Result<T, CacheError>;
