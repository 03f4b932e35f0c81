//! Frame Cache - A bounded, content-addressed cache for tabular data
//!
//! Stores frames under caller-chosen names or content fingerprints, keeps at
//! most `max_size` entries per namespace and evicts in insertion order.
//! Backends: filesystem, Redis, in-process memory, and a disabled no-op.

pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod shared;

pub use cache::{get_cache, Cache, CacheHandle, CacheStats, FileCache, MemoryCache, NoCache};
#[cfg(feature = "redis")]
pub use cache::RedisCache;
pub use config::{BackendKind, Config};
pub use error::{CacheError, Result};
pub use fingerprint::{dataframe_checksum, json_checksum, str_checksum};
pub use frame::{Column, DataFrame, Value};
pub use shared::SharedCache;
