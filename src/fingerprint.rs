//! Fingerprint Module
//!
//! Content-derived cache keys. All digests are lower-case hex SHA-256.

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::frame::DataFrame;

/// Length of every checksum string in hex characters.
pub const CHECKSUM_LENGTH: usize = 64;

// == Frame Checksum ==
/// Computes the fingerprint of a frame's content.
///
/// Covers column names, column order, row order and every cell. Object
/// identity plays no part, so equal frames built separately hash the same.
///
/// # Errors
/// Returns `CacheError::Serialization` when a cell has no canonical form
/// (non-finite floats).
pub fn dataframe_checksum(frame: &DataFrame) -> Result<String> {
    let canonical = frame.to_bytes()?;
    Ok(bytes_checksum(&canonical))
}

/// Checksum of an arbitrary JSON value with object keys sorted.
pub fn json_checksum(value: &serde_json::Value) -> String {
    // serde_json's default map is ordered by key
    str_checksum(&value.to_string())
}

/// Checksum of a string.
pub fn str_checksum(s: &str) -> String {
    bytes_checksum(s.as_bytes())
}

pub(crate) fn bytes_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
