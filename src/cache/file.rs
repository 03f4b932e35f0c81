//! File Cache Module
//!
//! Filesystem backend: one file per entry inside `<root>/<namespace>/`.
//!
//! ## Layout
//!
//! ```text
//! <root>/predict/
//!   3f1c...9a.entry   (sha256 of the key)
//!   .tmpXXXXXX        (in-flight write, ignored)
//! ```
//!
//! Each entry file starts with an 8-byte big-endian insertion sequence,
//! followed by the encoded payload. New entries take the next sequence after
//! the newest one present; overwrites keep the sequence of the file they
//! replace. Eviction order therefore never depends on timestamp precision.
//! Writers in several processes may share a directory; ordering between
//! them is approximately FIFO.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::cache::{validate_key, validate_namespace, Cache, CacheStats};
use crate::error::{CacheError, Result};
use crate::fingerprint::str_checksum;

const ENTRY_EXTENSION: &str = "entry";

/// Bytes of the sequence header in front of every payload.
const HEADER_LEN: usize = 8;

// == Entry File ==
#[derive(Debug)]
struct EntryFile {
    path: PathBuf,
    sequence: u64,
}

// == File Cache ==
/// Persistent cache rooted in a directory; entries survive restarts.
#[derive(Debug)]
pub struct FileCache {
    namespace: String,
    dir: PathBuf,
    max_size: usize,
    stats: CacheStats,
}

impl FileCache {
    // == Constructor ==
    /// Opens (creating if needed) the namespace directory under `root`.
    ///
    /// # Arguments
    /// * `namespace` - Partition name, used as the directory name
    /// * `root` - Cache root shared by all namespaces
    /// * `max_size` - Maximum number of entry files kept
    pub fn new(namespace: &str, root: impl AsRef<Path>, max_size: usize) -> Result<Self> {
        validate_namespace(namespace, max_size)?;
        let dir = root.as_ref().join(namespace);
        fs::create_dir_all(&dir).map_err(|e| io_failure("create_dir_all", &dir, e))?;

        info!(
            "File cache opened: namespace={}, dir={}, max_size={}",
            namespace,
            dir.display(),
            max_size
        );

        Ok(Self {
            namespace: namespace.to_string(),
            dir,
            max_size,
            stats: CacheStats::new(),
        })
    }

    /// Directory holding this namespace's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", str_checksum(key), ENTRY_EXTENSION))
    }

    // == Listing ==
    /// Lists entry file paths, ignoring temp files and foreign files.
    fn list_entries(&self) -> Result<Vec<PathBuf>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| io_failure("read_dir", &self.dir, e))?;

        let mut paths = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| io_failure("read_dir", &self.dir, e))?;
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match dir_entry.file_type() {
                Ok(file_type) if file_type.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_failure("file_type", &path, e)),
            }
        }
        Ok(paths)
    }

    /// Entry files with their sequences, oldest first.
    ///
    /// Files that vanish while listing (evicted by another writer) are skipped.
    fn ordered_entries(&self) -> Result<Vec<EntryFile>> {
        let mut entries = Vec::new();
        for path in self.list_entries()? {
            if let Some(sequence) = read_sequence(&path)? {
                entries.push(EntryFile { path, sequence });
            }
        }
        entries.sort_by(|a, b| {
            a.sequence
                .cmp(&b.sequence)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(entries)
    }

    // == Trim ==
    /// Deletes the oldest entry files until at most `max_size` remain.
    fn trim(&mut self) -> Result<u64> {
        let entries = self.ordered_entries()?;
        if entries.len() <= self.max_size {
            self.stats.set_total_entries(entries.len());
            return Ok(0);
        }

        let excess = entries.len() - self.max_size;
        let mut evicted = 0;
        for entry in &entries[..excess] {
            match fs::remove_file(&entry.path) {
                Ok(()) => evicted += 1,
                // Another writer got there first
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_failure("remove_file", &entry.path, e)),
            }
        }

        info!(
            "Evicted {} entries from file namespace {}",
            evicted, self.namespace
        );
        self.stats.record_evictions(evicted);
        self.stats
            .set_total_entries(entries.len() - evicted as usize);
        Ok(evicted)
    }
}

/// Reads the insertion sequence of an entry file.
///
/// Returns `None` if the file is gone. A file too short to hold a header
/// sorts as oldest so the next trim clears it out.
fn read_sequence(path: &Path) -> Result<Option<u64>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_failure("open", path, e)),
    };
    let mut header = [0u8; HEADER_LEN];
    match file.read_exact(&mut header) {
        Ok(()) => Ok(Some(u64::from_be_bytes(header))),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            warn!("Entry file {} has no header", path.display());
            Ok(Some(0))
        }
        Err(e) => Err(io_failure("read", path, e)),
    }
}

fn io_failure(operation: &str, path: &Path, err: io::Error) -> CacheError {
    CacheError::Backend(format!(
        "{} on {} failed: {}",
        operation,
        path.display(),
        err
    ))
}

impl Cache for FileCache {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    // == Put ==
    /// Writes through a temporary file and renames it into place, so readers
    /// never observe a partial entry.
    fn put_blob(&mut self, key: &str, blob: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        let path = self.entry_path(key);

        let existing = self.ordered_entries()?;
        let sequence = match existing.iter().find(|e| e.path == path) {
            Some(entry) => entry.sequence,
            None => existing.last().map_or(1, |newest| newest.sequence + 1),
        };

        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|e| io_failure("create", &self.dir, e))?;
        tmp.write_all(&sequence.to_be_bytes())
            .map_err(|e| io_failure("write", tmp.path(), e))?;
        tmp.write_all(&blob)
            .map_err(|e| io_failure("write", tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| io_failure("sync", tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| io_failure("rename", &path, e.error))?;

        debug!(
            "Stored {} bytes under {} in namespace {} (sequence {})",
            blob.len(),
            key,
            self.namespace,
            sequence
        );

        self.trim()?;
        Ok(())
    }

    // == Get ==
    fn get_blob(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(mut blob) => {
                if blob.len() < HEADER_LEN {
                    return Err(CacheError::Backend(format!(
                        "Entry file {} is truncated",
                        path.display()
                    )));
                }
                self.stats.record_hit();
                debug!("Cache hit: {} in namespace {}", key, self.namespace);
                Ok(Some(blob.split_off(HEADER_LEN)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.stats.record_miss();
                debug!("Cache miss: {} in namespace {}", key, self.namespace);
                Ok(None)
            }
            Err(e) => Err(io_failure("read", &path, e)),
        }
    }

    // == Delete ==
    fn delete(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_failure("remove_file", &path, e)),
        }
    }

    fn len(&mut self) -> Result<usize> {
        Ok(self.list_entries()?.len())
    }

    fn clear(&mut self) -> Result<()> {
        for path in self.list_entries()? {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_failure("remove_file", &path, e)),
            }
        }
        self.stats.set_total_entries(0);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn open(root: &TempDir, max_size: usize) -> FileCache {
        FileCache::new("predict", root.path(), max_size).unwrap()
    }

    #[test]
    fn test_creates_namespace_dir() {
        let root = TempDir::new().unwrap();
        let cache = open(&root, 2);
        assert!(cache.dir().is_dir());
        assert_eq!(cache.dir(), root.path().join("predict"));
    }

    #[test]
    fn test_rejects_path_like_namespace() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            FileCache::new("../escape", root.path(), 2),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_put_get_delete() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 2);

        cache.put_blob("key/with/slashes", b"v".to_vec()).unwrap();
        assert_eq!(
            cache.get_blob("key/with/slashes").unwrap(),
            Some(b"v".to_vec())
        );

        cache.delete("key/with/slashes").unwrap();
        cache.delete("key/with/slashes").unwrap();
        assert_eq!(cache.get_blob("key/with/slashes").unwrap(), None);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 5);
        cache.put_blob("a", b"1".to_vec()).unwrap();
        cache.put_blob("a", b"2".to_vec()).unwrap();

        let names: Vec<_> = fs::read_dir(cache.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".entry"));
    }

    #[test]
    fn test_foreign_files_are_ignored() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 1);
        fs::write(cache.dir().join("notes.txt"), b"keep me").unwrap();

        cache.put_blob("a", b"1".to_vec()).unwrap();
        cache.put_blob("b", b"2".to_vec()).unwrap();

        assert_eq!(cache.len().unwrap(), 1);
        assert!(cache.dir().join("notes.txt").exists());
    }

    fn sequence_of(cache: &FileCache, key: &str) -> u64 {
        read_sequence(&cache.entry_path(key)).unwrap().unwrap()
    }

    #[test]
    fn test_sequences_are_strictly_increasing() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 10);
        for i in 0..5 {
            cache.put_blob(&i.to_string(), b"x".to_vec()).unwrap();
        }

        let sequences: Vec<u64> = (0..5).map(|i| sequence_of(&cache, &i.to_string())).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_overwrite_keeps_sequence() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 10);
        cache.put_blob("a", b"1".to_vec()).unwrap();
        cache.put_blob("b", b"1".to_vec()).unwrap();
        let before = sequence_of(&cache, "a");

        cache.put_blob("a", b"2".to_vec()).unwrap();

        assert_eq!(sequence_of(&cache, "a"), before);
        assert_eq!(cache.get_blob("a").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_order_ignores_modification_times() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 3);
        for key in ["a", "b", "c"] {
            cache.put_blob(key, b"x".to_vec()).unwrap();
        }

        // Coarse timestamps: equal mtimes, except "a" which looks newest
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        for (key, offset) in [("a", 1), ("b", 0), ("c", 0)] {
            fs::OpenOptions::new()
                .write(true)
                .open(cache.entry_path(key))
                .unwrap()
                .set_modified(stamp + Duration::from_secs(offset))
                .unwrap();
        }

        cache.put_blob("d", b"x".to_vec()).unwrap();
        assert_eq!(cache.get_blob("a").unwrap(), None);
        cache.put_blob("e", b"x".to_vec()).unwrap();
        assert_eq!(cache.get_blob("b").unwrap(), None);
        for key in ["c", "d", "e"] {
            assert!(cache.get_blob(key).unwrap().is_some(), "{} evicted", key);
        }
    }

    #[test]
    fn test_headerless_file_is_evicted_first() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 2);
        cache.put_blob("a", b"1".to_vec()).unwrap();
        fs::write(cache.entry_path("broken"), b"abc").unwrap();

        assert!(cache.get_blob("broken").unwrap_err().is_backend());

        cache.put_blob("b", b"2".to_vec()).unwrap();
        assert!(!cache.entry_path("broken").exists());
        assert!(cache.get_blob("a").unwrap().is_some());
        assert!(cache.get_blob("b").unwrap().is_some());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let root = TempDir::new().unwrap();
        {
            let mut cache = open(&root, 3);
            cache.put_blob("persisted", b"v".to_vec()).unwrap();
        }
        let mut reopened = open(&root, 3);
        assert_eq!(reopened.get_blob("persisted").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let root = TempDir::new().unwrap();
        let mut predict = FileCache::new("predict", root.path(), 3).unwrap();
        let mut other = FileCache::new("other", root.path(), 3).unwrap();

        predict.put_blob("k", b"v".to_vec()).unwrap();

        assert_eq!(other.get_blob("k").unwrap(), None);
        other.clear().unwrap();
        assert!(predict.get_blob("k").unwrap().is_some());
    }

    #[test]
    fn test_eviction_stats() {
        let root = TempDir::new().unwrap();
        let mut cache = open(&root, 2);
        for key in ["a", "b", "c", "d"] {
            cache.put_blob(key, b"x".to_vec()).unwrap();
        }
        let stats = cache.stats();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(cache.get_blob("a").unwrap(), None);
        assert_eq!(cache.get_blob("b").unwrap(), None);
    }
}
