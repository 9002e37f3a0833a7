//! Memoization keyed by everything a computation depends on.
//!
//! The cache is advisory: dropping it never changes a result. Keys must
//! capture every effective input, which for file-backed sources means the
//! modification time and length as well as the path.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use lru::LruCache;

use crate::error::Result;

// ---------------------------------------------------------------------------
// SourceKey – identity of a loaded table source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Path {
        path: PathBuf,
        modified: Option<SystemTime>,
        len: u64,
        sheet: Option<String>,
    },
    Bytes {
        hash: u64,
        len: usize,
        sheet: Option<String>,
    },
}

impl SourceKey {
    /// Reads the file's metadata, so a rewritten file gets a new key.
    pub fn for_path(path: &Path, sheet: Option<&str>) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(SourceKey::Path {
            path: path.to_path_buf(),
            modified: meta.modified().ok(),
            len: meta.len(),
            sheet: sheet.map(str::to_string),
        })
    }

    pub fn for_bytes(data: &[u8], sheet: Option<&str>) -> Self {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        SourceKey::Bytes {
            hash: hasher.finish(),
            len: data.len(),
            sheet: sheet.map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Memo – bounded LRU with an injectable key function
// ---------------------------------------------------------------------------

/// Caches `V` computed from an input `I` under the key `key_fn(&I)`.
/// Failed computations are not cached.
pub struct Memo<I: ?Sized, K: Hash + Eq, V> {
    key_fn: Box<dyn Fn(&I) -> K + Send>,
    entries: LruCache<K, Arc<V>>,
    hits: u64,
    misses: u64,
}

impl<I: ?Sized, K: Hash + Eq, V> Memo<I, K, V> {
    pub fn new(capacity: usize, key_fn: impl Fn(&I) -> K + Send + 'static) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Memo {
            key_fn: Box::new(key_fn),
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// The cached value for `input`, computing and storing it on a miss.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        input: &I,
        compute: impl FnOnce(&I) -> std::result::Result<V, E>,
    ) -> std::result::Result<Arc<V>, E> {
        let key = (self.key_fn)(input);
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("cache hit ({} hits, {} misses)", self.hits, self.misses);
            return Ok(Arc::clone(value));
        }
        self.misses += 1;
        let value = Arc::new(compute(input)?);
        self.entries.put(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn invalidate(&mut self, input: &I) {
        let key = (self.key_fn)(input);
        self.entries.pop(&key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn computes_once_per_key() {
        let mut memo: Memo<str, String, usize> = Memo::new(4, |s: &str| s.to_lowercase());
        let mut calls = 0;
        for input in ["Iris", "iris", "IRIS"] {
            let v = memo
                .get_or_try_insert_with(input, |s| {
                    calls += 1;
                    Ok::<_, ()>(s.len())
                })
                .unwrap();
            assert_eq!(*v, 4);
        }
        assert_eq!(calls, 1);
        assert_eq!(memo.stats(), (2, 1));
    }

    #[test]
    fn errors_are_not_cached() {
        let mut memo: Memo<u32, u32, u32> = Memo::new(4, |n: &u32| *n);
        assert!(memo.get_or_try_insert_with(&1, |_| Err("boom")).is_err());
        assert!(memo.is_empty());
        assert_eq!(*memo.get_or_try_insert_with(&1, |n| Ok::<_, &str>(n * 10)).unwrap(), 10);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let mut memo: Memo<u32, u32, u32> = Memo::new(2, |n: &u32| *n);
        for n in [1, 2, 1, 3] {
            memo.get_or_try_insert_with(&n, |n| Ok::<_, ()>(*n)).unwrap();
        }
        assert_eq!(memo.len(), 2);
        let mut recomputed = false;
        memo.get_or_try_insert_with(&2, |n| {
            recomputed = true;
            Ok::<_, ()>(*n)
        })
        .unwrap();
        assert!(recomputed);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let mut memo: Memo<u32, u32, u32> = Memo::new(2, |n: &u32| *n);
        memo.get_or_try_insert_with(&7, |n| Ok::<_, ()>(*n)).unwrap();
        memo.invalidate(&7);
        assert!(memo.is_empty());
    }

    #[test]
    fn path_key_changes_when_file_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a").unwrap();
        let before = SourceKey::for_path(file.path(), None).unwrap();
        writeln!(file, "more content").unwrap();
        file.flush().unwrap();
        let after = SourceKey::for_path(file.path(), None).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn bytes_key_tracks_content_and_sheet() {
        let a = SourceKey::for_bytes(b"abc", None);
        assert_eq!(a, SourceKey::for_bytes(b"abc", None));
        assert_ne!(a, SourceKey::for_bytes(b"abd", None));
        assert_ne!(a, SourceKey::for_bytes(b"abc", Some("Sheet2")));
    }
}
