//! Process-wide chunk store
//!
//! Maps a source key (`"{dataset}_{run_id}"`) to the ordered sequence of
//! record batches loaded for it. Entries are append-only while a load is
//! running and read-many afterwards. All mutation is funneled through the
//! event loop task queue; readers take cheap snapshots and are never blocked
//! by a concurrent append.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::batch::RecordBatch;

/// Key under which the synthetic fallback batch is stored at startup
pub const RANDOM_KEY: &str = "__random__";

/// Build the store key for a dataset of a run
pub fn source_key(dataset: &str, run_id: &str) -> String {
    format!("{}_{}", dataset, run_id)
}

/// Shared mapping from source key to loaded batches
///
/// Clones share the same underlying map. A `get` returns the snapshot of
/// batches present at the moment of the call; the length may grow between
/// two calls but a held snapshot never changes.
#[derive(Clone, Default)]
pub struct ChunkStore {
    inner: Arc<RwLock<HashMap<String, Vec<Arc<RecordBatch>>>>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty entry for a key if absent (idempotent)
    pub fn ensure(&self, key: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.entry(key.to_string()).or_default();
        }
    }

    /// Append a batch to the tail of a key's sequence
    pub fn append(&self, key: &str, batch: RecordBatch) {
        if let Ok(mut map) = self.inner.write() {
            map.entry(key.to_string())
                .or_default()
                .push(Arc::new(batch));
        }
    }

    /// Snapshot of the batches for a key; empty for unknown keys
    pub fn get(&self, key: &str) -> Vec<Arc<RecordBatch>> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
            .unwrap_or_default()
    }

    /// Number of batches currently loaded for a key
    pub fn len(&self, key: &str) -> usize {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(key).map(|chunks| chunks.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    /// All known keys, sorted for stable selector option lists
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Column;

    fn batch(value: f64) -> RecordBatch {
        RecordBatch::from_columns(vec![("x".to_string(), Column::Scalar(vec![value]))]).unwrap()
    }

    #[test]
    fn test_append_preserves_order() {
        let store = ChunkStore::new();
        for i in 0..5 {
            store.append("peaks_r0", batch(i as f64));
        }
        let chunks = store.get("peaks_r0");
        assert_eq!(chunks.len(), 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.column("x"), Some(&Column::Scalar(vec![i as f64])));
        }
    }

    #[test]
    fn test_get_unknown_key_is_empty() {
        let store = ChunkStore::new();
        assert!(store.get("nothing_here").is_empty());
        assert_eq!(store.len("nothing_here"), 0);
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let store = ChunkStore::new();
        store.ensure("a");
        store.append("a", batch(1.0));
        store.ensure("a");
        assert_eq!(store.len("a"), 1);
        assert_eq!(store.keys(), vec!["a".to_string()]);
    }

    #[test]
    fn test_snapshot_is_stable_across_appends() {
        let store = ChunkStore::new();
        store.append("a", batch(1.0));
        let snapshot = store.get("a");
        store.append("a", batch(2.0));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len("a"), 2);
    }

    #[test]
    fn test_keys_sorted() {
        let store = ChunkStore::new();
        store.ensure("b");
        store.ensure("a");
        store.ensure(RANDOM_KEY);
        assert_eq!(
            store.keys(),
            vec!["__random__".to_string(), "a".to_string(), "b".to_string()]
        );
    }
}
