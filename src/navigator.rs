//! Per-page cursor over a chunk sequence
//!
//! Wraps a store key with a current index and hands out the batch at each
//! navigation step. Navigation past either end wraps around (carousel), so
//! stepping forward from the last chunk returns to chunk 0 instead of
//! stopping. The total is re-read from the store on every navigation and
//! can grow while a load is still streaming.

use std::sync::Arc;

use crate::batch::RecordBatch;
use crate::store::ChunkStore;

pub struct ChunkNavigator {
    store: ChunkStore,
    current_name: String,
    current_index: usize,
    total: usize,
}

impl ChunkNavigator {
    pub fn new(store: ChunkStore) -> Self {
        Self {
            store,
            current_name: String::new(),
            current_index: 0,
            total: 0,
        }
    }

    /// Key currently navigated, empty until the first successful `goto`
    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Chunk count of the current key as of the last navigation
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether any chunk is available to show
    pub fn enabled(&self) -> bool {
        self.total > 0
    }

    /// The "previous" control is active away from the first chunk
    pub fn prev_enabled(&self) -> bool {
        self.total > 0 && self.current_index != 0
    }

    /// The "next" control is active away from the last chunk
    pub fn next_enabled(&self) -> bool {
        self.total > 0 && self.current_index != self.total - 1
    }

    /// Move to `index` within `key`, wrapping modulo the chunk count
    ///
    /// Returns the batch at the landing position; the caller replaces its
    /// live plot source with it. A key with no chunks is a no-op returning
    /// `None` and the controls stay disabled.
    pub fn goto(&mut self, key: &str, index: i64) -> Option<Arc<RecordBatch>> {
        let chunks = self.store.get(key);
        if chunks.is_empty() {
            return None;
        }
        self.total = chunks.len();
        self.current_index = index.rem_euclid(self.total as i64) as usize;
        if self.current_name != key {
            self.current_name = key.to_string();
        }
        Some(chunks[self.current_index].clone())
    }

    pub fn next(&mut self) -> Option<Arc<RecordBatch>> {
        let name = self.current_name.clone();
        self.goto(&name, self.current_index as i64 + 1)
    }

    pub fn prev(&mut self) -> Option<Arc<RecordBatch>> {
        let name = self.current_name.clone();
        self.goto(&name, self.current_index as i64 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Column, RecordBatch};

    fn store_with(key: &str, n: usize) -> ChunkStore {
        let store = ChunkStore::new();
        for i in 0..n {
            let batch = RecordBatch::from_columns(vec![(
                "x".to_string(),
                Column::Scalar(vec![i as f64]),
            )])
            .unwrap();
            store.append(key, batch);
        }
        store
    }

    fn tag(batch: &RecordBatch) -> f64 {
        match batch.column("x") {
            Some(Column::Scalar(values)) => values[0],
            _ => panic!("missing tag column"),
        }
    }

    #[test]
    fn test_wrap_law() {
        let store = store_with("peaks_r0", 4);
        let mut nav = ChunkNavigator::new(store);
        assert_eq!(nav.goto("peaks_r0", 4).map(|b| tag(&b)), Some(0.0));
        assert_eq!(nav.current_index(), 0);
        assert_eq!(nav.goto("peaks_r0", -1).map(|b| tag(&b)), Some(3.0));
        assert_eq!(nav.current_index(), 3);
    }

    #[test]
    fn test_empty_key_is_noop() {
        let store = ChunkStore::new();
        let mut nav = ChunkNavigator::new(store);
        assert!(nav.goto("missing", 0).is_none());
        assert!(!nav.enabled());
        assert!(!nav.prev_enabled());
        assert!(!nav.next_enabled());
        assert_eq!(nav.current_name(), "");
    }

    #[test]
    fn test_next_wraps_and_prev_steps() {
        let store = store_with("a", 3);
        let mut nav = ChunkNavigator::new(store);
        nav.goto("a", 0);
        assert!(!nav.prev_enabled());
        assert!(nav.next_enabled());

        assert_eq!(nav.next().map(|b| tag(&b)), Some(1.0));
        assert_eq!(nav.next().map(|b| tag(&b)), Some(2.0));
        assert!(!nav.next_enabled());

        // Carousel: stepping past the last chunk lands on the first
        assert_eq!(nav.next().map(|b| tag(&b)), Some(0.0));
        assert_eq!(nav.prev().map(|b| tag(&b)), Some(2.0));
    }

    #[test]
    fn test_total_refreshes_as_store_grows() {
        let store = store_with("a", 1);
        let mut nav = ChunkNavigator::new(store.clone());
        nav.goto("a", 0);
        assert_eq!(nav.total(), 1);
        assert!(!nav.next_enabled());

        store.append(
            "a",
            RecordBatch::from_columns(vec![("x".to_string(), Column::Scalar(vec![9.0]))]).unwrap(),
        );
        // A fresh navigation sees the new chunk and re-enables "next"
        nav.goto("a", 0);
        assert_eq!(nav.total(), 2);
        assert!(nav.next_enabled());
    }
}
