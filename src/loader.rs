//! Background loading of dataset chunks
//!
//! Consumes the backend's blocking batch iterator on a worker permit, runs
//! the ingestion step per batch and hands finished batches to the event
//! loop task queue. The event loop performs the store append and repaint;
//! workers never touch widget or store state directly.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;

use crate::app::UiTask;
use crate::store::{source_key, ChunkStore};
use crate::strax::error::Result;
use crate::strax::StraxBackend;

/// Fixed worker pool size for blocking iterator consumption
const WORKER_SLOTS: usize = 2;

/// Schedules loads and streams their batches into the task queue
#[derive(Clone)]
pub struct BackgroundLoader {
    backend: Arc<dyn StraxBackend>,
    store: ChunkStore,
    tasks: UnboundedSender<UiTask>,
    workers: Arc<Semaphore>,
}

impl BackgroundLoader {
    pub fn new(
        backend: Arc<dyn StraxBackend>,
        store: ChunkStore,
        tasks: UnboundedSender<UiTask>,
    ) -> Self {
        Self {
            backend,
            store,
            tasks,
            workers: Arc::new(Semaphore::new(WORKER_SLOTS)),
        }
    }

    /// Load one dataset of one run into the chunk store
    ///
    /// If the key already holds data, a single switch notification is
    /// queued instead of re-fetching. Otherwise the iterator runs to
    /// exhaustion on a worker; every load ends with exactly one
    /// `LoadFinished`, whether it succeeded, failed or yielded nothing.
    /// Batches appended before a failure stay valid and visible.
    pub fn load(&self, dataset: &str, run_id: &str) {
        let key = source_key(dataset, run_id);
        if !self.store.is_empty(&key) {
            println!("Source '{}' already loaded, switching", key);
            let _ = self.tasks.send(UiTask::SwitchTo { key });
            return;
        }

        let backend = self.backend.clone();
        let tasks = self.tasks.clone();
        let workers = self.workers.clone();
        let dataset = dataset.to_string();
        let run_id = run_id.to_string();

        tokio::spawn(async move {
            let permit = match workers.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let stream_tasks = tasks.clone();
            let stream_key = key.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                stream_batches(&*backend, &run_id, &dataset, &stream_key, &stream_tasks)
            })
            .await;

            match outcome {
                Ok(Ok(batches)) => {
                    println!("✓ Load complete for '{}' ({} batches)", key, batches)
                }
                Ok(Err(e)) => eprintln!("Load failed for '{}': {}", key, e),
                Err(e) => eprintln!("Load worker died for '{}': {}", key, e),
            }

            let _ = tasks.send(UiTask::LoadFinished { key });
            drop(permit);
        });
    }
}

/// Drain the blocking iterator, ingesting and queueing each batch in order
fn stream_batches(
    backend: &dyn StraxBackend,
    run_id: &str,
    dataset: &str,
    key: &str,
    tasks: &UnboundedSender<UiTask>,
) -> Result<usize> {
    let iter = backend.get_array_iter(run_id, dataset)?;
    let mut count = 0usize;
    for raw in iter {
        let batch = raw?.ingest();
        if count == 0 {
            let reset = UiTask::ResetColumns {
                key: key.to_string(),
                columns: batch.column_names(),
            };
            if tasks.send(reset).is_err() {
                return Ok(count);
            }
        }
        let append = UiTask::Append {
            key: key.to_string(),
            batch,
        };
        if tasks.send(append).is_err() {
            return Ok(count);
        }
        count += 1;
    }
    Ok(count)
}
