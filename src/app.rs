//! Application context and event loop
//!
//! The dashboard runs one single-threaded event loop that owns every page
//! and performs every chunk-store append. Workers and the refresh timer
//! communicate with it exclusively through the `UiTask` queue; tasks are
//! applied in the order they were queued. This is the only synchronization
//! point in the process.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::batch::RecordBatch;
use crate::loader::BackgroundLoader;
use crate::pages::{
    ExplorePage, LoadDataPage, Page, PlotColumnsPage, PlotTemplatesPage, ServerConfigPage,
};
use crate::plot::TemplateTable;
use crate::store::{ChunkStore, RANDOM_KEY};
use crate::strax::demo::random_batch;
use crate::strax::{ConfigRow, FieldInfo, StraxBackend};

/// Dataset list used whenever the backend cannot be asked
const FALLBACK_DATASETS: [&str; 1] = ["event_basics"];

/// Shared state handed to every page controller at construction
///
/// Fields are enumerated and typed; pages and workers receive the context
/// by reference instead of digging through an untyped bag.
pub struct AppContext {
    pub backend: Arc<dyn StraxBackend>,
    pub store: ChunkStore,
    pub templates: TemplateTable,
    dataset_names: RwLock<Vec<String>>,
}

impl AppContext {
    /// Build the shared context and seed the `__random__` fallback source
    pub fn new(backend: Arc<dyn StraxBackend>, templates: TemplateTable) -> Arc<Self> {
        let store = ChunkStore::new();
        store.append(RANDOM_KEY, random_batch(100));
        Arc::new(Self {
            backend,
            store,
            templates,
            dataset_names: RwLock::new(Vec::new()),
        })
    }

    pub fn dataset_names(&self) -> Vec<String> {
        self.dataset_names
            .read()
            .map(|names| names.clone())
            .unwrap_or_default()
    }

    pub fn set_dataset_names(&self, names: Vec<String>) {
        if let Ok(mut slot) = self.dataset_names.write() {
            *slot = names;
        }
    }
}

/// Ask the backend for the dataset list, falling back to a default
///
/// Blocking; call off the event loop (startup or a worker).
pub fn fetch_dataset_names(backend: &dyn StraxBackend) -> Vec<String> {
    match backend.search_dataframe_names("*") {
        Ok(names) => names,
        Err(e) => {
            eprintln!("⚠ Dataset list unavailable ({}), using default", e);
            FALLBACK_DATASETS.iter().map(|s| s.to_string()).collect()
        }
    }
}

/// Work item applied by the event loop
#[derive(Debug)]
pub enum UiTask {
    /// First batch of a fresh key: adopt its schema before any append
    ResetColumns { key: String, columns: Vec<String> },
    /// A fully ingested batch ready for the store
    Append { key: String, batch: RecordBatch },
    /// Requested source already loaded; show it without re-fetching
    SwitchTo { key: String },
    /// Unconditional end-of-load marker, queued exactly once per load
    LoadFinished { key: String },
    /// Periodic refresh result
    DatasetNames { names: Vec<String> },
    /// Field search result for the Explore page
    FieldMatches { matches: Vec<String> },
    /// Schema result for the Explore page
    DatasetInfo { name: String, rows: Vec<FieldInfo> },
    /// Option table result for the Strax Settings page
    ConfigRows { name: String, rows: Vec<ConfigRow> },
}

/// The dashboard: pages plus the task queue that drives them
pub struct Dashboard {
    ctx: Arc<AppContext>,
    loader: BackgroundLoader,
    tasks: UnboundedSender<UiTask>,
    queue: UnboundedReceiver<UiTask>,
    pub explore: ExplorePage,
    pub load_data: LoadDataPage,
    pub plot_columns: PlotColumnsPage,
    pub server_config: ServerConfigPage,
    pub plot_templates: PlotTemplatesPage,
}

impl Dashboard {
    pub fn new(ctx: Arc<AppContext>, address: &str) -> Self {
        let (tasks, queue) = mpsc::unbounded_channel();
        let loader = BackgroundLoader::new(ctx.backend.clone(), ctx.store.clone(), tasks.clone());
        let names = ctx.dataset_names();
        Self {
            explore: ExplorePage::new(&names),
            load_data: LoadDataPage::new(&names),
            plot_columns: PlotColumnsPage::new(ctx.store.clone(), &ctx.templates),
            server_config: ServerConfigPage::new(address, &names),
            plot_templates: PlotTemplatesPage::new(&ctx.templates),
            ctx,
            loader,
            tasks,
            queue,
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Sender for producers outside the loop (refresh timer, tests)
    pub fn sender(&self) -> UnboundedSender<UiTask> {
        self.tasks.clone()
    }

    /// Load button pressed on the Load Tables page
    pub fn request_load(&mut self) {
        if let Some((dataset, run_id)) = self.load_data.request_load() {
            self.loader.load(&dataset, &run_id);
        }
    }

    /// Pattern changed on the Explore page
    pub fn search_field(&mut self, pattern: &str) {
        self.explore.set_pattern(pattern);
        let backend = self.ctx.backend.clone();
        let tasks = self.tasks.clone();
        let pattern = pattern.to_string();
        tokio::spawn(async move {
            let result =
                tokio::task::spawn_blocking(move || backend.search_field(&pattern)).await;
            let matches = match result {
                Ok(Ok(matches)) => matches,
                Ok(Err(e)) => {
                    eprintln!("Field search failed: {}", e);
                    Vec::new()
                }
                Err(_) => Vec::new(),
            };
            let _ = tasks.send(UiTask::FieldMatches { matches });
        });
    }

    /// Dataset changed on the Explore page
    pub fn request_data_info(&mut self, name: &str) {
        self.explore.select_dataset(name);
        let backend = self.ctx.backend.clone();
        let tasks = self.tasks.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            let fetch_name = name.clone();
            let result =
                tokio::task::spawn_blocking(move || backend.data_info(&fetch_name)).await;
            let rows = match result {
                Ok(Ok(rows)) => rows,
                Ok(Err(e)) => {
                    eprintln!("Schema fetch for '{}' failed: {}", name, e);
                    Vec::new()
                }
                Err(_) => Vec::new(),
            };
            let _ = tasks.send(UiTask::DatasetInfo { name, rows });
        });
    }

    /// Dataset changed on the Strax Settings page
    pub fn request_show_config(&mut self, name: &str) {
        self.server_config.select_dataset(name);
        let backend = self.ctx.backend.clone();
        let tasks = self.tasks.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            let fetch_name = name.clone();
            let result =
                tokio::task::spawn_blocking(move || backend.show_config(&fetch_name)).await;
            let rows = match result {
                Ok(Ok(rows)) => rows,
                Ok(Err(e)) => {
                    eprintln!("Config fetch for '{}' failed: {}", name, e);
                    Vec::new()
                }
                Err(_) => Vec::new(),
            };
            let _ = tasks.send(UiTask::ConfigRows { name, rows });
        });
    }

    /// Apply one queued task; the sole mutation path for shared state
    pub fn apply(&mut self, task: UiTask) {
        match task {
            UiTask::ResetColumns { key, columns } => {
                self.ctx.store.ensure(&key);
                self.load_data.on_reset_columns(&key, columns);
                self.plot_columns.set_source_options(self.ctx.store.keys());
            }
            UiTask::Append { key, batch } => {
                let rows = batch.row_count();
                self.ctx.store.append(&key, batch);
                self.load_data.on_append(&key, rows);
            }
            UiTask::SwitchTo { key } => {
                self.load_data.on_switch(&key, &self.ctx.store);
            }
            UiTask::LoadFinished { key } => {
                self.load_data.on_load_finished(&key);
                self.plot_columns.set_source_options(self.ctx.store.keys());
            }
            UiTask::DatasetNames { names } => {
                self.ctx.set_dataset_names(names.clone());
                let keys = self.ctx.store.keys();
                self.explore.refresh(&names, &keys);
                self.load_data.refresh(&names, &keys);
                self.plot_columns.refresh(&names, &keys);
                self.server_config.refresh(&names, &keys);
                self.plot_templates.refresh(&names, &keys);
            }
            UiTask::FieldMatches { matches } => {
                self.explore.apply_field_matches(matches);
            }
            UiTask::DatasetInfo { name, rows } => {
                self.explore.apply_data_info(name, rows);
            }
            UiTask::ConfigRows { name, rows } => {
                self.server_config.apply_config_rows(name, rows);
            }
        }
    }

    /// Serve the task queue until every sender is gone
    pub async fn run(&mut self) {
        while self.process_next().await {}
    }

    /// Apply the next queued task; `false` once the queue is closed
    pub async fn process_next(&mut self) -> bool {
        let task = self.queue.recv().await;
        match task {
            Some(task) => {
                self.apply(task);
                true
            }
            None => false,
        }
    }

    /// Serve the task queue until a specific load completes
    pub async fn run_until_finished(&mut self, key: &str) {
        loop {
            let task = self.queue.recv().await;
            let Some(task) = task else {
                return;
            };
            let done = matches!(&task, UiTask::LoadFinished { key: k } if k == key)
                || matches!(&task, UiTask::SwitchTo { key: k } if k == key);
            self.apply(task);
            if done {
                return;
            }
        }
    }
}

/// Re-fetch the dataset list on a fixed interval and queue the result
///
/// Failures fall back to the last known list so selector options never
/// vanish on a transient outage.
pub fn spawn_periodic_refresh(
    ctx: Arc<AppContext>,
    tasks: UnboundedSender<UiTask>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = IntervalStream::new(tokio::time::interval(every));
        // The first tick fires immediately and primes the selectors
        while ticks.next().await.is_some() {
            let backend = ctx.backend.clone();
            let fetched =
                tokio::task::spawn_blocking(move || backend.search_dataframe_names("*")).await;
            let names = match fetched {
                Ok(Ok(names)) => names,
                Ok(Err(e)) => {
                    eprintln!("⚠ Dataset refresh failed: {}", e);
                    let last_known = ctx.dataset_names();
                    if last_known.is_empty() {
                        FALLBACK_DATASETS.iter().map(|s| s.to_string()).collect()
                    } else {
                        last_known
                    }
                }
                Err(_) => break,
            };
            if tasks.send(UiTask::DatasetNames { names }).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Column;
    use crate::store::source_key;
    use crate::strax::backend::BatchIter;
    use crate::strax::error::StraxError;
    use crate::strax::Result;

    /// Backend scripted to the canonical three-batch load scenario
    struct EventBasicsBackend;

    fn scripted_batch(offset: f64, nulls: bool) -> RecordBatch {
        let time: Vec<f64> = (0..50).map(|i| offset + i as f64).collect();
        let s1_area: Vec<f64> = (0..50)
            .map(|i| {
                if nulls && (10..16).contains(&i) {
                    f64::NAN
                } else {
                    100.0 + i as f64
                }
            })
            .collect();
        RecordBatch::from_columns(vec![
            ("time".to_string(), Column::Scalar(time)),
            ("s1_area".to_string(), Column::Scalar(s1_area)),
        ])
        .unwrap()
    }

    impl StraxBackend for EventBasicsBackend {
        fn search_dataframe_names(&self, _pattern: &str) -> Result<Vec<String>> {
            Ok(vec!["event_basics".to_string(), "peak_basics".to_string()])
        }

        fn data_info(&self, name: &str) -> Result<Vec<FieldInfo>> {
            Ok(vec![FieldInfo {
                field_name: "time".to_string(),
                data_type: "float64".to_string(),
                comment: format!("start time of {}", name),
            }])
        }

        fn search_field(&self, _pattern: &str) -> Result<Vec<String>> {
            Ok(vec!["s1_area".to_string()])
        }

        fn get_array_iter(&self, _run_id: &str, _name: &str) -> Result<BatchIter> {
            let batches = vec![
                scripted_batch(0.0, false),
                scripted_batch(50.0, true),
                scripted_batch(100.0, false),
            ];
            Ok(Box::new(batches.into_iter().map(Ok)))
        }

        fn show_config(&self, _name: &str) -> Result<Vec<ConfigRow>> {
            Ok(Vec::new())
        }
    }

    /// Backend whose every call fails
    struct DownBackend;

    impl StraxBackend for DownBackend {
        fn search_dataframe_names(&self, _pattern: &str) -> Result<Vec<String>> {
            Err(StraxError::Unreachable("connection refused".to_string()))
        }

        fn data_info(&self, _name: &str) -> Result<Vec<FieldInfo>> {
            Err(StraxError::Unreachable("connection refused".to_string()))
        }

        fn search_field(&self, _pattern: &str) -> Result<Vec<String>> {
            Err(StraxError::Unreachable("connection refused".to_string()))
        }

        fn get_array_iter(&self, _run_id: &str, _name: &str) -> Result<BatchIter> {
            Err(StraxError::Unreachable("connection refused".to_string()))
        }

        fn show_config(&self, _name: &str) -> Result<Vec<ConfigRow>> {
            Err(StraxError::Unreachable("connection refused".to_string()))
        }
    }

    #[test]
    fn test_startup_fallback_dataset_list() {
        let names = fetch_dataset_names(&DownBackend);
        assert_eq!(names, vec!["event_basics".to_string()]);
    }

    #[tokio::test]
    async fn test_end_to_end_load_and_navigate() {
        let ctx = AppContext::new(Arc::new(EventBasicsBackend), TemplateTable::load_default());
        ctx.set_dataset_names(fetch_dataset_names(ctx.backend.as_ref()));

        let mut dashboard = Dashboard::new(ctx.clone(), "localhost:50051");
        let key = source_key("event_basics", "170621_0617");

        dashboard.request_load();
        assert!(!dashboard.load_data.load_enabled());
        dashboard.run_until_finished(&key).await;
        assert!(dashboard.load_data.load_enabled());

        // Three chunks landed, in order, with the null rows dropped
        let chunks = ctx.store.get(&key);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].row_count(), 50);
        assert_eq!(chunks[1].row_count(), 44);
        assert_eq!(chunks[2].row_count(), 50);
        assert_eq!(dashboard.load_data.displayed_rows(), 144);

        // Navigate the loaded source: forward, then carousel wrap
        let templates = ctx.templates.clone();
        dashboard.plot_columns.select_source(&key, &templates);
        assert_eq!(dashboard.plot_columns.navigator().total(), 3);
        assert_eq!(dashboard.plot_columns.navigator().current_index(), 0);

        dashboard.plot_columns.next_chunk(&templates);
        assert_eq!(dashboard.plot_columns.navigator().current_index(), 1);

        dashboard.plot_columns.goto_chunk(2, &templates);
        dashboard.plot_columns.next_chunk(&templates);
        assert_eq!(dashboard.plot_columns.navigator().current_index(), 0);
    }

    #[tokio::test]
    async fn test_second_load_switches_to_existing() {
        let ctx = AppContext::new(Arc::new(EventBasicsBackend), TemplateTable::load_default());
        ctx.set_dataset_names(fetch_dataset_names(ctx.backend.as_ref()));
        let mut dashboard = Dashboard::new(ctx.clone(), "localhost:50051");
        let key = source_key("event_basics", "170621_0617");

        dashboard.request_load();
        dashboard.run_until_finished(&key).await;
        assert_eq!(ctx.store.len(&key), 3);

        dashboard.request_load();
        dashboard.run_until_finished(&key).await;
        // Still three chunks: the second press switched instead of re-fetching
        assert_eq!(ctx.store.len(&key), 3);
        assert!(dashboard.load_data.load_enabled());
    }

    #[tokio::test]
    async fn test_failed_load_reenables_control() {
        let ctx = AppContext::new(Arc::new(DownBackend), TemplateTable::load_default());
        ctx.set_dataset_names(vec!["event_basics".to_string()]);
        let mut dashboard = Dashboard::new(ctx.clone(), "localhost:50051");
        let key = source_key("event_basics", "170621_0617");

        dashboard.request_load();
        dashboard.run_until_finished(&key).await;
        assert!(dashboard.load_data.load_enabled());
        assert!(ctx.store.get(&key).is_empty());
    }

    #[tokio::test]
    async fn test_explore_round_trip() {
        let ctx = AppContext::new(Arc::new(EventBasicsBackend), TemplateTable::load_default());
        ctx.set_dataset_names(fetch_dataset_names(ctx.backend.as_ref()));
        let mut dashboard = Dashboard::new(ctx, "localhost:50051");

        dashboard.search_field("s1*");
        dashboard.request_data_info("event_basics");

        // Drain the two results the workers queue
        for _ in 0..2 {
            dashboard.process_next().await;
        }
        assert_eq!(dashboard.explore.results_text(), "s1_area");
        assert_eq!(dashboard.explore.info_rows().len(), 1);
        assert_eq!(dashboard.explore.info_title(), "Columns for event_basics:");
    }

    #[tokio::test]
    async fn test_periodic_refresh_updates_pages() {
        let ctx = AppContext::new(Arc::new(EventBasicsBackend), TemplateTable::load_default());
        let mut dashboard = Dashboard::new(ctx.clone(), "localhost:50051");

        let handle = spawn_periodic_refresh(
            ctx.clone(),
            dashboard.sender(),
            Duration::from_millis(10),
        );
        dashboard.process_next().await;
        handle.abort();

        assert_eq!(
            ctx.dataset_names(),
            vec!["event_basics".to_string(), "peak_basics".to_string()]
        );
        assert_eq!(dashboard.explore.dataset_options().len(), 2);
    }
}
