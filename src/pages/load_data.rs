//! Load Tables page: dataset/run selection, streaming table view, CSV export

use std::io::Write;

use crate::store::ChunkStore;

use super::{Page, PageState};

/// Run choices offered by default; a run database is not wired in
const DEFAULT_RUN_IDS: [&str; 2] = ["170621_0617", "180423_1021"];

pub struct LoadDataPage {
    state: PageState,
    run_id_options: Vec<String>,
    selected_run: String,
    dataset_options: Vec<String>,
    selected_dataset: String,
    /// Source key the table currently displays
    displayed_key: String,
    table_columns: Vec<String>,
    /// Row count streamed into the table so far
    displayed_rows: usize,
}

impl LoadDataPage {
    pub fn new(dataset_names: &[String]) -> Self {
        let run_id_options: Vec<String> = DEFAULT_RUN_IDS.iter().map(|s| s.to_string()).collect();
        Self {
            state: PageState::Idle,
            selected_run: run_id_options[0].clone(),
            run_id_options,
            dataset_options: dataset_names.to_vec(),
            selected_dataset: dataset_names.first().cloned().unwrap_or_default(),
            displayed_key: String::new(),
            table_columns: Vec::new(),
            displayed_rows: 0,
        }
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// The Load control is disabled for the whole duration of a load
    pub fn load_enabled(&self) -> bool {
        self.state != PageState::Loading
    }

    pub fn select_run(&mut self, run_id: &str) {
        self.selected_run = run_id.to_string();
    }

    pub fn select_dataset(&mut self, name: &str) {
        self.selected_dataset = name.to_string();
    }

    /// Trigger transition: Idle/Ready to Loading
    ///
    /// Returns the (dataset, run) pair to hand to the loader, or `None`
    /// while a load is already in flight.
    pub fn request_load(&mut self) -> Option<(String, String)> {
        if self.state == PageState::Loading {
            return None;
        }
        if self.selected_dataset.is_empty() {
            return None;
        }
        self.state = PageState::Loading;
        Some((self.selected_dataset.clone(), self.selected_run.clone()))
    }

    /// First batch of a fresh key: adopt its schema and clear the table
    pub fn on_reset_columns(&mut self, key: &str, columns: Vec<String>) {
        self.displayed_key = key.to_string();
        self.table_columns = columns;
        self.displayed_rows = 0;
    }

    /// A batch landed in the store; grow the table view when it is ours
    pub fn on_append(&mut self, key: &str, rows: usize) {
        if key == self.displayed_key {
            self.displayed_rows += rows;
        }
    }

    /// Switch the table to an already loaded source
    pub fn on_switch(&mut self, key: &str, store: &ChunkStore) {
        let chunks = store.get(key);
        let Some(first) = chunks.first() else {
            eprintln!("failed to get data for '{}'", key);
            self.state = PageState::Ready;
            return;
        };
        self.displayed_key = key.to_string();
        self.table_columns = first.column_names();
        self.displayed_rows = chunks.iter().map(|b| b.row_count()).sum();
        self.state = PageState::Ready;
    }

    /// Unconditional end-of-load transition, success or failure
    pub fn on_load_finished(&mut self, _key: &str) {
        self.state = PageState::Ready;
    }

    pub fn displayed_key(&self) -> &str {
        &self.displayed_key
    }

    pub fn table_columns(&self) -> &[String] {
        &self.table_columns
    }

    pub fn displayed_rows(&self) -> usize {
        self.displayed_rows
    }

    pub fn run_id_options(&self) -> &[String] {
        &self.run_id_options
    }

    pub fn export_enabled(&self) -> bool {
        !self.displayed_key.is_empty()
    }

    /// Write every loaded batch of the displayed source as one CSV table
    ///
    /// Rows follow append order; the header comes from the first batch and
    /// later batches are projected onto it.
    pub fn export_csv<W: Write>(&self, store: &ChunkStore, writer: W) -> csv::Result<()> {
        let chunks = store.get(&self.displayed_key);
        let mut out = csv::Writer::from_writer(writer);
        let Some(first) = chunks.first() else {
            return out.flush().map_err(Into::into);
        };

        let names = first.column_names();
        out.write_record(&names)?;
        for chunk in &chunks {
            for row in 0..chunk.row_count() {
                let record: Vec<String> = names
                    .iter()
                    .map(|name| match chunk.column(name) {
                        Some(crate::batch::Column::Scalar(values)) => values[row].to_string(),
                        Some(crate::batch::Column::Nested(rows)) => rows[row]
                            .iter()
                            .map(|v| v.to_string())
                            .collect::<Vec<_>>()
                            .join(" "),
                        None => String::new(),
                    })
                    .collect();
                out.write_record(&record)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

impl Page for LoadDataPage {
    fn title(&self) -> &'static str {
        "Load Tables"
    }

    fn refresh(&mut self, dataset_names: &[String], _source_keys: &[String]) {
        self.dataset_options = dataset_names.to_vec();
        if self.selected_dataset.is_empty() {
            self.selected_dataset = dataset_names.first().cloned().unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Column, RecordBatch};

    fn names() -> Vec<String> {
        vec!["event_basics".to_string()]
    }

    #[test]
    fn test_load_trigger_disabled_while_loading() {
        let mut page = LoadDataPage::new(&names());
        assert_eq!(page.state(), PageState::Idle);
        assert!(page.load_enabled());

        let request = page.request_load();
        assert_eq!(
            request,
            Some(("event_basics".to_string(), "170621_0617".to_string()))
        );
        assert_eq!(page.state(), PageState::Loading);
        assert!(!page.load_enabled());
        // A second press while loading is ignored
        assert_eq!(page.request_load(), None);

        page.on_load_finished("event_basics_170621_0617");
        assert_eq!(page.state(), PageState::Ready);
        assert!(page.request_load().is_some());
    }

    #[test]
    fn test_table_follows_stream() {
        let mut page = LoadDataPage::new(&names());
        page.request_load();
        page.on_reset_columns("event_basics_170621_0617", vec!["time".to_string()]);
        page.on_append("event_basics_170621_0617", 50);
        page.on_append("other_key", 10);
        page.on_append("event_basics_170621_0617", 44);
        assert_eq!(page.displayed_rows(), 94);
        assert_eq!(page.table_columns(), ["time".to_string()]);
    }

    #[test]
    fn test_switch_to_existing_source() {
        let store = ChunkStore::new();
        let batch = RecordBatch::from_columns(vec![(
            "area".to_string(),
            Column::Scalar(vec![1.0, 2.0]),
        )])
        .unwrap();
        store.append("peak_basics_180423_1021", batch);

        let mut page = LoadDataPage::new(&names());
        page.request_load();
        page.on_switch("peak_basics_180423_1021", &store);
        assert_eq!(page.state(), PageState::Ready);
        assert_eq!(page.displayed_key(), "peak_basics_180423_1021");
        assert_eq!(page.displayed_rows(), 2);
    }

    #[test]
    fn test_export_csv_concatenates_chunks() {
        let store = ChunkStore::new();
        for v in [1.0, 2.0] {
            store.append(
                "a_r0",
                RecordBatch::from_columns(vec![("x".to_string(), Column::Scalar(vec![v]))])
                    .unwrap(),
            );
        }
        let mut page = LoadDataPage::new(&names());
        page.on_reset_columns("a_r0", vec!["x".to_string()]);

        let mut buffer = Vec::new();
        page.export_csv(&store, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["x", "1", "2"]);
    }
}
