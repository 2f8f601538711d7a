//! Explore page: field-pattern search and per-dataset schema display

use crate::strax::FieldInfo;

use super::Page;

/// Initial search pattern shown when the page first opens
const INITIAL_PATTERN: &str = "s1*";

pub struct ExplorePage {
    pattern: String,
    pattern_results: Vec<String>,
    dataset_options: Vec<String>,
    selected_dataset: String,
    info_dataset: String,
    info_rows: Vec<FieldInfo>,
}

impl ExplorePage {
    pub fn new(dataset_names: &[String]) -> Self {
        Self {
            pattern: INITIAL_PATTERN.to_string(),
            pattern_results: Vec::new(),
            dataset_options: dataset_names.to_vec(),
            selected_dataset: dataset_names.first().cloned().unwrap_or_default(),
            info_dataset: String::new(),
            info_rows: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Record a new search pattern; the event loop issues the search
    pub fn set_pattern(&mut self, pattern: &str) {
        self.pattern = pattern.to_string();
    }

    pub fn apply_field_matches(&mut self, matches: Vec<String>) {
        self.pattern_results = matches;
    }

    /// Text for the match display panel
    pub fn results_text(&self) -> String {
        if self.pattern_results.is_empty() {
            "No Matches to show.".to_string()
        } else {
            self.pattern_results.join("\n")
        }
    }

    pub fn selected_dataset(&self) -> &str {
        &self.selected_dataset
    }

    /// Record a dataset choice; the event loop fetches its schema
    pub fn select_dataset(&mut self, name: &str) {
        self.selected_dataset = name.to_string();
    }

    pub fn apply_data_info(&mut self, name: String, rows: Vec<FieldInfo>) {
        self.info_dataset = name;
        self.info_rows = rows;
    }

    pub fn info_title(&self) -> String {
        format!("Columns for {}:", self.info_dataset)
    }

    pub fn info_rows(&self) -> &[FieldInfo] {
        &self.info_rows
    }

    pub fn dataset_options(&self) -> &[String] {
        &self.dataset_options
    }
}

impl Page for ExplorePage {
    fn title(&self) -> &'static str {
        "Explore"
    }

    fn refresh(&mut self, dataset_names: &[String], _source_keys: &[String]) {
        self.dataset_options = dataset_names.to_vec();
        if self.selected_dataset.is_empty() {
            self.selected_dataset = dataset_names.first().cloned().unwrap_or_default();
        }
    }
}
