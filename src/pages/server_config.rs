//! Strax Settings page: backend address and per-dataset option table

use crate::strax::ConfigRow;

use super::Page;

pub struct ServerConfigPage {
    address: String,
    dataset_options: Vec<String>,
    selected_dataset: String,
    config_dataset: String,
    config_rows: Vec<ConfigRow>,
}

impl ServerConfigPage {
    pub fn new(address: &str, dataset_names: &[String]) -> Self {
        Self {
            address: address.to_string(),
            dataset_options: dataset_names.to_vec(),
            selected_dataset: dataset_names.first().cloned().unwrap_or_default(),
            config_dataset: String::new(),
            config_rows: Vec::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Accept a new backend address, reverting on an invalid value
    pub fn set_address(&mut self, address: &str) -> bool {
        if valid_address(address) {
            self.address = address.to_string();
            true
        } else {
            eprintln!("⚠ Ignoring invalid backend address '{}'", address);
            false
        }
    }

    pub fn selected_dataset(&self) -> &str {
        &self.selected_dataset
    }

    /// Record a dataset choice; the event loop fetches its config table
    pub fn select_dataset(&mut self, name: &str) {
        self.selected_dataset = name.to_string();
    }

    pub fn apply_config_rows(&mut self, name: String, rows: Vec<ConfigRow>) {
        self.config_dataset = name;
        self.config_rows = rows;
    }

    pub fn config_rows(&self) -> &[ConfigRow] {
        &self.config_rows
    }

    pub fn config_dataset(&self) -> &str {
        &self.config_dataset
    }
}

/// host:port with a numeric port
fn valid_address(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

impl Page for ServerConfigPage {
    fn title(&self) -> &'static str {
        "Strax Settings"
    }

    fn refresh(&mut self, dataset_names: &[String], _source_keys: &[String]) {
        self.dataset_options = dataset_names.to_vec();
        if self.selected_dataset.is_empty() {
            self.selected_dataset = dataset_names.first().cloned().unwrap_or_default();
        }
    }
}
