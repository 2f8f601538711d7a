//! Backend interface for the strax analysis server
//!
//! The dashboard only depends on this trait. The production transport
//! (gRPC against a running straxrpc server) lives in its own crate and
//! binds the same trait; `DemoBackend` covers local development and tests.

use crate::batch::RecordBatch;

use super::error::Result;

/// One row of the schema table returned by `data_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub field_name: String,
    pub data_type: String,
    pub comment: String,
}

/// One row of the option table returned by `show_config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    pub option: String,
    pub default: String,
    pub current: String,
    pub applies_to: String,
    pub help: String,
}

/// Blocking iterator over the record batches of one dataset/run
pub type BatchIter = Box<dyn Iterator<Item = Result<RecordBatch>> + Send>;

/// Blocking client interface to a strax analysis server
///
/// Every method may touch the network and must only be called off the
/// event loop (worker pool or `spawn_blocking`).
pub trait StraxBackend: Send + Sync {
    /// Dataset names matching a glob-style pattern (`"*"` for all)
    fn search_dataframe_names(&self, pattern: &str) -> Result<Vec<String>>;

    /// Column schema of a dataset
    fn data_info(&self, name: &str) -> Result<Vec<FieldInfo>>;

    /// Field names matching a glob-style pattern across all datasets
    fn search_field(&self, pattern: &str) -> Result<Vec<String>>;

    /// Lazy sequence of record batches for one dataset of one run
    fn get_array_iter(&self, run_id: &str, name: &str) -> Result<BatchIter>;

    /// Option table for a dataset
    fn show_config(&self, name: &str) -> Result<Vec<ConfigRow>>;
}
