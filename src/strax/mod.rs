//! Strax backend interface module
//!
//! Structure:
//! - `backend.rs`: the `StraxBackend` trait and schema/config row types
//! - `demo.rs`: offline synthetic backend for development and demos
//! - `error.rs`: error types

pub mod backend;
pub mod demo;
pub mod error;

// Re-exports for convenience
pub use backend::{BatchIter, ConfigRow, FieldInfo, StraxBackend};
pub use demo::DemoBackend;
pub use error::{Result, StraxError};
