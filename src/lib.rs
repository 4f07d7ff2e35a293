//! Songplay ETL Library
//!
//! Loads song catalog and usage log JSON files into a SQLite star schema.
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod pipeline;
pub mod sqlite_persistence;
pub mod warehouse_store;

// Re-export commonly used types for convenience
pub use pipeline::{load_dir, FileOrder, LoadError, LoadSummary, PipelineError, ProcessingMode};
pub use warehouse_store::{SqliteWarehouseStore, WarehouseStore};
