//! Core types for Opsense
//!
//! This crate provides:
//! - Raw filesystem event and detected operation value types
//! - Temp/swap/backup file heuristics
//! - Detector configuration
//! - notify event ingestion

pub mod config;
pub mod error;
pub mod event;
pub mod ingest;
pub mod operation;
pub mod temp;

// Re-exports
pub use config::DetectorConfig;
pub use error::{Error, Result};
pub use event::{EventKind, FileEvent};
pub use operation::{FileOperation, OperationType};
pub use temp::{extract_base_name, is_temp_file};
