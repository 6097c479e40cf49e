//! Operation detection for Opsense
//!
//! This crate turns raw filesystem events into semantic file operations:
//! - Time-window grouping of event batches
//! - Priority-ordered, confidence-scored detector pipeline
//! - Temp path correction so results always name the real file
//! - Debounced streaming detection with a cancellable flush timer
//! - Built-in detectors for common save, rename, copy and delete patterns

pub mod analysis;
pub mod batch;
pub mod builtin;
pub mod debounce;
pub mod registry;

// Re-exports
pub use analysis::{analyze_group, HIGH_CONFIDENCE};
pub use batch::{group_events, OperationDetector};
pub use builtin::{builtin_detectors, register_builtin};
pub use debounce::{OperationCallback, StreamingDetector};
pub use registry::{
    detectors_for, DetectFn, DetectorEntry, DetectorRegistry, InMemoryRegistry,
    OPERATION_CATEGORY,
};

pub use opsense_core::{
    DetectorConfig, Error, EventKind, FileEvent, FileOperation, OperationType, Result,
};
