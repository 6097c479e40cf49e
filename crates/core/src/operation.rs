//! Detected file operations

use crate::event::FileEvent;
use std::fmt;
use std::path::{Path, PathBuf};

/// A semantic operation inferred from one or more raw events
///
/// Immutable once built. Corrections produce a new value via
/// [`FileOperation::with_primary_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileOperation {
    /// Kind of operation
    pub operation_type: OperationType,
    /// The logical file the operation is about
    pub primary_path: PathBuf,
    /// Detector certainty, 0.0..=1.0
    pub confidence: f64,
    /// Constituent events, ascending by timestamp
    pub events: Vec<FileEvent>,
}

/// Type of detected operation
///
/// Open set: detectors may report their own kinds through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationType {
    Create,
    Modify,
    Delete,
    Rename,
    AtomicSave,
    Copy,
    Other(String),
}

impl FileOperation {
    /// Build an operation, clamping confidence into 0.0..=1.0 and ordering events
    pub fn new(
        operation_type: OperationType,
        primary_path: impl Into<PathBuf>,
        confidence: f64,
        events: Vec<FileEvent>,
    ) -> Self {
        let mut events = events;
        events.sort_by_key(|e| e.timestamp);

        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            operation_type,
            primary_path: primary_path.into(),
            confidence,
            events,
        }
    }

    /// Copy of this operation with a different primary path
    pub fn with_primary_path(&self, primary_path: impl Into<PathBuf>) -> Self {
        Self {
            primary_path: primary_path.into(),
            ..self.clone()
        }
    }

    /// Every path mentioned by the constituent events, in event order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.events.iter().flat_map(FileEvent::paths)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Create => f.write_str("create"),
            OperationType::Modify => f.write_str("modify"),
            OperationType::Delete => f.write_str("delete"),
            OperationType::Rename => f.write_str("rename"),
            OperationType::AtomicSave => f.write_str("atomic-save"),
            OperationType::Copy => f.write_str("copy"),
            OperationType::Other(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.2}, {} events)",
            self.operation_type,
            self.primary_path.display(),
            self.confidence,
            self.events.len()
        )
    }
}
