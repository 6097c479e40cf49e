//! Raw filesystem change notifications

use std::fmt;
use std::path::{Path, PathBuf};

/// A single raw filesystem event
///
/// Produced by an external watcher and consumed once by the detectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Monotonic timestamp in microseconds
    pub timestamp: u64,
    /// Absolute path that changed (source path for moves)
    pub path: PathBuf,
    /// Destination path, present for move/rename notifications
    pub dest_path: Option<PathBuf>,
    /// Type of change
    pub kind: EventKind,
}

/// Type of filesystem event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// File created
    Created,
    /// File modified
    Modified,
    /// File deleted
    Deleted,
    /// File moved or renamed
    Moved,
}

impl FileEvent {
    /// Create a non-move event
    pub fn new(timestamp: u64, path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            timestamp,
            path: path.into(),
            dest_path: None,
            kind,
        }
    }

    pub fn created(timestamp: u64, path: impl Into<PathBuf>) -> Self {
        Self::new(timestamp, path, EventKind::Created)
    }

    pub fn modified(timestamp: u64, path: impl Into<PathBuf>) -> Self {
        Self::new(timestamp, path, EventKind::Modified)
    }

    pub fn deleted(timestamp: u64, path: impl Into<PathBuf>) -> Self {
        Self::new(timestamp, path, EventKind::Deleted)
    }

    /// Create a move event from `from` to `to`
    pub fn moved(timestamp: u64, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            timestamp,
            path: from.into(),
            dest_path: Some(to.into()),
            kind: EventKind::Moved,
        }
    }

    /// The path this event leaves behind: the destination for moves, the path otherwise
    pub fn effective_path(&self) -> &Path {
        self.dest_path.as_deref().unwrap_or(&self.path)
    }

    /// Iterate over every path this event mentions
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.path.as_path()).chain(self.dest_path.as_deref())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Created => "created",
            EventKind::Modified => "modified",
            EventKind::Deleted => "deleted",
            EventKind::Moved => "moved",
        };
        f.write_str(name)
    }
}
