//! Read-only view over registered detectors
//!
//! Registration is owned by the host. The engine only asks for the entries of
//! one category at analysis time and orders them by priority.

use opsense_core::{FileEvent, FileOperation};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Category under which file operation detectors are registered
pub const OPERATION_CATEGORY: &str = "file_operation";

/// Detector callable: ordered events in, at most one operation out
///
/// An `Err` marks the detector as failed for this group; the pass continues
/// with the next detector.
pub type DetectFn =
    Arc<dyn Fn(&[FileEvent]) -> anyhow::Result<Option<FileOperation>> + Send + Sync>;

/// One registered detector
#[derive(Clone)]
pub struct DetectorEntry {
    /// Name used in diagnostics
    pub name: String,
    /// Higher runs first
    pub priority: i32,
    pub detect: DetectFn,
}

impl DetectorEntry {
    pub fn new<F>(name: impl Into<String>, priority: i32, detect: F) -> Self
    where
        F: Fn(&[FileEvent]) -> anyhow::Result<Option<FileOperation>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            detect: Arc::new(detect),
        }
    }
}

impl fmt::Debug for DetectorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Source of detector entries, queried on every analysis
pub trait DetectorRegistry: Send + Sync {
    /// All entries registered for `category`, in no particular order
    fn lookup(&self, category: &str) -> Vec<DetectorEntry>;
}

impl<R: DetectorRegistry + ?Sized> DetectorRegistry for Arc<R> {
    fn lookup(&self, category: &str) -> Vec<DetectorEntry> {
        (**self).lookup(category)
    }
}

/// Entries for `category` sorted by priority, highest first
///
/// The sort is stable: equal priorities keep the order the registry
/// returned them in.
pub fn detectors_for(registry: &dyn DetectorRegistry, category: &str) -> Vec<DetectorEntry> {
    let mut entries = registry.lookup(category);
    entries.sort_by(|a, b| b.priority.cmp(&a.priority));
    entries
}

/// Simple in-process registry keyed by category
///
/// Lookups return entries in registration order.
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: RwLock<HashMap<String, Vec<DetectorEntry>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detector under `category`
    pub fn register(&self, category: &str, entry: DetectorEntry) {
        self.entries
            .write()
            .entry(category.to_string())
            .or_default()
            .push(entry);
    }

    /// Add a detector under the file operation category
    pub fn register_fn<F>(&self, name: &str, priority: i32, detect: F)
    where
        F: Fn(&[FileEvent]) -> anyhow::Result<Option<FileOperation>> + Send + Sync + 'static,
    {
        self.register(OPERATION_CATEGORY, DetectorEntry::new(name, priority, detect));
    }

    /// Remove every entry named `name` from `category`
    ///
    /// Returns true if anything was removed.
    pub fn unregister(&self, category: &str, name: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(category) {
            Some(list) => {
                let before = list.len();
                list.retain(|e| e.name != name);
                list.len() != before
            }
            None => false,
        }
    }

    /// Number of entries under `category`
    pub fn len(&self, category: &str) -> usize {
        self.entries.read().get(category).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, category: &str) -> bool {
        self.len(category) == 0
    }
}

impl DetectorRegistry for InMemoryRegistry {
    fn lookup(&self, category: &str) -> Vec<DetectorEntry> {
        self.entries.read().get(category).cloned().unwrap_or_default()
    }
}
