//! Batch detection over a pre-collected list of events

use crate::analysis::analyze_group;
use crate::registry::DetectorRegistry;
use opsense_core::{DetectorConfig, FileEvent, FileOperation, Result};
use std::sync::Arc;
use tracing::debug;

/// Classifies event batches into operations
///
/// Holds no mutable state, so one instance can serve concurrent callers.
#[derive(Clone)]
pub struct OperationDetector {
    config: DetectorConfig,
    registry: Arc<dyn DetectorRegistry>,
}

impl OperationDetector {
    /// Create a detector, validating `config`
    pub fn new(config: DetectorConfig, registry: Arc<dyn DetectorRegistry>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    /// Detect operations in `events`, one result at most per time window
    ///
    /// Results are returned in window order.
    pub fn detect(&self, events: Vec<FileEvent>) -> Vec<FileOperation> {
        let groups = group_events(events, self.config.window_micros());
        debug!(groups = groups.len(), "Analyzing event groups");

        groups
            .iter()
            .filter_map(|group| self.analyze_group(group))
            .collect()
    }

    /// Classify a single group of events (ascending by timestamp)
    pub fn analyze_group(&self, events: &[FileEvent]) -> Option<FileOperation> {
        analyze_group(events, self.registry.as_ref(), &self.config)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

/// Partition events into time windows
///
/// Events are sorted by timestamp (stable). Each window is anchored to its
/// first event; an event joins the window while it is no more than
/// `window_micros` past the anchor, otherwise it opens a new one.
pub fn group_events(mut events: Vec<FileEvent>, window_micros: u64) -> Vec<Vec<FileEvent>> {
    events.sort_by_key(|e| e.timestamp);

    let mut groups: Vec<Vec<FileEvent>> = Vec::new();
    let mut anchor = 0u64;

    for event in events {
        match groups.last_mut() {
            Some(group) if event.timestamp - anchor <= window_micros => group.push(event),
            _ => {
                anchor = event.timestamp;
                groups.push(vec![event]);
            }
        }
    }

    groups
}
