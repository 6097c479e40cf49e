//! Group analysis shared by batch and streaming detection
//!
//! Runs every registered detector over one group of events in priority
//! order, keeps the most confident answer, and makes sure the answer never
//! names a temp file.

use crate::registry::{detectors_for, DetectorEntry, DetectorRegistry, OPERATION_CATEGORY};
use opsense_core::{extract_base_name, is_temp_file, DetectorConfig, FileEvent, FileOperation};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Confidence at which the detector pass stops early
///
/// Detectors run in priority order, so a higher-priority result at or above
/// this value wins over any lower-priority detector, even one that would
/// have reported more.
pub const HIGH_CONFIDENCE: f64 = 0.95;

/// Classify one group of events (ascending by timestamp)
///
/// Returns `None` when no detector reaches `min_confidence`, or when the
/// winner names a temp file that cannot be resolved to a real path.
pub fn analyze_group(
    events: &[FileEvent],
    registry: &dyn DetectorRegistry,
    config: &DetectorConfig,
) -> Option<FileOperation> {
    if events.is_empty() {
        return None;
    }

    let mut best: Option<FileOperation> = None;

    for entry in detectors_for(registry, OPERATION_CATEGORY) {
        let candidate = match run_detector(&entry, events) {
            Some(op) => op,
            None => continue,
        };

        if best
            .as_ref()
            .map_or(true, |b| candidate.confidence > b.confidence)
        {
            best = Some(candidate);
        }

        if best.as_ref().is_some_and(|b| b.confidence >= HIGH_CONFIDENCE) {
            debug!(detector = %entry.name, "High-confidence match, skipping remaining detectors");
            break;
        }
    }

    let winner = best.filter(|op| op.confidence >= config.min_confidence)?;
    resolve_temp_path(winner, events)
}

/// Invoke one detector, absorbing errors and panics
fn run_detector(entry: &DetectorEntry, events: &[FileEvent]) -> Option<FileOperation> {
    match panic::catch_unwind(AssertUnwindSafe(|| (entry.detect)(events))) {
        Ok(Ok(Some(op))) if !(0.0..=1.0).contains(&op.confidence) => {
            warn!(
                detector = %entry.name,
                events = events.len(),
                confidence = op.confidence,
                "Detector reported confidence outside 0.0..=1.0, ignoring result"
            );
            None
        }
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(
                detector = %entry.name,
                events = events.len(),
                error = %e,
                "Detector failed, continuing with remaining detectors"
            );
            None
        }
        Err(payload) => {
            warn!(
                detector = %entry.name,
                events = events.len(),
                error = %panic_message(payload.as_ref()),
                "Detector panicked, continuing with remaining detectors"
            );
            None
        }
    }
}

/// Replace a temp primary path with the real file it stands for
///
/// Looks for the most recent non-temp path in the group first (move
/// destinations before sources), then falls back to stripping temp markers
/// from the name. Rejects the operation if neither works.
fn resolve_temp_path(op: FileOperation, events: &[FileEvent]) -> Option<FileOperation> {
    if !is_temp_file(&op.primary_path) {
        return Some(op);
    }

    let resolved = events.iter().rev().find_map(|e| {
        e.dest_path
            .iter()
            .chain(std::iter::once(&e.path))
            .find(|p| !is_temp_file(p))
    });

    if let Some(path) = resolved {
        debug!(
            from = %op.primary_path.display(),
            to = %path.display(),
            "Resolved temp path from group events"
        );
        return Some(op.with_primary_path(path.clone()));
    }

    if let Some(base) = extract_base_name(&op.primary_path) {
        debug!(
            from = %op.primary_path.display(),
            to = %base.display(),
            "Resolved temp path from file name"
        );
        return Some(op.with_primary_path(base));
    }

    error!(
        path = %op.primary_path.display(),
        operation = %op.operation_type,
        "Unresolved temp path, rejecting operation"
    );
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
