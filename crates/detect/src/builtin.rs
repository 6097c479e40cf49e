//! Built-in detectors for common editor and OS save patterns
//!
//! Hosts register these with [`register_builtin`] or pick individual ones
//! from [`builtin_detectors`]. Each detector receives one group of events
//! sorted by timestamp.

use crate::registry::{DetectorEntry, InMemoryRegistry, OPERATION_CATEGORY};
use opsense_core::{is_temp_file, EventKind, FileEvent, FileOperation, OperationType};
use std::path::Path;

/// Detector names and priorities
pub const ATOMIC_SAVE: (&str, i32) = ("atomic-save", 100);
pub const RENAME: (&str, i32) = ("rename", 80);
pub const COPY: (&str, i32) = ("copy", 60);
pub const DELETE: (&str, i32) = ("delete", 40);
pub const CREATE: (&str, i32) = ("create", 30);
pub const MODIFY: (&str, i32) = ("modify", 20);

/// All built-in detectors
pub fn builtin_detectors() -> Vec<DetectorEntry> {
    vec![
        DetectorEntry::new(ATOMIC_SAVE.0, ATOMIC_SAVE.1, detect_atomic_save),
        DetectorEntry::new(RENAME.0, RENAME.1, detect_rename),
        DetectorEntry::new(COPY.0, COPY.1, detect_copy),
        DetectorEntry::new(DELETE.0, DELETE.1, detect_delete),
        DetectorEntry::new(CREATE.0, CREATE.1, detect_create),
        DetectorEntry::new(MODIFY.0, MODIFY.1, detect_modify),
    ]
}

/// Register every built-in detector under the file operation category
pub fn register_builtin(registry: &InMemoryRegistry) {
    for entry in builtin_detectors() {
        registry.register(OPERATION_CATEGORY, entry);
    }
}

/// Save through a staging file
///
/// Two shapes are recognized:
/// - write `tmp`, rename `tmp` -> `target` (gedit, VS Code, most libraries)
/// - rename `target` -> `backup`, create `target` (vim with `backupcopy=no`)
pub fn detect_atomic_save(events: &[FileEvent]) -> anyhow::Result<Option<FileOperation>> {
    for (i, event) in events.iter().enumerate().rev() {
        let dest = match (&event.kind, &event.dest_path) {
            (EventKind::Moved, Some(dest)) => dest,
            _ => continue,
        };

        // Staging file renamed over the target
        if is_temp_file(&event.path) && !is_temp_file(dest) {
            let staged = events[..i].iter().any(|e| {
                e.path == event.path && matches!(e.kind, EventKind::Created | EventKind::Modified)
            });
            let confidence = if staged { 0.97 } else { 0.9 };
            return Ok(Some(op(OperationType::AtomicSave, dest, confidence, events)));
        }

        // Target moved aside to a backup, then recreated
        if !is_temp_file(&event.path) && is_temp_file(dest) {
            let recreated = events[i + 1..]
                .iter()
                .any(|e| e.kind == EventKind::Created && e.path == event.path);
            if recreated {
                return Ok(Some(op(OperationType::AtomicSave, &event.path, 0.95, events)));
            }
        }
    }

    Ok(None)
}

/// Plain rename between two real paths
pub fn detect_rename(events: &[FileEvent]) -> anyhow::Result<Option<FileOperation>> {
    let rename = events.iter().rev().find(|e| {
        e.kind == EventKind::Moved
            && !is_temp_file(&e.path)
            && e.dest_path.as_deref().is_some_and(|d| !is_temp_file(d))
    });

    let rename = match rename {
        Some(rename) => rename,
        None => return Ok(None),
    };

    let dest = rename.effective_path();
    let other_activity = real_events(events).any(|e| !std::ptr::eq(e, rename));
    let confidence = if other_activity { 0.7 } else { 0.95 };

    Ok(Some(op(OperationType::Rename, dest, confidence, events)))
}

/// Directory copy: a created path followed by creations beneath it
pub fn detect_copy(events: &[FileEvent]) -> anyhow::Result<Option<FileOperation>> {
    for (i, root) in events.iter().enumerate() {
        if root.kind != EventKind::Created || is_temp_file(&root.path) {
            continue;
        }

        let nested = events[i + 1..]
            .iter()
            .filter(|e| e.kind == EventKind::Created && e.path != root.path)
            .any(|e| e.path.starts_with(&root.path));

        if nested {
            return Ok(Some(op(OperationType::Copy, &root.path, 0.8, events)));
        }
    }

    Ok(None)
}

/// The group ends with a real path being removed
pub fn detect_delete(events: &[FileEvent]) -> anyhow::Result<Option<FileOperation>> {
    let last = match real_events(events).last() {
        Some(last) if last.kind == EventKind::Deleted => last,
        _ => return Ok(None),
    };

    // Created and removed inside one window: likely scratch output
    let transient = events
        .iter()
        .any(|e| e.kind == EventKind::Created && e.path == last.path);
    let confidence = if transient { 0.6 } else { 0.9 };

    Ok(Some(op(OperationType::Delete, &last.path, confidence, events)))
}

/// A real path appears and is still there at the end of the group
///
/// Scratch files created and removed inside the window are skipped in favor
/// of the first creation that survives.
pub fn detect_create(events: &[FileEvent]) -> anyhow::Result<Option<FileOperation>> {
    let survivor = events.iter().enumerate().find(|(i, e)| {
        e.kind == EventKind::Created
            && !is_temp_file(&e.path)
            && !events[i + 1..]
                .iter()
                .any(|later| later.kind == EventKind::Deleted && later.path == e.path)
    });

    let created = match survivor {
        Some((_, created)) => created,
        None => return Ok(None),
    };

    let modified = events
        .iter()
        .any(|e| e.kind == EventKind::Modified && e.path == created.path);
    let confidence = if modified { 0.75 } else { 0.85 };

    Ok(Some(op(OperationType::Create, &created.path, confidence, events)))
}

/// Only in-place writes to a single real path
pub fn detect_modify(events: &[FileEvent]) -> anyhow::Result<Option<FileOperation>> {
    let mut real = real_events(events);
    let first = match real.next() {
        Some(first) if first.kind == EventKind::Modified => first,
        _ => return Ok(None),
    };

    if real.any(|e| e.kind != EventKind::Modified || e.path != first.path) {
        return Ok(None);
    }

    Ok(Some(op(OperationType::Modify, &first.path, 0.8, events)))
}

/// Events whose paths are all real files
fn real_events(events: &[FileEvent]) -> impl Iterator<Item = &FileEvent> {
    events.iter().filter(|e| e.paths().all(|p| !is_temp_file(p)))
}

fn op(operation_type: OperationType, path: &Path, confidence: f64, events: &[FileEvent]) -> FileOperation {
    FileOperation::new(operation_type, path, confidence, events.to_vec())
}
