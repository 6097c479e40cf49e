//! notify event ingestion
//!
//! Converts `notify` events into [`FileEvent`]s. The watcher itself lives
//! outside this crate; this is only the translation at the boundary.

use crate::event::{EventKind, FileEvent};
use notify::event::{ModifyKind, RenameMode};
use smallvec::SmallVec;

impl FileEvent {
    /// Translate a notify event observed at `timestamp` (microseconds)
    ///
    /// Paired renames become a single `Moved` event. Unpaired rename halves
    /// are treated as the file leaving (`From`) or entering (`To`) the tree.
    /// Access, metadata-only and unknown kinds produce nothing.
    pub fn from_notify(event: &notify::Event, timestamp: u64) -> SmallVec<[FileEvent; 2]> {
        let kind = match event.kind {
            notify::EventKind::Create(_) => EventKind::Created,
            notify::EventKind::Remove(_) => EventKind::Deleted,
            notify::EventKind::Modify(ModifyKind::Data(_))
            | notify::EventKind::Modify(ModifyKind::Any) => EventKind::Modified,
            notify::EventKind::Modify(ModifyKind::Name(mode)) => {
                return rename_events(mode, &event.paths, timestamp);
            }
            _ => return SmallVec::new(),
        };

        event
            .paths
            .iter()
            .map(|p| FileEvent::new(timestamp, p.clone(), kind))
            .collect()
    }
}

fn rename_events(
    mode: RenameMode,
    paths: &[std::path::PathBuf],
    timestamp: u64,
) -> SmallVec<[FileEvent; 2]> {
    let mut out = SmallVec::new();
    match (mode, paths) {
        (RenameMode::Both, [from, to]) | (RenameMode::Any, [from, to]) => {
            out.push(FileEvent::moved(timestamp, from.clone(), to.clone()));
        }
        (RenameMode::From, _) => {
            out.extend(paths.iter().map(|p| FileEvent::deleted(timestamp, p.clone())));
        }
        (RenameMode::To, _) => {
            out.extend(paths.iter().map(|p| FileEvent::created(timestamp, p.clone())));
        }
        _ => {}
    }
    out
}
