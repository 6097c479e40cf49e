//! Streaming detection with debounced emission
//!
//! Events arrive one at a time. The open window is classified as events come
//! in and reported as soon as it means something; otherwise a timer anchored
//! to the window's first event flushes whatever is buffered.

use crate::batch::OperationDetector;
use crate::registry::DetectorRegistry;
use opsense_core::{is_temp_file, DetectorConfig, Error, FileEvent, FileOperation, Result};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Receives each detected operation
pub type OperationCallback = Arc<dyn Fn(FileOperation) + Send + Sync>;

/// Debounced, callback-driven detector for live event feeds
///
/// Expects a single producer. The debounce timer runs on the tokio runtime
/// the detector was built on. Dropping the detector cancels a pending timer
/// without emitting.
pub struct StreamingDetector {
    shared: Arc<Shared>,
}

struct Shared {
    detector: OperationDetector,
    callback: OperationCallback,
    runtime: Handle,
    /// Buffer and timer handle live under one lock
    pending: Mutex<Pending>,
}

#[derive(Default)]
struct Pending {
    /// Buffered events, ascending by timestamp
    events: Vec<FileEvent>,
    /// Earliest buffered timestamp
    anchor: Option<u64>,
    /// When the first buffered event arrived; the timer deadline hangs off this
    anchor_instant: Option<Instant>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every arm and every drain; stale timers compare and bail
    generation: u64,
}

impl Pending {
    fn push(&mut self, event: FileEvent) {
        if self.events.is_empty() {
            self.anchor_instant = Some(Instant::now());
        }
        // A late-arriving earlier event pulls the anchor back; the timer
        // deadline stays tied to the first arrival
        self.anchor = Some(self.anchor.map_or(event.timestamp, |a| a.min(event.timestamp)));

        // Stable insert keeps arrival order among equal timestamps
        let pos = self
            .events
            .partition_point(|e| e.timestamp <= event.timestamp);
        self.events.insert(pos, event);
    }

    /// Whether `timestamp` would stretch the buffer past one window
    fn outside_window(&self, timestamp: u64, window_micros: u64) -> bool {
        let (anchor, last) = match (self.anchor, self.events.last()) {
            (Some(anchor), Some(last)) => (anchor, last.timestamp),
            _ => return false,
        };

        if timestamp >= anchor {
            timestamp - anchor > window_micros
        } else {
            last - timestamp > window_micros
        }
    }

    /// Take the buffered events and disarm the timer
    fn drain(&mut self) -> Vec<FileEvent> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation = self.generation.wrapping_add(1);
        self.anchor = None;
        self.anchor_instant = None;
        std::mem::take(&mut self.events)
    }
}

impl StreamingDetector {
    /// Create a streaming detector on the current tokio runtime
    pub fn new<F>(
        config: DetectorConfig,
        registry: Arc<dyn DetectorRegistry>,
        callback: F,
    ) -> Result<Self>
    where
        F: Fn(FileOperation) + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Self::with_runtime(config, registry, callback, runtime)
    }

    /// Create a streaming detector whose timers run on `runtime`
    pub fn with_runtime<F>(
        config: DetectorConfig,
        registry: Arc<dyn DetectorRegistry>,
        callback: F,
        runtime: Handle,
    ) -> Result<Self>
    where
        F: Fn(FileOperation) + Send + Sync + 'static,
    {
        let detector = OperationDetector::new(config, registry)?;
        Ok(Self {
            shared: Arc::new(Shared {
                detector,
                callback: Arc::new(callback),
                runtime,
                pending: Mutex::new(Pending::default()),
            }),
        })
    }

    /// Feed one event
    ///
    /// Temp file churn is only buffered. Any other event triggers an
    /// analysis of the buffer, and a match is reported right away; without
    /// one the flush timer is (re)armed for the window's original deadline.
    /// An event that would stretch the open window past its width, in
    /// either direction, closes that window first.
    pub fn add_event(&self, event: FileEvent) {
        let shared = &self.shared;
        let mut emitted = Vec::with_capacity(2);

        {
            let mut pending = shared.pending.lock();

            if pending.outside_window(event.timestamp, shared.detector.config().window_micros()) {
                let events = pending.drain();
                debug!(events = events.len(), "Event outside open window, closing it");
                emitted.extend(shared.analyze(&events));
            }

            let temp = is_temp_file(event.effective_path());
            pending.push(event);

            if temp {
                shared.arm_timer(&mut pending);
            } else if let Some(op) = shared.detector.analyze_group(&pending.events) {
                pending.drain();
                emitted.push(op);
            } else {
                shared.arm_timer(&mut pending);
            }
        }

        for op in emitted {
            (shared.callback)(op);
        }
    }

    /// Feed a sequence of events through [`add_event`](Self::add_event)
    pub fn detect_streaming(&self, events: impl IntoIterator<Item = FileEvent>) {
        for event in events {
            self.add_event(event);
        }
    }

    /// Analyze and clear the buffer now, cancelling the timer
    ///
    /// The result is returned to the caller rather than passed to the
    /// callback. Flushing an empty buffer returns nothing.
    pub fn flush(&self) -> Vec<FileOperation> {
        let events = self.shared.pending.lock().drain();
        self.shared.analyze(&events).into_iter().collect()
    }

    /// Number of events waiting in the open window
    pub fn pending_len(&self) -> usize {
        self.shared.pending.lock().events.len()
    }

    pub fn config(&self) -> &DetectorConfig {
        self.shared.detector.config()
    }
}

impl Drop for StreamingDetector {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.pending.lock().timer.take() {
            timer.abort();
        }
    }
}

impl Shared {
    fn analyze(&self, events: &[FileEvent]) -> Option<FileOperation> {
        if events.is_empty() {
            return None;
        }

        let result = self.detector.analyze_group(events);
        if result.is_none() {
            debug!(events = events.len(), "Window produced no operation, dropping");
        }
        result
    }

    /// Replace any armed timer with one firing at the window's deadline
    fn arm_timer(self: &Arc<Self>, pending: &mut Pending) {
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }

        pending.generation = pending.generation.wrapping_add(1);
        let generation = pending.generation;
        let window = Duration::from_millis(self.detector.config().time_window_millis);
        let deadline = pending.anchor_instant.unwrap_or_else(Instant::now) + window;
        let shared: Weak<Shared> = Arc::downgrade(self);

        pending.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(shared) = shared.upgrade() {
                shared.on_timer(generation);
            }
        }));
    }

    fn on_timer(&self, generation: u64) {
        let result = {
            let mut pending = self.pending.lock();
            if pending.generation != generation {
                return;
            }

            // This task is the timer; detach rather than abort it
            pending.timer = None;
            let events = pending.drain();
            self.analyze(&events)
        };

        if let Some(op) = result {
            (self.callback)(op);
        }
    }
}
