use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::error::{CaptureError, PlatformStatus};
use crate::traits::callbacks::{EngineEvent, EngineEventKind, EventCallback};

/// Event callback that acknowledges every engine notification and queues it
/// for the controller thread.
///
/// The controller blocks in [`wait_for`](Self::wait_for) with a bounded
/// timeout instead of sleeping a fixed interval after each asynchronous call.
#[derive(Default)]
pub struct EventSignal {
    queue: Mutex<VecDeque<EngineEvent>>,
    arrived: Condvar,
    received: AtomicU64,
}

impl EventSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total notifications received since creation.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Block until an event of `kind` arrives or `timeout` expires.
    ///
    /// Events of other kinds are consumed and skipped. An `Error` event, or a
    /// matching event carrying a failure status, fails `operation` with
    /// `PipelineStepFailed`.
    pub fn wait_for(
        &self,
        kind: &EngineEventKind,
        operation: &str,
        timeout: Duration,
    ) -> Result<EngineEvent, CaptureError> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.queue.lock();

        loop {
            while let Some(event) = queue.pop_front() {
                if let Some(err) = failure(&event, operation) {
                    return Err(err);
                }
                if &event.kind == kind {
                    return Ok(event);
                }
                log::debug!("skipping '{}' event while waiting for '{}'", event.kind, kind);
            }

            if self.arrived.wait_until(&mut queue, deadline).timed_out() && queue.is_empty() {
                return Err(CaptureError::Timeout(format!("{kind} after {operation}")));
            }
        }
    }

    /// Block for `duration` while watching for failures.
    ///
    /// Returns early with an error if an `Error` event or any event carrying a
    /// failure status arrives before the deadline. Other events are consumed.
    pub fn hold(&self, operation: &str, duration: Duration) -> Result<(), CaptureError> {
        let deadline = Instant::now() + duration;
        let mut queue = self.queue.lock();

        loop {
            while let Some(event) = queue.pop_front() {
                if let Some(err) = failure(&event, operation) {
                    return Err(err);
                }
                log::debug!("'{}' event during {}", event.kind, operation);
            }

            if Instant::now() >= deadline {
                return Ok(());
            }
            self.arrived.wait_until(&mut queue, deadline);
        }
    }
}

/// The error `event` signals for `operation`, if any.
fn failure(event: &EngineEvent, operation: &str) -> Option<CaptureError> {
    if event.kind == EngineEventKind::Error {
        let status = if event.status.is_success() {
            PlatformStatus::FAIL
        } else {
            event.status
        };
        return Some(CaptureError::from_status(operation, status));
    }
    (!event.status.is_success()).then(|| CaptureError::from_status(operation, event.status))
}

impl EventCallback for EventSignal {
    fn on_event(&self, event: &EngineEvent) {
        self.received.fetch_add(1, Ordering::Relaxed);
        if event.status.is_success() {
            log::debug!("engine event: {}", event.kind);
        } else {
            log::warn!("engine event: {} ({})", event.kind, event.status);
        }

        self.queue.lock().push_back(event.clone());
        self.arrived.notify_all();
    }
}
