use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use crate::ir::{Edge, Point};

#[derive(Debug, Clone)]
pub enum BundleEvent {
    /// Sent after every completed iteration.
    Progress { iteration: usize, cycle: usize },
    /// Sent once, after the last cycle of a run that was not cancelled.
    Finished { nodes: Vec<Point>, edges: Vec<Edge> },
}

/// Receives run notifications. Implementations must not block the run.
pub trait EventSink {
    fn emit(&self, event: BundleEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: BundleEvent) {}
}

impl EventSink for Sender<BundleEvent> {
    fn emit(&self, event: BundleEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(BundleEvent),
{
    fn emit(&self, event: BundleEvent) {
        (self.0)(event)
    }
}

/// Cooperative cancellation flag shared between a run and its host.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
