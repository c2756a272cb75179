//! Progress reporting.
//!
//! The pipeline reports human-readable progress text to a [`ProgressSink`].
//! Image fan-out stages share one [`Progress`] counter whose total grows as
//! each stage adds its job count, so the `(current/total)` suffix keeps
//! counting across stages.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives progress descriptions. Implementations must not panic.
pub trait ProgressSink: Send + Sync {
    /// Report one progress description.
    fn report(&self, description: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, description: &str) {
        self(description);
    }
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _description: &str) {}
}

/// Running `current/total` counter shared by the fan-out stages of one run.
pub struct Progress<'a, P: ?Sized> {
    sink: &'a P,
    current: AtomicUsize,
    total: AtomicUsize,
}

impl<'a, P: ProgressSink + ?Sized> Progress<'a, P> {
    /// Start counting at `0/0`.
    pub const fn new(sink: &'a P) -> Self {
        Self {
            sink,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// Report a free-form description.
    pub fn say(&self, description: &str) {
        self.sink.report(description);
    }

    /// Grow the total by `jobs`.
    pub fn add_total(&self, jobs: usize) {
        self.total.fetch_add(jobs, Ordering::Relaxed);
    }

    /// Count one completed job without reporting it.
    pub fn tick_quiet(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one completed job and report `"{label}... (current/total)"`.
    pub fn tick(&self, label: &str) {
        self.tick_quiet();
        self.show(label);
    }

    /// Report the counter without changing it.
    pub fn show(&self, label: &str) {
        let (current, total) = self.counts();
        self.sink.report(&format!("{label}... ({current}/{total})"));
    }

    /// Current and total counts.
    pub fn counts(&self) -> (usize, usize) {
        (
            self.current.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}
