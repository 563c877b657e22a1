//! Progress reporting.
//!
//! The engine has no idea whether it is running under a console, a GUI, or
//! headless in a scheduler, so it emits events through a sink trait and
//! keeps no reference to any presentation layer.

use crate::convergence::LoadOutcome;

/// Milestones emitted during an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A navigation target was resolved (or confirmed absent).
    NavigationResolved {
        target: &'static str,
        found: bool,
    },
    /// One convergence iteration completed.
    LoadIteration { iteration: u32, rows: usize },
    /// The convergence loop exited.
    LoadFinished { rows: usize, outcome: LoadOutcome },
    /// Column semantics were inferred.
    SchemaInferred { mapped_fields: usize },
    /// Row extraction progress.
    RowsExtracted { done: usize, total: usize },
    /// The run finished.
    Completed { extracted: usize, skipped: usize },
}

/// Observer for [`ProgressEvent`]s.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &ProgressEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _event: &ProgressEvent) {}
}

/// Adapter turning any closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn notify(&self, event: &ProgressEvent) {
        (self.0)(event)
    }
}
