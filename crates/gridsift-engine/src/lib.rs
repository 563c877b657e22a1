//! gridsift extraction engine.
//!
//! Extracts structured tabular records ("issues") from a dynamic,
//! virtualized web application whose DOM is neither stable nor documented:
//! attributes drift between releases, column order shifts, rows render
//! lazily behind scroll and expand interactions, and no paging API exists.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌───────────┐   ┌──────────────┐
//! │ LocatorChain│──►│ LazyLoad    │──►│ Schema    │──►│ RowExtractor │
//! │ (find nav) │   │ Convergence │   │ Inference │   │ + normalize  │
//! └────────────┘   └─────────────┘   └───────────┘   └──────────────┘
//!        driven in fixed order by ExtractionRun::run()
//! ```
//!
//! The engine consumes a [`PageHandle`](gridsift_page::PageHandle) supplied
//! by the hosting application and produces an ordered list of
//! [`IssueRecord`]s. Partial results are always preferred over failure:
//! only loss of the page session aborts a run.
//!
//! ## Failure philosophy
//!
//! Absence, staleness, and per-row trouble are values, not exceptions:
//! locator misses are `None`, stale handles trigger re-resolution, broken
//! rows become [`RowOutcome::Skip`], and an incomplete load loop returns its
//! best observed count with an honest [`LoadOutcome`].

pub mod config;
pub mod convergence;
pub mod error;
pub mod extract;
pub mod locator;
pub mod normalize;
pub mod progress;
pub mod record;
pub mod runner;
pub mod schema;
pub mod targets;

#[cfg(test)]
mod test_support;

pub use config::{EngineConfig, RetryPolicy};
pub use convergence::{LazyLoadConvergence, LoadOutcome, LoadReport, LoadState};
pub use error::EngineError;
pub use extract::{RowExtractor, RowOutcome, SkipReason};
pub use locator::{Action, LocatorChain};
pub use progress::{FnSink, NullSink, ProgressEvent, ProgressSink};
pub use record::{duplicate_title_count, ExtractionReport, IssueRecord};
pub use runner::ExtractionRun;
pub use schema::{Field, SchemaMap};
