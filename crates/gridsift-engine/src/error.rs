//! Run-level error taxonomy.
//!
//! Per-locator and per-row trouble never reaches this type: absence is
//! `Option::None`, staleness is retried, and broken rows are skipped with a
//! log line. The only thing a caller can't recover from is losing the page
//! session itself.

use thiserror::Error;
use tracing::debug;

use gridsift_page::PageError;

/// Errors that abort an extraction run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The underlying page session became unusable mid-run.
    #[error("extraction aborted: {0}")]
    Session(#[source] PageError),
}

impl From<PageError> for EngineError {
    fn from(err: PageError) -> Self {
        EngineError::Session(err)
    }
}

/// Absorb a driver error unless it is fatal.
///
/// Non-fatal errors (stale handles, timeouts, script failures) are logged
/// and swallowed so the caller can fall through to its next strategy.
pub(crate) fn absorb(context: &str, err: PageError) -> Result<(), EngineError> {
    if err.is_fatal() {
        return Err(EngineError::Session(err));
    }
    debug!("{context}: absorbed non-fatal page error: {err}");
    Ok(())
}
