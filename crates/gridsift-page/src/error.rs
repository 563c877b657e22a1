//! Page-driver error types.

use thiserror::Error;

/// Failures surfaced by a [`PageHandle`](crate::PageHandle) implementation.
///
/// Only [`PageError::SessionLost`] is fatal to an extraction run; everything
/// else is expected turbulence in a re-rendering UI and is absorbed by the
/// engine (re-resolve, retry, or skip).
#[derive(Debug, Error)]
pub enum PageError {
    /// The element handle no longer refers to a live node.
    #[error("stale element handle")]
    Stale,

    /// A bounded wait on the driver expired.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Script evaluation raised in the page context.
    #[error("script error: {0}")]
    Script(String),

    /// The query could not be executed as written.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The underlying automation session is gone.
    #[error("page session lost: {0}")]
    SessionLost(String),
}

impl PageError {
    /// Whether this error makes the whole page handle unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PageError::SessionLost(_))
    }
}
