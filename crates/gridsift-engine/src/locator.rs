//! Locator chains: resolve logical targets despite attribute drift.
//!
//! A chain tries each strategy of a [`QuerySpec`] in priority order and
//! returns the first candidate that is visible and interactable right now.
//! Absence is a value (`None`), not an error; callers decide whether a
//! missing target is fatal or just means the feature is absent in this UI
//! variant.

use tokio::time::sleep;
use tracing::{debug, trace, warn};

use gridsift_page::{ElementHandle, PageHandle, Query, QuerySpec, ScrollTarget};

use crate::config::RetryPolicy;
use crate::error::{absorb, EngineError};

/// Guarded interaction applied after resolution.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    Click,
    TypeText(&'a str),
}

/// Strategy-chain resolver over one page session.
pub struct LocatorChain<'a> {
    page: &'a dyn PageHandle,
    retry: RetryPolicy,
}

impl<'a> LocatorChain<'a> {
    pub fn new(page: &'a dyn PageHandle, retry: RetryPolicy) -> Self {
        Self { page, retry }
    }

    /// First visible, interactable candidate for the spec, or `None` when
    /// every strategy is exhausted. Failed strategies have no side effects;
    /// the script fallback may scroll its candidate into view as a
    /// visibility precondition.
    pub async fn resolve(
        &self,
        spec: &QuerySpec,
        scope: Option<&ElementHandle>,
    ) -> Result<Option<ElementHandle>, EngineError> {
        for strategy in spec.strategies {
            let candidates = match self.page.query(strategy, scope).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    absorb(spec.target, err)?;
                    continue;
                }
            };
            for candidate in candidates {
                if strategy.is_script() {
                    // Scripted matches are found by identity and may sit
                    // outside the viewport; bring them in before judging
                    // visibility.
                    if let Err(err) = self
                        .page
                        .scroll_to(ScrollTarget::IntoView(candidate.clone()))
                        .await
                    {
                        absorb(spec.target, err)?;
                        continue;
                    }
                }
                match self.usable(&candidate).await {
                    Ok(true) => {
                        trace!(logical = spec.target, ?strategy, "resolved");
                        return Ok(Some(candidate));
                    }
                    Ok(false) => continue,
                    Err(err) => {
                        absorb(spec.target, err)?;
                        continue;
                    }
                }
            }
        }
        debug!(logical = spec.target, "all strategies exhausted");
        Ok(None)
    }

    /// Every visible candidate of the first strategy that yields any.
    /// Used for row enumeration, where document order matters.
    pub async fn resolve_all(
        &self,
        spec: &QuerySpec,
        scope: Option<&ElementHandle>,
    ) -> Result<Vec<ElementHandle>, EngineError> {
        for strategy in spec.strategies {
            let candidates = match self.page.query(strategy, scope).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    absorb(spec.target, err)?;
                    continue;
                }
            };
            if candidates.is_empty() {
                continue;
            }
            let mut usable = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                match self.page.is_visible(&candidate).await {
                    Ok(true) => usable.push(candidate),
                    Ok(false) => {}
                    Err(err) => absorb(spec.target, err)?,
                }
            }
            if !usable.is_empty() {
                return Ok(usable);
            }
        }
        Ok(Vec::new())
    }

    /// Resolve and act, re-resolving with backoff when the handle goes
    /// stale between resolution and use, the race inherent to a
    /// re-rendering UI. Returns `false` when the target is absent.
    pub async fn resolve_and_act(
        &self,
        spec: &QuerySpec,
        action: Action<'_>,
    ) -> Result<bool, EngineError> {
        for attempt in 0..self.retry.max_attempts {
            let Some(handle) = self.resolve(spec, None).await? else {
                return Ok(false);
            };
            let outcome = match action {
                Action::Click => self.page.click(&handle).await,
                Action::TypeText(text) => self.page.type_text(&handle, text).await,
            };
            match outcome {
                Ok(()) => return Ok(true),
                Err(err) if err.is_fatal() => return Err(EngineError::Session(err)),
                Err(err) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    debug!(
                        logical = spec.target,
                        attempt,
                        %err,
                        "action failed, re-resolving in {delay:?}"
                    );
                    sleep(delay).await;
                }
            }
        }
        warn!(
            logical = spec.target,
            attempts = self.retry.max_attempts,
            "action retries exhausted"
        );
        Ok(false)
    }

    /// Whether the candidate is currently visible and interactable.
    async fn usable(&self, handle: &ElementHandle) -> Result<bool, gridsift_page::PageError> {
        Ok(self.page.is_visible(handle).await? && self.page.is_interactable(handle).await?)
    }

    /// Whether the handle sits inside an element matching `ancestor`.
    pub async fn has_ancestor(
        &self,
        handle: &ElementHandle,
        ancestor: &Query,
    ) -> Result<bool, EngineError> {
        match self.page.closest(handle, ancestor).await {
            Ok(found) => Ok(found.is_some()),
            Err(err) => {
                absorb("ancestor-test", err)?;
                Ok(false)
            }
        }
    }

    pub fn page(&self) -> &'a dyn PageHandle {
        self.page
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
