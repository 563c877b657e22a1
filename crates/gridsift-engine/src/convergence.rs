//! Lazy-load convergence: drive the page until the data set stops growing.
//!
//! The table virtualizes aggressively: rows render only as scroll,
//! paging keys, "show more" clicks, or page flips provoke them. The loop
//! applies a composite trigger each iteration, counts what rendered, and
//! exits on one of three honest outcomes. It never removes rows, the best
//! observed count is monotonic, and it always terminates within the
//! configured iteration ceiling. Partial results beat failure.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use gridsift_page::{ElementHandle, PageHandle, ScrollTarget};

use crate::config::EngineConfig;
use crate::error::{absorb, EngineError};
use crate::locator::{Action, LocatorChain};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::targets;

/// How the load loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    /// Reached the target estimate (or within 95% of it).
    Satisfied,
    /// Count stopped growing past the stagnation threshold, even after
    /// escalated recovery.
    Stagnant,
    /// Iteration ceiling reached before convergence.
    Exhausted,
}

/// Result of one convergence run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LoadReport {
    /// Best row count observed (monotonic over the run).
    pub rows_loaded: usize,
    /// Iterations performed.
    pub iterations: u32,
    pub outcome: LoadOutcome,
}

/// Transient loop counters. Reset per run, never persisted.
#[derive(Debug, Default, Clone)]
pub struct LoadState {
    pub previous_count: usize,
    pub best_count: usize,
    pub no_change_streak: u32,
    pub iteration: u32,
    pub pages_flipped: u32,
    pub recovery_attempted: bool,
}

impl LoadState {
    /// Record this iteration's count; returns true when it grew.
    fn observe(&mut self, count: usize) -> bool {
        let grew = count > self.previous_count;
        if grew {
            self.no_change_streak = 0;
        } else {
            self.no_change_streak += 1;
        }
        self.previous_count = count;
        self.best_count = self.best_count.max(count);
        grew
    }
}

static CAPTION_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)\)").expect("caption count pattern"));
static OF_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+\s+of\s+(\d+)\b").expect("of-total pattern"));

/// Drives lazy loading to convergence.
pub struct LazyLoadConvergence<'a> {
    page: &'a dyn PageHandle,
    locator: &'a LocatorChain<'a>,
    config: &'a EngineConfig,
    sink: &'a dyn ProgressSink,
}

impl<'a> LazyLoadConvergence<'a> {
    pub fn new(
        page: &'a dyn PageHandle,
        locator: &'a LocatorChain<'a>,
        config: &'a EngineConfig,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            page,
            locator,
            config,
            sink,
        }
    }

    /// Best-effort row-count target.
    ///
    /// Preference order: a caller override, an `Issues (N)` caption, an
    /// `x of N` caption, a bare numeric count badge, and finally a
    /// conservative multiplier over the rows already visible, capped at
    /// the safety ceiling.
    pub async fn probe_target_estimate(&self) -> Result<usize, EngineError> {
        if let Some(target) = self.config.target_override {
            return Ok(target.min(self.config.target_ceiling));
        }

        if let Some(caption) = self.locator.resolve(&targets::COUNT_CAPTION, None).await? {
            match self.page.text(&caption).await {
                Ok(text) => {
                    if let Some(count) = parse_caption_count(&text) {
                        debug!(count, caption = %text, "target from caption");
                        return Ok(count.min(self.config.target_ceiling));
                    }
                }
                Err(err) => absorb("count-caption", err)?,
            }
        }

        let visible = self
            .locator
            .resolve_all(&targets::TABLE_ROWS, None)
            .await?
            .len();
        let estimate = (visible.max(1) * self.config.estimate_multiplier)
            .min(self.config.target_ceiling);
        debug!(visible, estimate, "target estimated from visible rows");
        Ok(estimate)
    }

    /// Run the convergence loop. Always returns the best count observed,
    /// whatever the outcome.
    pub async fn load_all(&self, target_estimate: usize) -> Result<LoadReport, EngineError> {
        let mut state = LoadState::default();
        let config = self.config;

        info!(target_estimate, "starting lazy-load convergence");

        while state.iteration < config.max_scroll_iterations {
            state.iteration += 1;

            self.trigger_load(&state).await?;

            let rows = self.locator.resolve_all(&targets::TABLE_ROWS, None).await?;
            let count = rows.len();
            let grew = state.observe(count);

            self.sink.notify(&ProgressEvent::LoadIteration {
                iteration: state.iteration,
                rows: state.best_count,
            });
            if state.iteration % 10 == 0 {
                debug!(
                    iteration = state.iteration,
                    count, streak = state.no_change_streak, "convergence progress"
                );
            }

            if satisfied(count, target_estimate) {
                return Ok(self.finish(state, LoadOutcome::Satisfied));
            }

            if !grew && state.no_change_streak >= config.pagination_after {
                if self.flip_page(&mut state).await? {
                    continue;
                }
            }

            if state.no_change_streak >= config.stagnation_threshold {
                if !state.recovery_attempted {
                    state.recovery_attempted = true;
                    self.escalated_recovery(rows.last()).await?;
                    continue;
                }
                if state.no_change_streak
                    >= config.stagnation_threshold + config.recovery_grace
                {
                    return Ok(self.finish(state, LoadOutcome::Stagnant));
                }
            }

            sleep(config.adaptive_wait(state.no_change_streak, count)).await;
        }

        Ok(self.finish(state, LoadOutcome::Exhausted))
    }

    /// Composite load trigger: scroll the document, scroll nested
    /// containers, and periodically press a paging key or click a
    /// table-level "show more" control.
    async fn trigger_load(&self, state: &LoadState) -> Result<(), EngineError> {
        if let Err(err) = self.page.scroll_to(ScrollTarget::PageBottom).await {
            absorb("scroll-bottom", err)?;
        }

        let containers = self
            .locator
            .resolve_all(&targets::SCROLL_CONTAINERS, None)
            .await?;
        for container in containers {
            if let Err(err) = self
                .page
                .scroll_to(ScrollTarget::ContainerBottom(container))
                .await
            {
                absorb("scroll-container", err)?;
            }
        }

        if every(state.iteration, self.config.paging_key_interval) {
            if let Err(err) = self.page.press_key("PageDown").await {
                absorb("paging-key", err)?;
            }
        }

        if every(state.iteration, self.config.show_more_interval) {
            self.click_show_more().await?;
        }

        Ok(())
    }

    /// Click a table-level "show more" control if one exists. Controls
    /// nested inside a row are excluded: those expand row content, not
    /// the data set.
    async fn click_show_more(&self) -> Result<bool, EngineError> {
        let candidates = self.locator.resolve_all(&targets::SHOW_MORE, None).await?;
        for candidate in candidates {
            if self
                .locator
                .has_ancestor(&candidate, &targets::ROW_ANCESTOR)
                .await?
            {
                continue;
            }
            match self.page.click(&candidate).await {
                Ok(()) => {
                    debug!("clicked show-more control");
                    return Ok(true);
                }
                Err(err) => absorb("show-more", err)?,
            }
        }
        Ok(false)
    }

    /// Advance a paginated table variant, bounded by the page limit.
    async fn flip_page(&self, state: &mut LoadState) -> Result<bool, EngineError> {
        if state.pages_flipped >= self.config.page_limit {
            return Ok(false);
        }
        let flipped = self
            .locator
            .resolve_and_act(&targets::NEXT_PAGE, Action::Click)
            .await?;
        if flipped {
            state.pages_flipped += 1;
            state.no_change_streak = 0;
            debug!(page = state.pages_flipped + 1, "advanced to next page");
        }
        Ok(flipped)
    }

    /// Last-ditch attempt to provoke rendering: force a re-render through
    /// script and poke the last visible row.
    async fn escalated_recovery(
        &self,
        last_row: Option<&ElementHandle>,
    ) -> Result<(), EngineError> {
        warn!("row count stagnant, attempting escalated recovery");
        if let Err(err) = self.page.evaluate(targets::FORCE_RERENDER, &[]).await {
            absorb("force-rerender", err)?;
        }
        if let Some(row) = last_row {
            if let Err(err) = self
                .page
                .scroll_to(ScrollTarget::IntoView(row.clone()))
                .await
            {
                absorb("recovery-scroll", err)?;
            }
        }
        Ok(())
    }

    fn finish(&self, state: LoadState, outcome: LoadOutcome) -> LoadReport {
        let report = LoadReport {
            rows_loaded: state.best_count,
            iterations: state.iteration,
            outcome,
        };
        info!(
            rows = report.rows_loaded,
            iterations = report.iterations,
            ?outcome,
            "convergence finished"
        );
        self.sink.notify(&ProgressEvent::LoadFinished {
            rows: report.rows_loaded,
            outcome,
        });
        report
    }
}

/// Periodic trigger check; an interval of zero disables the trigger.
fn every(iteration: u32, interval: u32) -> bool {
    interval > 0 && iteration % interval == 0
}

/// Satisfaction test: the full target, or within 95% of it. The tail of a
/// virtualized table is often unreachable without the count being wrong.
fn satisfied(count: usize, target: usize) -> bool {
    target > 0 && (count >= target || count * 100 >= target * 95)
}

/// Parse an authoritative count out of caption text.
fn parse_caption_count(text: &str) -> Option<usize> {
    if let Some(captures) = CAPTION_COUNT.captures(text) {
        return captures[1].parse().ok();
    }
    if let Some(captures) = OF_TOTAL.captures(text) {
        return captures[1].parse().ok();
    }
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse().ok();
    }
    None
}

#[cfg(test)]
#[path = "convergence_tests.rs"]
mod tests;
