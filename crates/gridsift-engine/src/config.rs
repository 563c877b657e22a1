//! Engine configuration.
//!
//! The engine owns none of this: the hosting application decides timeouts
//! and ceilings and passes the value in. Defaults reflect what the target
//! application family has needed in practice.

use std::time::Duration;

use serde::Deserialize;

/// Bounded retry with exponential backoff for read-then-act races.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Ceiling on any single delay.
    pub max_delay: Duration,
    /// Exponential growth factor.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to apply after a failed attempt (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(delay as u64)
    }
}

/// Tunables for one extraction run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between convergence iterations before stagnation sets in.
    pub settle_delay: Duration,
    /// Hard ceiling on convergence iterations.
    pub max_scroll_iterations: u32,
    /// Consecutive no-growth iterations before escalated recovery.
    pub stagnation_threshold: u32,
    /// Extra no-growth iterations allowed after recovery before giving up.
    pub recovery_grace: u32,
    /// Every Nth iteration, dispatch a paging key.
    pub paging_key_interval: u32,
    /// Every Nth iteration, click a "show more" control if one exists.
    pub show_more_interval: u32,
    /// No-growth iterations before trying a next-page control.
    pub pagination_after: u32,
    /// Pages to walk through a paginated table, at most.
    pub page_limit: u32,
    /// Caller-known row count; skips the count probe when set.
    pub target_override: Option<usize>,
    /// Multiplier over visible rows when no count caption is found.
    pub estimate_multiplier: usize,
    /// Ceiling on any probed or estimated target.
    pub target_ceiling: usize,
    /// Field values longer than this are truncated.
    pub max_field_len: usize,
    /// Backoff for resolve-then-act races.
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(200),
            max_scroll_iterations: 100,
            stagnation_threshold: 25,
            recovery_grace: 3,
            paging_key_interval: 5,
            show_more_interval: 7,
            pagination_after: 5,
            page_limit: 20,
            target_override: None,
            estimate_multiplier: 3,
            target_ceiling: 500,
            max_field_len: 512,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Adaptive inter-iteration wait: short while rows are still arriving,
    /// growing with the stagnation streak, capped at five times the base.
    pub fn adaptive_wait(&self, no_change_streak: u32, rows: usize) -> Duration {
        let base = self.settle_delay.as_millis() as u64;
        let streak_factor = (no_change_streak as u64).min(10) * base / 10;
        let rows_factor = ((rows as u64) / 500).min(2) * base / 2;
        Duration::from_millis((base + streak_factor + rows_factor).min(base * 5))
    }
}
