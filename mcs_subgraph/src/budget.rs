//! Soft step budgets shared by the backtracking phases.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use mcs_common::Config;

/// Counts search steps against an optional limit.
///
/// Each phase owns one budget. Exhaustion is sticky: once a phase has run
/// out it keeps reporting so until the budget is dropped, which lets deep
/// recursion unwind without re-checking the limit at every level.
#[derive(Debug)]
pub struct StepBudget {
    limit: Option<u64>,
    used: AtomicU64,
    exhausted: AtomicBool,
}

impl StepBudget {
    /// A budget of `limit` steps, or unbounded.
    #[must_use]
    pub const fn new(limit: Option<u64>) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// A budget with no limit.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(None)
    }

    /// The per-phase budget configured in `config`.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.step_budget)
    }

    /// Records one step. Returns false once the limit has been passed.
    pub fn tick(&self) -> bool {
        if self.exhausted.load(Ordering::Relaxed) {
            return false;
        }
        let used = self.used.fetch_add(1, Ordering::Relaxed) + 1;
        match self.limit {
            Some(limit) if used > limit => {
                self.exhausted.store(true, Ordering::Relaxed);
                false
            }
            _ => true,
        }
    }

    /// True once [`tick`](Self::tick) has refused a step.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }

    /// Steps recorded so far.
    #[must_use]
    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Relaxed)
    }
}

impl Default for StepBudget {
    fn default() -> Self {
        Self::unbounded()
    }
}
