//! Layout budgets bound how many items a single layout pass measures.
//!
//! A budget is driven through a strict cycle:
//!
//! ```text
//! reset()            idle    -> ready
//! begin_layout()     ready   -> running
//! should_layout_next_item()  (running, any number of times)
//! end_layout()       running -> ready
//! ```
//!
//! Work that does not fit in the budget is deferred to the next pass instead of blocking the
//! frame.

use core::time::Duration;

/// Time-slicing gate consulted by the layout driver before measuring each extra item.
pub trait LayoutBudget {
    fn reset(&mut self);
    fn begin_layout(&mut self);
    fn should_layout_next_item(&mut self) -> bool;
    fn end_layout(&mut self);
}

/// Where a budget is in its cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BudgetPhase {
    #[default]
    Idle,
    Ready,
    Running,
}

/// A monotonic clock.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// The threshold used by [`TimeLayoutBudget::default`].
pub const DEFAULT_LAYOUT_BUDGET: Duration = Duration::from_millis(3);

/// Allows measuring items until a fixed amount of time has passed since `begin_layout`.
#[derive(Clone, Debug)]
pub struct TimeLayoutBudget<C> {
    clock: C,
    threshold: Duration,
    started_at: Option<Duration>,
    phase: BudgetPhase,
}

impl<C: Clock> TimeLayoutBudget<C> {
    pub fn new(clock: C, threshold: Duration) -> Self {
        Self {
            clock,
            threshold,
            started_at: None,
            phase: BudgetPhase::Idle,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn phase(&self) -> BudgetPhase {
        self.phase
    }
}

#[cfg(feature = "std")]
impl Default for TimeLayoutBudget<StdClock> {
    fn default() -> Self {
        Self::new(StdClock::default(), DEFAULT_LAYOUT_BUDGET)
    }
}

impl<C: Clock> LayoutBudget for TimeLayoutBudget<C> {
    fn reset(&mut self) {
        self.started_at = None;
        self.phase = BudgetPhase::Ready;
    }

    fn begin_layout(&mut self) {
        check_phase(self.phase, BudgetPhase::Ready, "begin_layout");
        self.started_at = Some(self.clock.now());
        self.phase = BudgetPhase::Running;
    }

    fn should_layout_next_item(&mut self) -> bool {
        let Some(started_at) = self.started_at else {
            check_phase(self.phase, BudgetPhase::Running, "should_layout_next_item");
            return false;
        };
        let elapsed = self.clock.now().saturating_sub(started_at);
        let allowed = elapsed < self.threshold;
        if !allowed {
            vtrace!(elapsed_us = elapsed.as_micros() as u64, "layout budget exhausted");
        }
        allowed
    }

    fn end_layout(&mut self) {
        check_phase(self.phase, BudgetPhase::Running, "end_layout");
        self.started_at = None;
        self.phase = BudgetPhase::Ready;
    }
}

/// Allows a fixed number of measurements per layout pass.
#[derive(Clone, Debug)]
pub struct ItemCountLayoutBudget {
    max_items: usize,
    laid_out: usize,
    phase: BudgetPhase,
}

impl ItemCountLayoutBudget {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            laid_out: 0,
            phase: BudgetPhase::Idle,
        }
    }

    pub fn phase(&self) -> BudgetPhase {
        self.phase
    }
}

impl Default for ItemCountLayoutBudget {
    fn default() -> Self {
        Self::new(64)
    }
}

impl LayoutBudget for ItemCountLayoutBudget {
    fn reset(&mut self) {
        self.laid_out = 0;
        self.phase = BudgetPhase::Ready;
    }

    fn begin_layout(&mut self) {
        check_phase(self.phase, BudgetPhase::Ready, "begin_layout");
        self.laid_out = 0;
        self.phase = BudgetPhase::Running;
    }

    fn should_layout_next_item(&mut self) -> bool {
        if self.phase != BudgetPhase::Running {
            check_phase(self.phase, BudgetPhase::Running, "should_layout_next_item");
            return false;
        }
        if self.laid_out >= self.max_items {
            return false;
        }
        self.laid_out += 1;
        true
    }

    fn end_layout(&mut self) {
        check_phase(self.phase, BudgetPhase::Running, "end_layout");
        self.phase = BudgetPhase::Ready;
    }
}

fn check_phase(actual: BudgetPhase, expected: BudgetPhase, call: &'static str) {
    if actual != expected {
        vwarn!(?actual, ?expected, call, "LayoutBudget: call out of order");
    }
    debug_assert_eq!(
        actual, expected,
        "LayoutBudget::{call} called out of order (phase={actual:?})"
    );
}
