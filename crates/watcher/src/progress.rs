//! Cosmetic progress counter.

use crate::config::DEFAULT_PROGRESS_STEP;
use tracing::warn;

/// Fraction in `[0, 1)` advanced once per poll cycle, wrapping modulo 1.
///
/// It carries no information about the lookup itself; it only shows that
/// polling is alive.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressAnimator {
    value: f64,
    step: f64,
    wraps: u64,
}

impl ProgressAnimator {
    /// Creates an animator at zero.
    ///
    /// A step outside `(0, 1)` falls back to the default step.
    pub fn new(step: f64) -> Self {
        let step = if step > 0.0 && step < 1.0 {
            step
        } else {
            warn!(step, "Invalid progress step, using default");
            DEFAULT_PROGRESS_STEP
        };
        Self {
            value: 0.0,
            step,
            wraps: 0,
        }
    }

    /// Advances by one step and returns the new value.
    pub fn advance(&mut self) -> f64 {
        let next = self.value + self.step;
        if next >= 1.0 {
            self.wraps += 1;
        }
        self.value = next % 1.0;
        self.value
    }

    /// Current value in `[0, 1)`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Amount added per tick.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// How many times the counter wrapped past 1.
    pub fn wraps(&self) -> u64 {
        self.wraps
    }
}

impl Default for ProgressAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_STEP)
    }
}
