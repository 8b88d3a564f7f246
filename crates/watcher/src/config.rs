use std::time::Duration;

/// Default delay between poll cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Default progress increment per cycle.
pub const DEFAULT_PROGRESS_STEP: f64 = 0.0333;

/// Configuration for the transaction poller.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Delay between poll cycles.
    pub interval: Duration,
    /// Progress increment per cycle, in `(0, 1)`.
    pub progress_step: f64,
    /// Whether a failed confirmed fetch counts as "not found yet" and may
    /// enable the mempool probe.
    pub treat_errors_as_not_found: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            progress_step: DEFAULT_PROGRESS_STEP,
            treat_errors_as_not_found: true,
        }
    }
}

impl PollerConfig {
    /// Sets the cycle interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Keeps fetch errors separate from "not found" answers.
    #[must_use]
    pub fn strict_not_found(mut self) -> Self {
        self.treat_errors_as_not_found = false;
        self
    }
}
