//! Cycle timing for the poll loop.
//!
//! The poll task never sleeps on its own; it waits on a [`Ticker`]. In
//! production that is a fixed [`IntervalTicker`]. Tests and embedders that
//! own their own clock use a [`ManualTicker`] and fire cycles explicitly.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::warn;

/// Source of poll cycle ticks.
#[async_trait]
pub trait Ticker: Send {
    /// Waits for the next tick.
    ///
    /// Returns `false` once no more ticks will come, which ends the poll loop.
    async fn tick(&mut self) -> bool;
}

/// Fixed-interval ticker. The first tick fires immediately.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Creates a ticker firing every `period`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period.max(Duration::from_millis(1)));
        // A slow cycle pushes the next one back instead of bursting.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Returns the tick period.
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticker fired by hand through a [`TickTrigger`].
#[derive(Debug)]
pub struct ManualTicker {
    rx: mpsc::Receiver<()>,
}

/// Sending half of a [`ManualTicker`].
#[derive(Debug, Clone)]
pub struct TickTrigger {
    tx: mpsc::Sender<()>,
}

impl ManualTicker {
    /// Creates a ticker and its trigger, buffering up to `buffer` ticks.
    pub fn channel(buffer: usize) -> (TickTrigger, ManualTicker) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (TickTrigger { tx }, ManualTicker { rx })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

impl TickTrigger {
    /// Fires one tick. Returns `false` if the ticker is gone.
    pub async fn tick(&self) -> bool {
        match self.tx.send(()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Ticker dropped, tick ignored");
                false
            }
        }
    }
}
