//! Transaction status polling.
//!
//! This crate decides whether a transaction hash refers to a confirmed
//! transaction, one still waiting in the mempool, or nothing yet:
//! - Poll state machine reconciling the confirmed and mempool sources
//! - Progress animator ticking in lockstep with poll cycles
//! - Tickers driving the cycles (interval or manual)
//! - Poll task handles with stop, snapshot reads and hash reset

/// Prelude module for convenient imports.
pub mod prelude;

/// Poller configuration.
pub mod config;
/// Error types.
pub mod error;
/// Poll task handles and the watcher owning them.
pub mod handle;
/// Cycle driver over a transaction source.
pub mod poller;
/// Cosmetic progress counter.
pub mod progress;
/// Poll state and reconciliation.
pub mod state;
/// Cycle timing.
pub mod ticker;

pub use config::PollerConfig;
pub use error::WatchError;
pub use handle::{PollHandle, TxWatcher, start};
pub use poller::TxPoller;
pub use progress::ProgressAnimator;
pub use state::{PollSnapshot, PollState, SourceState};
pub use ticker::{IntervalTicker, ManualTicker, TickTrigger, Ticker};
