//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use txscope_watcher::prelude::*;
//! ```

// Configuration
pub use crate::config::PollerConfig;

// Errors
pub use crate::error::WatchError;

// Handles
pub use crate::handle::{PollHandle, TxWatcher, start};

// Poller
pub use crate::poller::TxPoller;
pub use crate::progress::ProgressAnimator;
pub use crate::state::{PollSnapshot, PollState, SourceState};

// Tickers
pub use crate::ticker::{IntervalTicker, ManualTicker, TickTrigger, Ticker};

// Sources
pub use txscope_data::{TxEndpoint, TxSource};
