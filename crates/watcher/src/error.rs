use thiserror::Error;

/// Errors surfaced to callers of the poller.
///
/// Fetch failures never appear here: they are absorbed by the poll loop and
/// retried on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
