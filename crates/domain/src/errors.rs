use thiserror::Error;

/// Errors raised while interpreting API payloads or configuration.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid coin: {0}")]
    InvalidCoin(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}
