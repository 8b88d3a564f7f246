use crate::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use txscope_domain::Transaction;

/// The two places a transaction can be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxEndpoint {
    /// Indexed ledger (`/v1/tx/{hash}`).
    Confirmed,
    /// Submission pool (`/v1/mempool/{hash}`).
    Pending,
}

impl TxEndpoint {
    /// URL path segments for `hash`, before percent-encoding.
    pub fn segments<'a>(&self, hash: &'a str) -> [&'a str; 3] {
        match self {
            TxEndpoint::Confirmed => ["v1", "tx", hash],
            TxEndpoint::Pending => ["v1", "mempool", hash],
        }
    }
}

impl fmt::Display for TxEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxEndpoint::Confirmed => f.write_str("confirmed"),
            TxEndpoint::Pending => f.write_str("pending"),
        }
    }
}

/// Anything that can look a transaction up by hash.
///
/// `Ok(None)` means the source answered and knows no such transaction.
#[async_trait]
pub trait TxSource: Send + Sync {
    async fn fetch(&self, endpoint: TxEndpoint, hash: &str) -> Result<Option<Transaction>, FetchError>;
}

#[async_trait]
impl<T: TxSource + ?Sized> TxSource for Arc<T> {
    async fn fetch(&self, endpoint: TxEndpoint, hash: &str) -> Result<Option<Transaction>, FetchError> {
        (**self).fetch(endpoint, hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(TxEndpoint::Confirmed.segments("ABC"), ["v1", "tx", "ABC"]);
        assert_eq!(TxEndpoint::Pending.segments("ABC"), ["v1", "mempool", "ABC"]);
    }
}
