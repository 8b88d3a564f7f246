//! Data access for the FCD indexing API.
//!
//! This crate provides:
//! - An HTTP client for FCD endpoints
//! - The [`TxSource`] abstraction the poller fetches through
//! - Asset registry lookups and contract-info resolution

/// HTTP client for FCD.
pub mod client;
/// Contract metadata lookup.
pub mod contracts;
/// Error types.
pub mod error;
/// Transaction sources.
pub mod source;

pub use client::{FcdClient, FcdClientConfig};
pub use contracts::{AssetRegistry, AssetsClient, AssetsConfig, ContractInfoResolver, ContractStore, TokenInfo};
pub use error::FetchError;
pub use source::{TxEndpoint, TxSource};
