//! Core types for the transaction finder.
//!
//! This crate holds everything that does not touch the network:
//! - Transaction payloads as returned by the FCD indexing API
//! - Whitelisted asset and contract metadata
//! - Network presets and environment configuration
//! - Display summaries and formatting helpers

pub mod entities;
pub mod enums;
pub mod errors;
pub mod format;
pub mod network;
pub mod summary;
pub mod value_objects;

pub use entities::transaction::Transaction;
pub use enums::TxStatus;
pub use errors::DomainError;
pub use network::NetworkConfig;
pub use summary::TxSummary;
