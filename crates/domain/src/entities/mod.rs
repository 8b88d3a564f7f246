pub mod contract;
pub mod token;
pub mod transaction;

// Re-export for easier access
pub use contract::{ContractAsset, ContractLabel, LabelSource, NftAsset};
pub use token::TokenAsset;
pub use transaction::{Fee, StdTx, Transaction, TxLog, TxValue};
