use serde::{Deserialize, Serialize};
use std::fmt;

use super::TokenAsset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAsset {
    pub protocol: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftAsset {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Where a [`ContractLabel`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelSource {
    TokenWhitelist,
    ContractList,
    NftList,
    /// Queried from the contract store (`token_info`).
    TokenInfo,
}

/// Human-readable identity of a contract address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractLabel {
    pub name: String,
    pub symbol: Option<String>,
    pub icon: Option<String>,
    pub source: LabelSource,
}

impl ContractLabel {
    pub fn from_token(token: &TokenAsset) -> Self {
        Self {
            name: token.display_name(),
            symbol: Some(token.symbol.clone()),
            icon: token.icon.clone(),
            source: LabelSource::TokenWhitelist,
        }
    }

    pub fn from_contract(contract: &ContractAsset) -> Self {
        Self {
            name: format!("{} {}", contract.protocol, contract.name),
            symbol: None,
            icon: contract.icon.clone(),
            source: LabelSource::ContractList,
        }
    }

    pub fn from_nft(nft: &NftAsset) -> Self {
        Self {
            name: nft.name.clone(),
            symbol: None,
            icon: nft.icon.clone(),
            source: LabelSource::NftList,
        }
    }

    pub fn from_token_info(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: Some(symbol.into()),
            icon: None,
            source: LabelSource::TokenInfo,
        }
    }
}

impl fmt::Display for ContractLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{} | {}", self.name, symbol),
            None => f.write_str(&self.name),
        }
    }
}
