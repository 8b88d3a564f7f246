//! Network presets.
//!
//! Every network-aware operation takes a [`NetworkConfig`] explicitly; nothing
//! in the workspace resolves the active network from global state.

use crate::enums::NetworkKind;
use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const ENV_NETWORK: &str = "TXSCOPE_NETWORK";
pub const ENV_FCD_URL: &str = "FCD_URL";
pub const ENV_CHAIN_ID: &str = "CHAIN_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub kind: NetworkKind,
    pub chain_id: String,
    /// Base URL of the FCD indexing API, without trailing slash.
    pub fcd_url: String,
}

impl NetworkConfig {
    pub fn new(kind: NetworkKind, chain_id: impl Into<String>, fcd_url: impl Into<String>) -> Self {
        Self {
            kind,
            chain_id: chain_id.into(),
            fcd_url: fcd_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(NetworkKind::Mainnet, "columbus-5", "https://fcd.terra.dev")
    }

    pub fn testnet() -> Self {
        Self::new(NetworkKind::Testnet, "bombay-12", "https://bombay-fcd.terra.dev")
    }

    pub fn localterra() -> Self {
        Self::new(NetworkKind::Localterra, "localterra", "http://localhost:3060")
    }

    pub fn preset(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::Mainnet => Self::mainnet(),
            NetworkKind::Testnet => Self::testnet(),
            NetworkKind::Localterra => Self::localterra(),
        }
    }

    /// Builds a config from the process environment.
    ///
    /// `TXSCOPE_NETWORK` selects the preset (default `mainnet`); `FCD_URL` and
    /// `CHAIN_ID` override the preset's values.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`NetworkConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match lookup(ENV_NETWORK) {
            Some(name) => name.parse()?,
            None => NetworkKind::Mainnet,
        };

        let mut config = Self::preset(kind);
        if let Some(url) = lookup(ENV_FCD_URL).filter(|v| !v.is_empty()) {
            config.fcd_url = url.trim_end_matches('/').to_string();
        }
        if let Some(chain_id) = lookup(ENV_CHAIN_ID).filter(|v| !v.is_empty()) {
            config.chain_id = chain_id;
        }
        Ok(config)
    }

    /// Joins a path onto the FCD base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.fcd_url, path.trim_start_matches('/'))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl FromStr for NetworkKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "columbus-5" => Ok(NetworkKind::Mainnet),
            "testnet" | "bombay-12" => Ok(NetworkKind::Testnet),
            "localterra" | "local" => Ok(NetworkKind::Localterra),
            other => Err(DomainError::UnknownNetwork(other.to_string())),
        }
    }
}
