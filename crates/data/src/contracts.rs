//! Contract metadata lookup.
//!
//! Resolution order for an address:
//! 1. Token whitelist
//! 2. NFT contract list
//! 3. Generic contract list
//! 4. `token_info` query against the contract store
//!
//! Registry lists are loaded once per resolver. Any lookup failure resolves to
//! `None`; a missing label is never an error for the caller.

use crate::client::FcdClient;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use txscope_domain::entities::{ContractAsset, ContractLabel, NftAsset, TokenAsset};
use txscope_domain::enums::NetworkKind;

/// Configuration for the asset registry.
#[derive(Debug, Clone)]
pub struct AssetsConfig {
    /// Base URL serving `cw20/*.json` and `cw721/*.json`.
    pub base_url: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://assets.terra.money".to_string(),
        }
    }
}

/// Whitelisted tokens and contracts of one network, keyed by address.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    pub tokens: HashMap<String, TokenAsset>,
    pub contracts: HashMap<String, ContractAsset>,
    pub nfts: HashMap<String, NftAsset>,
}

impl AssetRegistry {
    /// Looks an address up in the whitelists.
    pub fn lookup(&self, address: &str) -> Option<ContractLabel> {
        if let Some(token) = self.tokens.get(address) {
            return Some(ContractLabel::from_token(token));
        }
        if let Some(nft) = self.nfts.get(address) {
            return Some(ContractLabel::from_nft(nft));
        }
        self.contracts.get(address).map(ContractLabel::from_contract)
    }
}

/// Fetches the per-network whitelists.
#[derive(Debug, Clone)]
pub struct AssetsClient {
    http: Client,
    config: AssetsConfig,
}

impl AssetsClient {
    pub fn new(config: AssetsConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Loads all three lists for `network`.
    ///
    /// # Errors
    /// Returns an error if any list cannot be fetched or decoded.
    pub async fn load(&self, network: NetworkKind) -> Result<AssetRegistry, FetchError> {
        let (tokens, contracts, nfts) = tokio::try_join!(
            self.fetch_list::<TokenAsset>("cw20/tokens.json", network),
            self.fetch_list::<ContractAsset>("cw20/contracts.json", network),
            self.fetch_list::<NftAsset>("cw721/contracts.json", network),
        )?;

        debug!(
            network = %network,
            tokens = tokens.len(),
            contracts = contracts.len(),
            nfts = nfts.len(),
            "Loaded asset registry"
        );

        Ok(AssetRegistry {
            tokens,
            contracts,
            nfts,
        })
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        network: NetworkKind,
    ) -> Result<HashMap<String, T>, FetchError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let mut by_network: HashMap<String, HashMap<String, T>> = serde_json::from_slice(&bytes)
            .map_err(|source| FetchError::Decode { url, source })?;
        Ok(by_network.remove(network.as_str()).unwrap_or_default())
    }
}

/// `token_info` response of a CW20 contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub total_supply: Option<String>,
}

/// Source of on-chain contract metadata.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn token_info(&self, address: &str) -> Result<TokenInfo, FetchError>;
}

#[async_trait]
impl ContractStore for FcdClient {
    async fn token_info(&self, address: &str) -> Result<TokenInfo, FetchError> {
        self.query_store(address, &json!({ "token_info": {} })).await
    }
}

/// Resolves contract addresses to display labels.
pub struct ContractInfoResolver<S> {
    store: S,
    network: NetworkKind,
    assets: Option<AssetsClient>,
    registry: OnceCell<AssetRegistry>,
}

impl<S: ContractStore> ContractInfoResolver<S> {
    /// Creates a resolver that loads the registry lazily from `assets`.
    pub fn new(store: S, network: NetworkKind, assets: AssetsClient) -> Self {
        Self {
            store,
            network,
            assets: Some(assets),
            registry: OnceCell::new(),
        }
    }

    /// Creates a resolver over an already loaded registry.
    pub fn with_registry(store: S, network: NetworkKind, registry: AssetRegistry) -> Self {
        Self {
            store,
            network,
            assets: None,
            registry: OnceCell::new_with(Some(registry)),
        }
    }

    /// Resolves `address` to a label, or `None` when nothing is known.
    pub async fn resolve(&self, address: &str) -> Option<ContractLabel> {
        if let Some(label) = self.registry().await.lookup(address) {
            return Some(label);
        }

        match self.store.token_info(address).await {
            Ok(info) => Some(ContractLabel::from_token_info(info.name, info.symbol)),
            Err(e) => {
                debug!(address = %address, error = %e, "No token info for contract");
                None
            }
        }
    }

    async fn registry(&self) -> &AssetRegistry {
        self.registry
            .get_or_init(|| async {
                let Some(assets) = &self.assets else {
                    return AssetRegistry::default();
                };
                match assets.load(self.network).await {
                    Ok(registry) => registry,
                    Err(e) => {
                        warn!(network = %self.network, error = %e, "Failed to load asset registry");
                        AssetRegistry::default()
                    }
                }
            })
            .await
    }
}
