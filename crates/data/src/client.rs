//! FCD HTTP client.
//!
//! Thin wrapper over `reqwest` bound to one [`NetworkConfig`]. All paths are
//! relative to the network's FCD base URL.

use crate::error::FetchError;
use crate::source::{TxEndpoint, TxSource};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};
use txscope_domain::{NetworkConfig, Transaction};

const NO_PARAMS: &[(&str, &str)] = &[];

/// Configuration for [`FcdClient`].
#[derive(Debug, Clone)]
pub struct FcdClientConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for FcdClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("txscope/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Client for the FCD REST API of a single network.
#[derive(Debug, Clone)]
pub struct FcdClient {
    http: Client,
    network: NetworkConfig,
}

impl FcdClient {
    /// Creates a client with default settings.
    ///
    /// # Errors
    /// Returns an error if the network's base URL is not a valid URL.
    pub fn new(network: NetworkConfig) -> Result<Self, FetchError> {
        Self::with_config(network, FcdClientConfig::default())
    }

    /// Creates a client with explicit settings.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn with_config(network: NetworkConfig, config: FcdClientConfig) -> Result<Self, FetchError> {
        Url::parse(&network.fcd_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", network.fcd_url)))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self { http, network })
    }

    /// Returns the network this client talks to.
    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Fetches `path` and decodes the JSON body into `T`.
    ///
    /// A 404 or an empty body decodes as JSON `null`, so `T = Option<_>`
    /// maps "not found" to `None`.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or a body
    /// that does not decode into `T`.
    pub async fn get_json<T, P>(&self, path: &str, params: &P) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let (url, body) = self.get_value(self.url_for(path)?, params).await?;
        serde_json::from_value(body.unwrap_or(Value::Null))
            .map_err(|source| FetchError::Decode { url, source })
    }

    /// Looks a transaction up on the confirmed ledger.
    pub async fn fetch_tx(&self, hash: &str) -> Result<Option<Transaction>, FetchError> {
        self.fetch_transaction(TxEndpoint::Confirmed, hash).await
    }

    /// Looks a transaction up in the mempool.
    pub async fn fetch_mempool_tx(&self, hash: &str) -> Result<Option<Transaction>, FetchError> {
        self.fetch_transaction(TxEndpoint::Pending, hash).await
    }

    /// Runs a smart query against a contract's store.
    ///
    /// # Errors
    /// Returns an error if the request fails or `result` does not decode.
    pub async fn query_store<T: DeserializeOwned>(
        &self,
        address: &str,
        query_msg: &Value,
    ) -> Result<T, FetchError> {
        #[derive(serde::Deserialize)]
        struct StoreResponse<T> {
            result: T,
        }

        let query = query_msg.to_string();
        let response: StoreResponse<T> = self
            .get_json(
                &format!("wasm/contracts/{address}/store"),
                &[("query_msg", query.as_str())],
            )
            .await?;
        Ok(response.result)
    }

    async fn fetch_transaction(
        &self,
        endpoint: TxEndpoint,
        hash: &str,
    ) -> Result<Option<Transaction>, FetchError> {
        let (_, body) = self.get_value(self.tx_url(endpoint, hash)?, NO_PARAMS).await?;
        match body {
            Some(payload) => Ok(Transaction::from_payload(payload)?),
            None => Ok(None),
        }
    }

    fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        let raw = self.network.endpoint(path);
        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))
    }

    /// The hash is a single path segment, so `/`, `?` and `#` are escaped.
    fn tx_url(&self, endpoint: TxEndpoint, hash: &str) -> Result<Url, FetchError> {
        let mut url = self.url_for("")?;
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(self.network.fcd_url.clone()))?
            .pop_if_empty()
            .extend(endpoint.segments(hash));
        Ok(url)
    }

    async fn get_value<P>(&self, url: Url, params: &P) -> Result<(String, Option<Value>), FetchError>
    where
        P: Serialize + ?Sized,
    {
        debug!(url = %url, "GET");

        let response = self.http.get(url.clone()).query(params).send().await?;
        let url = url.to_string();
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            trace!(url = %url, "Not found");
            return Ok((url, None));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let body = parse_body(&url, &bytes)?;
        Ok((url, body))
    }
}

/// Decodes a response body; an empty body means "nothing".
fn parse_body(url: &str, bytes: &[u8]) -> Result<Option<Value>, FetchError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
}

#[async_trait]
impl TxSource for FcdClient {
    async fn fetch(&self, endpoint: TxEndpoint, hash: &str) -> Result<Option<Transaction>, FetchError> {
        self.fetch_transaction(endpoint, hash).await
    }
}
