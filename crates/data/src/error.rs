use thiserror::Error;
use txscope_domain::DomainError;

/// Failure of a single request against FCD or the asset registry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Payload(#[from] DomainError),
}
