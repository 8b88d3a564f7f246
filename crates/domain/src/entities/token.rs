use serde::{Deserialize, Serialize};

/// Whitelisted CW20 token, as listed in the asset registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAsset {
    pub protocol: String,
    pub symbol: String,
    /// Contract address of the token.
    pub token: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl TokenAsset {
    pub fn new(
        protocol: impl Into<String>,
        symbol: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            symbol: symbol.into(),
            token: token.into(),
            icon: None,
            decimals: None,
        }
    }

    /// Label used by the explorer, e.g. `"Mirror MIR Token"`.
    pub fn display_name(&self) -> String {
        format!("{} {} Token", self.protocol, self.symbol)
    }
}
