use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single `{ denom, amount }` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    /// Parses a comma-joined coin list such as `"1000uluna,20uusd"`.
    pub fn parse_list(s: &str) -> Result<Vec<Coin>, DomainError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Coin::from_str)
            .collect()
    }
}

impl FromStr for Coin {
    type Err = DomainError;

    /// Parses the SDK string form `<amount><denom>`, e.g. `"1000uluna"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| DomainError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() || denom.is_empty() {
            return Err(DomainError::InvalidCoin(s.to_string()));
        }
        Ok(Coin::new(amount, denom))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        let coin: Coin = "1000uluna".parse().unwrap();
        assert_eq!(coin, Coin::new("1000", "uluna"));
    }

    #[test]
    fn test_parse_list() {
        let coins = Coin::parse_list("1000uluna, 20uusd").unwrap();
        assert_eq!(coins, vec![Coin::new("1000", "uluna"), Coin::new("20", "uusd")]);
    }

    #[test]
    fn test_parse_ibc_denom() {
        let coin: Coin = "5ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2"
            .parse()
            .unwrap();
        assert_eq!(coin.amount, "5");
        assert!(coin.denom.starts_with("ibc/"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("uluna".parse::<Coin>().is_err());
        assert!("1000".parse::<Coin>().is_err());
    }
}
