use crate::errors::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Micro-denominated amount as reported by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub raw: u128,
    pub decimals: u8,
}

impl Amount {
    /// Native chain denominations use six decimals.
    pub const NATIVE_DECIMALS: u8 = 6;

    pub fn new(raw: u128, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn native(raw: u128) -> Self {
        Self::new(raw, Self::NATIVE_DECIMALS)
    }

    /// Parses the integer string the API uses for amounts (`"1000000"`).
    pub fn parse(raw: &str, decimals: u8) -> Result<Self, DomainError> {
        let raw = u128::from_str(raw.trim()).map_err(|_| DomainError::InvalidAmount(raw.to_string()))?;
        Ok(Self { raw, decimals })
    }

    pub fn to_decimal(&self) -> Result<Decimal, DomainError> {
        let raw = i128::try_from(self.raw).map_err(|_| DomainError::InvalidAmount(self.raw.to_string()))?;
        Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals))
            .map_err(|_| DomainError::InvalidAmount(self.raw.to_string()))
    }
}
