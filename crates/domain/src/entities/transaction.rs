//! Transaction payloads served by `/v1/tx/{hash}` and `/v1/mempool/{hash}`.
//!
//! Both endpoints return the same shape; mempool entries simply lack a
//! `height`. Only the height decides anything; every other field is for
//! display and falls back to its default when missing, `null` or of an
//! unexpected type. Unknown fields are kept in [`Transaction::extra`].

use crate::errors::DomainError;
use crate::value_objects::Coin;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient")]
    pub txhash: String,
    /// Block height. `None` while the transaction sits in the mempool.
    #[serde(default, deserialize_with = "deserialize_height")]
    pub height: Option<u64>,
    #[serde(default, rename = "chainId", deserialize_with = "lenient")]
    pub chain_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    /// Non-zero when execution failed.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub code: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub raw_log: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub gas_used: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub gas_wanted: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub tx: Option<StdTx>,
    #[serde(default, deserialize_with = "lenient")]
    pub logs: Option<Vec<TxLog>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StdTx {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub tx_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub value: TxValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxValue {
    #[serde(default, deserialize_with = "lenient")]
    pub fee: Option<Fee>,
    #[serde(default, deserialize_with = "lenient")]
    pub msg: Vec<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Vec<Coin>,
    #[serde(default, deserialize_with = "lenient")]
    pub gas: Option<String>,
}

/// Per-message execution log.
///
/// `log` is an object (`{"tax": "..."}` or `{"message": "..."}`) on most
/// chains but a bare string on some, so it is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxLog {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub msg_index: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub log: Value,
    #[serde(default, deserialize_with = "lenient")]
    pub events: Vec<Value>,
}

impl TxLog {
    /// Tax charged for this message, if any.
    pub fn tax(&self) -> Option<&str> {
        self.log
            .get("tax")
            .and_then(Value::as_str)
            .filter(|tax| !tax.is_empty())
    }

    pub fn message(&self) -> Option<&str> {
        match &self.log {
            Value::String(s) if !s.is_empty() => Some(s.as_str()),
            other => other
                .get("message")
                .and_then(Value::as_str)
                .filter(|msg| !msg.is_empty()),
        }
    }
}

impl Transaction {
    /// Interprets a raw response body.
    ///
    /// `null` and `{}` both mean "no such transaction" and map to `Ok(None)`.
    pub fn from_payload(payload: Value) -> Result<Option<Self>, DomainError> {
        match payload {
            Value::Null => Ok(None),
            Value::Object(ref map) if map.is_empty() => Ok(None),
            other => Ok(Some(serde_json::from_value(other)?)),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.height.is_some()
    }

    pub fn fee_coins(&self) -> &[Coin] {
        self.tx
            .as_ref()
            .and_then(|tx| tx.value.fee.as_ref())
            .map(|fee| fee.amount.as_slice())
            .unwrap_or_default()
    }

    pub fn memo(&self) -> Option<&str> {
        self.tx
            .as_ref()
            .and_then(|tx| tx.value.memo.as_deref())
            .filter(|memo| !memo.is_empty())
    }

    pub fn messages(&self) -> &[Value] {
        self.tx
            .as_ref()
            .map(|tx| tx.value.msg.as_slice())
            .unwrap_or_default()
    }

    pub fn logs(&self) -> &[TxLog] {
        self.logs.as_deref().unwrap_or_default()
    }

    pub fn is_failed(&self) -> bool {
        self.code.is_some_and(|code| code != 0)
    }
}

fn deserialize_height<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    // Height 0 never names a real block; treat it like a missing height.
    Ok(as_u64(&value)
        .map_err(de::Error::custom)?
        .filter(|height| *height != 0))
}

/// Decodes `T`, or `T::default()` when the value does not fit.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_u64(&value).ok().flatten())
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_u64(&value)
        .ok()
        .flatten()
        .and_then(|n| u32::try_from(n).ok()))
}

/// Reads an unsigned integer given as a JSON number or a numeric string.
fn as_u64(value: &Value) -> Result<Option<u64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("expected unsigned integer, got {n}")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("expected numeric string, got {s:?}")),
        other => Err(format!("unexpected value {other}")),
    }
}
