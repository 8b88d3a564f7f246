//! Display summary of a transaction.

use crate::entities::{Transaction, TxLog};
use crate::enums::TxStatus;
use crate::format::parse_timestamp;
use crate::value_objects::Coin;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One message of the transaction together with its execution log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSummary {
    pub index: usize,
    /// Amino type tag such as `bank/MsgSend`; `None` when the message has none.
    pub msg_type: Option<String>,
    pub body: Value,
    pub log: Option<TxLog>,
}

/// Everything the transaction view renders, derived from one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxSummary {
    pub txhash: String,
    pub status: TxStatus,
    pub chain_id: Option<String>,
    pub height: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub failure_message: Option<String>,
    pub fees: Vec<Coin>,
    pub taxes: Vec<String>,
    /// `(used, wanted)`; only known once the transaction is in a block.
    pub gas: Option<(u64, u64)>,
    pub memo: String,
    pub messages: Vec<MessageSummary>,
}

impl TxSummary {
    pub fn from_response(tx: &Transaction) -> Self {
        let status = status_of(tx);

        let failure_message = if tx.is_failed() {
            tx.logs()
                .last()
                .and_then(TxLog::message)
                .map(str::to_string)
                .or_else(|| tx.raw_log.clone().filter(|log| !log.is_empty()))
        } else {
            None
        };

        let taxes = tx
            .logs()
            .iter()
            .filter_map(TxLog::tax)
            .map(str::to_string)
            .collect();

        let gas = match (status, tx.gas_used, tx.gas_wanted) {
            (TxStatus::Pending, _, _) => None,
            (_, Some(used), Some(wanted)) => Some((used, wanted)),
            _ => None,
        };

        let messages = tx
            .messages()
            .iter()
            .enumerate()
            .map(|(index, msg)| MessageSummary {
                index,
                msg_type: msg.get("type").and_then(Value::as_str).map(str::to_string),
                body: msg.get("value").cloned().unwrap_or_else(|| msg.clone()),
                log: tx.logs().get(index).cloned(),
            })
            .collect();

        Self {
            txhash: tx.txhash.clone(),
            status,
            chain_id: tx.chain_id.clone(),
            height: tx.height,
            // An unparseable timestamp is dropped rather than failing the view.
            timestamp: tx.timestamp.as_deref().and_then(|ts| parse_timestamp(ts).ok()),
            failure_message,
            fees: tx.fee_coins().to_vec(),
            taxes,
            gas,
            memo: tx.memo().unwrap_or("-").to_string(),
            messages,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }
}

fn status_of(tx: &Transaction) -> TxStatus {
    if !tx.is_confirmed() {
        TxStatus::Pending
    } else if tx.is_failed() {
        TxStatus::Failed
    } else {
        TxStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(payload: Value) -> Transaction {
        Transaction::from_payload(payload).unwrap().unwrap()
    }

    #[test]
    fn test_success_summary() {
        let summary = TxSummary::from_response(&tx(json!({
            "txhash": "ABC",
            "height": "100",
            "timestamp": "2021-10-01T12:00:00Z",
            "gas_used": "80000",
            "gas_wanted": "100000",
            "tx": { "value": {
                "fee": { "amount": [{ "denom": "uluna", "amount": "5000" }] },
                "msg": [
                    { "type": "bank/MsgSend", "value": { "amount": [] } },
                    { "type": "wasm/MsgExecuteContract", "value": {} }
                ],
                "memo": "hello"
            }},
            "logs": [
                { "msg_index": 0, "log": { "tax": "120uusd" } },
                { "msg_index": 1, "log": { "tax": "" } }
            ]
        })));

        assert_eq!(summary.status, TxStatus::Success);
        assert_eq!(summary.height, Some(100));
        assert_eq!(summary.gas, Some((80_000, 100_000)));
        assert_eq!(summary.fees, vec![Coin::new("5000", "uluna")]);
        assert_eq!(summary.taxes, vec!["120uusd"]);
        assert_eq!(summary.memo, "hello");
        assert_eq!(summary.messages.len(), 2);
        assert_eq!(summary.messages[1].msg_type.as_deref(), Some("wasm/MsgExecuteContract"));
        assert!(summary.messages[1].log.is_some());
        assert!(summary.failure_message.is_none());
        assert!(summary.timestamp.is_some());
    }

    #[test]
    fn test_pending_summary_hides_gas() {
        let summary = TxSummary::from_response(&tx(json!({
            "txhash": "DEF",
            "height": null,
            "gas_used": "1",
            "gas_wanted": "2"
        })));

        assert!(summary.is_pending());
        assert_eq!(summary.gas, None);
        assert_eq!(summary.memo, "-");
    }

    #[test]
    fn test_failed_summary_prefers_last_log_message() {
        let summary = TxSummary::from_response(&tx(json!({
            "height": 7,
            "code": 5,
            "raw_log": "raw failure",
            "logs": [
                { "log": { "message": "first" } },
                { "log": { "message": "insufficient funds" } }
            ]
        })));

        assert_eq!(summary.status, TxStatus::Failed);
        assert_eq!(summary.failure_message.as_deref(), Some("insufficient funds"));
    }

    #[test]
    fn test_failed_summary_falls_back_to_raw_log() {
        let summary = TxSummary::from_response(&tx(json!({
            "height": 7,
            "code": 11,
            "raw_log": "out of gas in location: WritePerByte"
        })));

        assert_eq!(
            summary.failure_message.as_deref(),
            Some("out of gas in location: WritePerByte")
        );
    }
}
