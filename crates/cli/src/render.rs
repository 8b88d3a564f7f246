//! Terminal rendering of poll progress and transaction summaries.

use chrono::{DateTime, Utc};
use prettytable::{Table, row};
use txscope_domain::format::{format_coin, format_date, format_tax, relative_time};
use txscope_domain::value_objects::Coin;
use txscope_domain::{TxStatus, TxSummary};

/// Fixed-width bar for a progress value in `[0, 1)`.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

fn coin_text(coin: &Coin) -> String {
    format_coin(coin).unwrap_or_else(|_| coin.to_string())
}

/// Label/value pairs shown for a transaction, in display order.
pub fn summary_rows(summary: &TxSummary, now: DateTime<Utc>) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Tx Hash".to_string(), summary.txhash.clone()),
        ("Status".to_string(), summary.status.to_string()),
    ];

    if let Some(ts) = summary.timestamp {
        rows.push((
            "Time".to_string(),
            format!("{} ({})", format_date(&ts), relative_time(ts, now)),
        ));
    }

    rows.push((
        "Network".to_string(),
        summary.chain_id.clone().unwrap_or_else(|| "-".to_string()),
    ));

    if let Some(height) = summary.height {
        rows.push(("Block".to_string(), height.to_string()));
    }

    if summary.status == TxStatus::Failed {
        rows.push((
            "Error".to_string(),
            summary
                .failure_message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    if !summary.fees.is_empty() {
        let fees: Vec<String> = summary.fees.iter().map(coin_text).collect();
        rows.push(("Transaction fee".to_string(), fees.join(", ")));
    }

    if !summary.taxes.is_empty() {
        let taxes: Vec<String> = summary
            .taxes
            .iter()
            .flat_map(|tax| format_tax(tax).unwrap_or_else(|_| vec![tax.clone()]))
            .collect();
        rows.push(("Tax".to_string(), taxes.join(", ")));
    }

    if let Some((used, wanted)) = summary.gas {
        rows.push(("Gas (Used/Requested)".to_string(), format!("{used}/{wanted}")));
    }

    rows.push(("Memo".to_string(), summary.memo.clone()));

    for message in &summary.messages {
        let msg_type = message.msg_type.as_deref().unwrap_or("unknown");
        let events = message.log.as_ref().map_or(0, |log| log.events.len());
        rows.push((
            format!("Message #{}", message.index),
            format!("{msg_type} ({events} events)"),
        ));
    }

    rows
}

pub fn summary_table(summary: &TxSummary, now: DateTime<Utc>) -> Table {
    let mut table = Table::new();
    for (label, value) in summary_rows(summary, now) {
        table.add_row(row![label, value]);
    }
    table
}
