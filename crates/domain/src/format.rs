//! Text formatting for amounts, denominations and dates.

use crate::errors::DomainError;
use crate::value_objects::{Amount, Coin};
use chrono::{DateTime, Utc};
use rust_decimal::RoundingStrategy;

const DATE_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Formats a micro-denominated integer string with thousands separators.
///
/// `format_amount("1234567890", 6)` yields `"1,234.567890"`.
pub fn format_amount(raw: &str, decimals: u8) -> Result<String, DomainError> {
    let value = Amount::parse(raw, decimals)?
        .to_decimal()?
        .round_dp_with_strategy(u32::from(decimals), RoundingStrategy::ToZero);
    let text = format!("{:.*}", usize::from(decimals), value);

    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let grouped = group_thousands(int_part);
    Ok(match frac_part {
        Some(frac) => format!("{grouped}.{frac}"),
        None => grouped,
    })
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Human name of a denomination.
///
/// `uluna` is `Luna`; other native micro denoms become `<XX>T`
/// (`uusd` → `UST`, `ukrw` → `KRT`). Anything else is returned unchanged.
pub fn format_denom(denom: &str) -> String {
    if denom == "uluna" {
        return "Luna".to_string();
    }

    match denom.strip_prefix('u') {
        Some(rest) if rest.len() == 3 && rest.chars().all(|c| c.is_ascii_lowercase()) => {
            format!("{}T", rest[..2].to_ascii_uppercase())
        }
        _ => denom.to_string(),
    }
}

pub fn format_coin(coin: &Coin) -> Result<String, DomainError> {
    Ok(format!(
        "{} {}",
        format_amount(&coin.amount, Amount::NATIVE_DECIMALS)?,
        format_denom(&coin.denom)
    ))
}

/// Formats a tax log entry, which may list several coins (`"10uluna,2uusd"`).
pub fn format_tax(tax: &str) -> Result<Vec<String>, DomainError> {
    Coin::parse_list(tax)?.iter().map(format_coin).collect()
}

pub fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DomainError::InvalidTimestamp(ts.to_string()))
}

pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format(DATE_FORMAT).to_string()
}

/// Distance between two instants in the largest whole unit, e.g.
/// `"3 minutes ago"` or `"in 2 hours"`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then).num_seconds();
    let secs = delta.unsigned_abs();

    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let (value, unit) = if secs < MINUTE {
        (secs, "second")
    } else if secs < HOUR {
        (rounded(secs, MINUTE), "minute")
    } else if secs < DAY {
        (rounded(secs, HOUR), "hour")
    } else if secs < MONTH {
        (rounded(secs, DAY), "day")
    } else if secs < YEAR {
        (rounded(secs, MONTH), "month")
    } else {
        (rounded(secs, YEAR), "year")
    };

    let plural = if value == 1 { "" } else { "s" };
    if delta >= 0 {
        format!("{value} {unit}{plural} ago")
    } else {
        format!("in {value} {unit}{plural}")
    }
}

fn rounded(secs: u64, unit: u64) -> u64 {
    (secs + unit / 2) / unit
}
