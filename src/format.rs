//! Display helpers shared by commands and reports. All money is AUD.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime};

use crate::models::parse_date;

/// `1234.5` -> `$1,234.50`, `-5.0` -> `-$5.00`. NaN and infinities show as `$0.00`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0.00".to_string();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = amount < 0.0 && fixed != "0.00";
    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

/// `2024-01-15` -> `15 Jan 2024`. Timestamps are shown by their date part.
/// Anything unparseable is returned unchanged.
pub fn format_date(value: &str) -> String {
    let date = parse_date(value).or_else(|| {
        DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|dt| dt.date_naive())
    });

    match date {
        Some(d) => d.format("%-d %b %Y").to_string(),
        None => value.to_string(),
    }
}

/// `2024-01` -> `January 2024`.
pub fn format_month(month: &str) -> String {
    match NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d") {
        Ok(d) => d.format("%B %Y").to_string(),
        Err(_) => month.to_string(),
    }
}

/// `90` -> `1h 30m`, `120` -> `2h`, `45` -> `45m`.
pub fn format_duration(minutes: u32) -> String {
    let (hours, mins) = (minutes / 60, minutes % 60);
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Start plus duration on a 24h clock; wraps past midnight.
pub fn end_time(start: NaiveTime, minutes: u32) -> NaiveTime {
    start
        .overflowing_add_signed(Duration::minutes(i64::from(minutes)))
        .0
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
