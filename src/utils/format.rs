use crossterm::style::{style, Stylize};
use rust_decimal::prelude::*;

use crate::models::Trend;

/// Format with exactly `dp` fractional digits
pub fn fmt_decimal(value: Decimal, dp: u32) -> String {
    format!("{:.prec$}", value.round_dp(dp), prec = dp as usize)
}

/// Two-digit money formatting used across the chart and converter
pub fn fmt_money(value: Decimal) -> String {
    fmt_decimal(value, 2)
}

/// Signed change: "+50.00", "-60.00", "0.00"
pub fn fmt_change(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded.is_zero() {
        fmt_money(Decimal::ZERO)
    } else if rounded.is_sign_positive() {
        format!("+{}", fmt_money(rounded))
    } else {
        fmt_money(rounded)
    }
}

/// Signed percentage, "n/a" when undefined
pub fn fmt_percent(value: Option<Decimal>) -> String {
    match value {
        Some(pct) => format!("{}%", fmt_change(pct)),
        None => "n/a".to_string(),
    }
}

/// Wrap `text` in the ANSI color of `trend`; no trend leaves it plain
pub fn paint(text: &str, trend: Option<Trend>) -> String {
    match trend {
        Some(Trend::Increase) => style(text).green().to_string(),
        Some(Trend::Decrease) => style(text).red().to_string(),
        Some(Trend::Neutral) => style(text).yellow().to_string(),
        None => text.to_string(),
    }
}
