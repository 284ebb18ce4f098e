use std::str::FromStr;

use rust_decimal::Decimal;

use crate::models::{ConversionResult, Direction};
use crate::utils::{fmt_decimal, AppError};

/// Decimal places shown for each ticker
pub fn display_precision(ticker: &str) -> u32 {
    match ticker {
        "TON" => 4,
        _ => 2,
    }
}

/// Parse a user-supplied amount.
///
/// Accepts `1.5`, `1,5`, `1 000,50`, `1_000.50` and `1,000.50`. A comma is a
/// decimal separator unless a dot is also present, in which case commas are
/// digit grouping.
pub fn parse_amount(text: &str) -> Result<Decimal, AppError> {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '_' | ' ' | '\u{a0}'))
        .collect();

    if compact.is_empty() {
        return Err(AppError::InvalidAmount("amount is empty".to_string()));
    }

    let normalized = if compact.contains('.') {
        compact.replace(',', "")
    } else {
        compact.replace(',', ".")
    };

    let amount = Decimal::from_str(&normalized)
        .map_err(|_| AppError::InvalidAmount(format!("'{}' is not a number", text.trim())))?;

    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidAmount(format!("amount must be positive, got {}", text.trim())));
    }

    Ok(amount)
}

/// Convert `amount` at `rate` RUB per TON
pub fn convert(amount: Decimal, rate: Decimal, direction: Direction) -> Result<ConversionResult, AppError> {
    if rate <= Decimal::ZERO {
        return Err(AppError::InvalidRate(format!("rate must be positive, got {}", rate)));
    }

    let converted = match direction {
        Direction::TonToRub => amount.checked_mul(rate),
        Direction::RubToTon => amount.checked_div(rate),
    }
    .ok_or_else(|| AppError::InvalidAmount(format!("{} is too large to convert", amount)))?;

    Ok(ConversionResult {
        direction,
        amount,
        converted,
    })
}

/// "10 TON = 5123.40 RUB"
pub fn format_conversion(result: &ConversionResult) -> String {
    let from = result.direction.source_ticker();
    let to = result.direction.target_ticker();
    format!(
        "{} {} = {} {}",
        result.amount.normalize(),
        from,
        fmt_decimal(result.converted, display_precision(to)),
        to
    )
}
