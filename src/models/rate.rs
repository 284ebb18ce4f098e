//! Rate and conversion models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Where a quote came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteOrigin {
    /// Fetched from the API during this run
    Live,
    /// Read from a cache entry still within its TTL
    Cached,
    /// Read from an expired cache entry because the API was unreachable
    Stale,
}

/// Current TON price in RUB
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
    pub origin: QuoteOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TonToRub,
    RubToTon,
}

impl Direction {
    pub fn source_ticker(self) -> &'static str {
        match self {
            Direction::TonToRub => "TON",
            Direction::RubToTon => "RUB",
        }
    }

    pub fn target_ticker(self) -> &'static str {
        match self {
            Direction::TonToRub => "RUB",
            Direction::RubToTon => "TON",
        }
    }
}

/// Result of converting an amount at a given rate
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub direction: Direction,
    pub amount: Decimal,
    pub converted: Decimal,
}
