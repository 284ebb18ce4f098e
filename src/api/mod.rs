//! Price API access

pub mod coingecko;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::PriceObservation;
use coingecko::ApiError;

/// Anything that can quote TON/RUB prices
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    /// Current price of one TON in RUB
    async fn fetch_rate(&self) -> Result<Decimal, ApiError>;

    /// Raw observations between `from` and `to`, oldest first
    async fn fetch_history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>, ApiError>;
}
