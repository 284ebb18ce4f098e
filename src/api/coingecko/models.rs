use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::PriceObservation;

/// Response from GET /simple/price: `{ "<coin id>": { "<currency>": price } }`
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// Response from GET /coins/{id}/market_chart/range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketChartResponse {
    /// `[unix_millis, price]` pairs
    pub prices: Vec<(f64, f64)>,
}

/// Error body returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
    pub status: Option<ErrorStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorStatus {
    pub error_code: Option<i32>,
    pub error_message: Option<String>,
}

impl ErrorResponse {
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| self.status.as_ref().and_then(|s| s.error_message.as_deref()))
    }
}

/// Comprehensive error type for API operations
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 401/403, usually a missing or rejected API key
    Unauthorized(String),
    /// 404 Not Found
    NotFound(String),
    /// 429 Too Many Requests
    RateLimited { retry_after: Option<u64> },
    /// 5xx Server Error
    ServerError(u16, String),
    /// Other HTTP errors
    HttpError(u16, String),
    /// Network/request error
    RequestError(String),
    /// Deserialization error
    DeserializationError(String),
    /// Well-formed response without the expected price
    MissingData(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::RateLimited { retry_after } => match retry_after {
                Some(secs) => write!(f, "Rate Limited. Retry after {} s", secs),
                None => write!(f, "Rate Limited"),
            },
            ApiError::ServerError(code, msg) => write!(f, "Server Error ({}): {}", code, msg),
            ApiError::HttpError(code, msg) => write!(f, "HTTP Error ({}): {}", code, msg),
            ApiError::RequestError(msg) => write!(f, "Request Error: {}", msg),
            ApiError::DeserializationError(msg) => write!(f, "Deserialization Error: {}", msg),
            ApiError::MissingData(msg) => write!(f, "Missing Data: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Pick `coin_id`/`currency` out of a simple price response
pub fn parse_simple_price(
    response: &SimplePriceResponse,
    coin_id: &str,
    currency: &str,
) -> Result<Decimal, ApiError> {
    let price = response
        .get(coin_id)
        .and_then(|prices| prices.get(currency))
        .ok_or_else(|| ApiError::MissingData(format!("no {} price for {}", currency, coin_id)))?;

    Decimal::from_f64(*price)
        .ok_or_else(|| ApiError::DeserializationError(format!("price {} is not a finite number", price)))
}

/// Convert `[millis, price]` pairs to observations, skipping unrepresentable entries
pub fn parse_market_chart(response: &MarketChartResponse) -> Vec<PriceObservation> {
    response
        .prices
        .iter()
        .filter_map(|&(millis, price)| {
            let timestamp = Utc.timestamp_millis_opt(millis as i64).single()?;
            let price = Decimal::from_f64(price)?;
            Some(PriceObservation { timestamp, price })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_simple_price() {
        let body = r#"{"the-open-network":{"rub":512.5}}"#;
        let response: SimplePriceResponse = serde_json::from_str(body).unwrap();
        let price = parse_simple_price(&response, "the-open-network", "rub").unwrap();
        assert_eq!(price, Decimal::new(5125, 1));
    }

    #[test]
    fn test_parse_simple_price_missing_currency() {
        let body = r#"{"the-open-network":{"usd":5.1}}"#;
        let response: SimplePriceResponse = serde_json::from_str(body).unwrap();
        let err = parse_simple_price(&response, "the-open-network", "rub").unwrap_err();
        assert!(matches!(err, ApiError::MissingData(_)));
    }

    #[test]
    fn test_parse_market_chart() {
        let body = r#"{"prices":[[1767225600000,400.25],[1769904000000,410.5]],"market_caps":[],"total_volumes":[]}"#;
        let response: MarketChartResponse = serde_json::from_str(body).unwrap();
        let points = parse_market_chart(&response);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp.year(), 2026);
        assert_eq!(points[0].timestamp.month(), 1);
        assert_eq!(points[1].timestamp.month(), 2);
        assert_eq!(points[1].price, Decimal::new(4105, 1));
    }

    #[test]
    fn test_error_response_message() {
        let body = r#"{"status":{"error_code":429,"error_message":"You've exceeded the Rate Limit"}}"#;
        let response: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.message(), Some("You've exceeded the Rate Limit"));

        let body = r#"{"error":"coin not found"}"#;
        let response: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.message(), Some("coin not found"));
    }
}
