use thiserror::Error;

use crate::api::coingecko::ApiError;
use crate::cache::CacheError;

/// Renderer errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("no data to display")]
    NoData,
    #[error("too many samples: {0} (at most 12 months)")]
    TooManySamples(usize),
    #[error("invalid month: {0}")]
    InvalidMonth(u32),
    #[error("months must be strictly increasing (month {0} after {1})")]
    OutOfOrder(u32, u32),
    #[error("failed to draw chart: {0}")]
    Drawing(String),
}

/// Top-level application errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid rate: {0}")]
    InvalidRate(String),
    #[error("price API error: {0}")]
    Api(#[from] ApiError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// Flatten nested "prefix: prefix: message" chains from the HTTP layer into
/// the last meaningful segment for terminal display.
///
/// "price API error: Request Error: Request failed: error sending request"
/// becomes "error sending request" only when `verbose` is off.
pub fn extract_clean_error(error_msg: &str, verbose: bool) -> String {
    if verbose {
        return error_msg.to_string();
    }
    match error_msg.rfind(": ") {
        Some(last_colon) if error_msg.starts_with("price API error:") => {
            error_msg[last_colon + 2..].trim().to_string()
        }
        _ => error_msg.to_string(),
    }
}
