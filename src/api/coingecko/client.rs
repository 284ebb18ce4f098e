use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::{
    parse_market_chart, parse_simple_price, ApiError, ErrorResponse, MarketChartResponse,
    SimplePriceResponse,
};
use crate::api::PriceSource;
use crate::config::Config;
use crate::models::PriceObservation;
use crate::utils::RetryConfig;

/// CoinGecko API client for TON/RUB prices
pub struct CoinGeckoClient {
    http_client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    retry: RetryConfig,
}

impl CoinGeckoClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.coingecko.com/api/v3";
    pub const COIN_ID: &'static str = "the-open-network";
    pub const VS_CURRENCY: &'static str = "rub";
    const API_KEY_HEADER: &'static str = "x-cg-demo-api-key";

    /// Create a client from the runtime configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("tonrub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            retry: retry_policy(config.http_retries),
        })
    }

    /// Create a new client with custom base URL (for testing)
    #[cfg(test)]
    pub fn with_base_url(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::builder().no_proxy().build().unwrap(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::none(),
        }
    }

    fn simple_price_url(&self) -> String {
        format!("{}/simple/price", self.base_url)
    }

    fn market_chart_range_url(&self) -> String {
        format!("{}/coins/{}/market_chart/range", self.base_url, Self::COIN_ID)
    }

    fn create_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ApiError::RequestError(format!("Invalid API key header: {}", e)))?;
            headers.insert(Self::API_KEY_HEADER, value);
        }

        Ok(headers)
    }

    /// Parse error response based on HTTP status code
    async fn handle_error_response(response: reqwest::Response) -> ApiError {
        let status_code = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let body_text = response.text().await.unwrap_or_default();

        error_from_status(status_code, retry_after, body_text)
    }

    /// GET with query parameters, retrying per the configured policy
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let headers = self.create_headers()?;
        let mut attempt: u32 = 0;

        loop {
            debug!("GET {} (attempt {})", url, attempt + 1);
            let result = self
                .http_client
                .get(url)
                .headers(headers.clone())
                .query(query)
                .send()
                .await;

            let (error, retry_hint) = match result {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| ApiError::DeserializationError(format!("Failed to parse response: {}", e)));
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let error = Self::handle_error_response(response).await;
                    if !self.retry.should_retry_status(status) {
                        return Err(error);
                    }
                    let hint = match &error {
                        ApiError::RateLimited { retry_after } => *retry_after,
                        _ => None,
                    };
                    (error, hint)
                }
                Err(e) => {
                    let retryable = e.is_timeout() || e.is_connect() || e.is_request();
                    let error = ApiError::RequestError(format!("Request failed: {}", e));
                    if !retryable {
                        return Err(error);
                    }
                    (error, None)
                }
            };

            if attempt >= self.retry.max_retries {
                return Err(error);
            }

            let delay = self.retry.delay_with_hint(attempt, retry_hint);
            warn!("{} - retrying in {}ms", error, delay.as_millis());
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// GET /simple/price
    ///
    /// Current price of one TON in RUB.
    pub async fn get_rate(&self) -> Result<Decimal, ApiError> {
        let query = [
            ("ids", Self::COIN_ID.to_string()),
            ("vs_currencies", Self::VS_CURRENCY.to_string()),
        ];
        let response: SimplePriceResponse = self.get_json(&self.simple_price_url(), &query).await?;
        parse_simple_price(&response, Self::COIN_ID, Self::VS_CURRENCY)
    }

    /// GET /coins/{id}/market_chart/range
    ///
    /// Raw price observations between `from` and `to`. The API picks the
    /// granularity (hourly up to 90 days, daily beyond).
    pub async fn get_history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>, ApiError> {
        let query = [
            ("vs_currency", Self::VS_CURRENCY.to_string()),
            ("from", from.timestamp().to_string()),
            ("to", to.timestamp().to_string()),
        ];
        let response: MarketChartResponse = self.get_json(&self.market_chart_range_url(), &query).await?;
        Ok(parse_market_chart(&response))
    }
}

impl PriceSource for CoinGeckoClient {
    async fn fetch_rate(&self) -> Result<Decimal, ApiError> {
        self.get_rate().await
    }

    async fn fetch_history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PriceObservation>, ApiError> {
        self.get_history(from, to).await
    }
}

/// Retry policy for `TONRUB_HTTP_RETRIES`
fn retry_policy(retries: u32) -> RetryConfig {
    match retries {
        0 => RetryConfig::none(),
        n => RetryConfig {
            max_retries: n,
            ..RetryConfig::default()
        },
    }
}

/// Map a non-success status and its body to an `ApiError`
pub(crate) fn error_from_status(status_code: u16, retry_after: Option<u64>, body_text: String) -> ApiError {
    let message = serde_json::from_str::<ErrorResponse>(&body_text)
        .ok()
        .and_then(|err| err.message().map(str::to_string))
        .unwrap_or(body_text);

    match status_code {
        400 => ApiError::BadRequest(message),
        401 | 403 => ApiError::Unauthorized(message),
        404 => ApiError::NotFound(message),
        429 => {
            warn!("Rate limited, retry after {:?} s", retry_after);
            ApiError::RateLimited { retry_after }
        }
        500..=599 => {
            warn!("Server error {}: {}", status_code, message);
            ApiError::ServerError(status_code, message)
        }
        _ => ApiError::HttpError(status_code, message),
    }
}
