use std::path::PathBuf;
use std::time::Duration;

use crate::api::coingecko::CoinGeckoClient;
use crate::utils::AppError;

const DEFAULT_RATE_TTL_SECS: u64 = 300;
const DEFAULT_HISTORY_TTL_SECS: u64 = 6 * 60 * 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_RETRIES: u32 = 2;

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub cache_file: PathBuf,
    pub rate_ttl: Duration,
    pub history_ttl: Duration,
    pub http_timeout: Duration,
    /// Retries after a failed request; 0 disables retrying
    pub http_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let seconds = |key: &str, default: u64| -> Result<Duration, AppError> {
            match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| AppError::Config(format!("{} must be a whole number of seconds, got '{}'", key, raw))),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let http_timeout = seconds("TONRUB_HTTP_TIMEOUT", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_timeout.is_zero() {
            return Err(AppError::Config("TONRUB_HTTP_TIMEOUT must be greater than zero".to_string()));
        }

        let http_retries = match get("TONRUB_HTTP_RETRIES") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| AppError::Config(format!("TONRUB_HTTP_RETRIES must be a whole number, got '{}'", raw)))?,
            None => DEFAULT_HTTP_RETRIES,
        };

        let cache_file = match get("TONRUB_CACHE_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_cache_file(get("XDG_CACHE_HOME"), get("HOME")),
        };

        Ok(Self {
            api_url: get("TONRUB_API_URL").unwrap_or_else(|| CoinGeckoClient::DEFAULT_BASE_URL.to_string()),
            api_key: get("TONRUB_API_KEY"),
            cache_file,
            rate_ttl: seconds("TONRUB_RATE_TTL", DEFAULT_RATE_TTL_SECS)?,
            history_ttl: seconds("TONRUB_HISTORY_TTL", DEFAULT_HISTORY_TTL_SECS)?,
            http_timeout,
            http_retries,
        })
    }
}

fn default_cache_file(xdg_cache_home: Option<String>, home: Option<String>) -> PathBuf {
    match (xdg_cache_home, home) {
        (Some(xdg), _) => PathBuf::from(xdg).join("tonrub").join("cache.json"),
        (None, Some(home)) => PathBuf::from(home).join(".cache").join("tonrub").join("cache.json"),
        (None, None) => PathBuf::from(".tonrub-cache.json"),
    }
}
