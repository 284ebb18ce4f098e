use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::api::PriceSource;
use crate::cache::{Cache, CacheEntry};
use crate::models::{QuoteOrigin, RateQuote};
use crate::utils::AppError;

pub const RATE_CACHE_KEY: &str = "rate:ton-rub";

/// Last stored rate and when it was written; unreadable entries count as a miss
fn read_cached_rate<C: Cache + ?Sized>(cache: &C) -> Option<(Decimal, CacheEntry)> {
    match cache.get(RATE_CACHE_KEY) {
        Ok(Some(entry)) => match entry.decode::<Decimal>() {
            Some(rate) if rate > Decimal::ZERO => Some((rate, entry)),
            _ => {
                warn!("Ignoring unusable cached rate: {}", entry.value);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read rate cache: {}", e);
            None
        }
    }
}

async fn fetch_valid_rate<S: PriceSource>(source: &S) -> Result<Decimal, AppError> {
    let rate = source.fetch_rate().await?;
    if rate <= Decimal::ZERO {
        return Err(AppError::InvalidRate(format!("API returned non-positive rate {}", rate)));
    }
    Ok(rate)
}

/// Current TON/RUB rate.
///
/// A cached rate younger than `ttl` is returned as is unless `refresh` is
/// set. Otherwise the rate is fetched and cached. When fetching fails, any
/// cached rate is returned as `Stale`; with nothing cached the error
/// propagates.
pub async fn get_rate<S: PriceSource, C: Cache + ?Sized>(
    source: &S,
    cache: &C,
    ttl: Duration,
    now: DateTime<Utc>,
    refresh: bool,
) -> Result<RateQuote, AppError> {
    let cached = read_cached_rate(cache);

    if !refresh {
        if let Some((rate, entry)) = &cached {
            if entry.is_fresh(ttl, now) {
                debug!("Using cached rate {} ({}s old)", rate, entry.age(now).as_secs());
                return Ok(RateQuote {
                    rate: *rate,
                    fetched_at: entry.stored_at,
                    origin: QuoteOrigin::Cached,
                });
            }
        }
    }

    match fetch_valid_rate(source).await {
        Ok(rate) => {
            info!("Fetched TON/RUB rate {}", rate);
            match CacheEntry::new(&rate, now) {
                Ok(entry) => {
                    if let Err(e) = cache.put(RATE_CACHE_KEY, entry) {
                        warn!("Failed to cache rate: {}", e);
                    }
                }
                Err(e) => warn!("Failed to encode rate for cache: {}", e),
            }
            Ok(RateQuote {
                rate,
                fetched_at: now,
                origin: QuoteOrigin::Live,
            })
        }
        Err(e) => match cached {
            Some((rate, entry)) => {
                warn!(
                    "Rate fetch failed ({}), using cached rate from {}s ago",
                    e,
                    entry.age(now).as_secs()
                );
                Ok(RateQuote {
                    rate,
                    fetched_at: entry.stored_at,
                    origin: QuoteOrigin::Stale,
                })
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::coingecko::ApiError;
    use crate::cache::MemoryCache;
    use crate::models::PriceObservation;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted price source that counts its calls
    pub(crate) struct FakeSource {
        pub rate: Result<Decimal, ApiError>,
        pub history: Result<Vec<PriceObservation>, ApiError>,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn with_rate(rate: Result<Decimal, ApiError>) -> Self {
            Self {
                rate,
                history: Ok(vec![]),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_history(history: Result<Vec<PriceObservation>, ApiError>) -> Self {
            Self {
                rate: Ok(Decimal::ONE),
                history,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PriceSource for FakeSource {
        async fn fetch_rate(&self) -> Result<Decimal, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rate.clone()
        }

        async fn fetch_history(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<PriceObservation>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.history.clone()
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    fn offline() -> Result<Decimal, ApiError> {
        Err(ApiError::RequestError("connection refused".to_string()))
    }

    fn seed(cache: &MemoryCache, rate: i64, stored_at: DateTime<Utc>) {
        cache
            .put(RATE_CACHE_KEY, CacheEntry::new(&Decimal::from(rate), stored_at).unwrap())
            .unwrap();
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let source = FakeSource::with_rate(Ok(Decimal::new(51234, 2)));
        let cache = MemoryCache::new();
        let now = Utc::now();

        let quote = get_rate(&source, &cache, TTL, now, false).await.unwrap();
        assert_eq!(quote.rate, Decimal::new(51234, 2));
        assert_eq!(quote.origin, QuoteOrigin::Live);
        assert_eq!(source.calls(), 1);

        let stored = cache.get(RATE_CACHE_KEY).unwrap().unwrap();
        assert_eq!(stored.decode::<Decimal>(), Some(Decimal::new(51234, 2)));
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_fetch() {
        let source = FakeSource::with_rate(Ok(Decimal::from(999)));
        let cache = MemoryCache::new();
        let now = Utc::now();
        seed(&cache, 500, now - ChronoDuration::seconds(60));

        let quote = get_rate(&source, &cache, TTL, now, false).await.unwrap();
        assert_eq!(quote.rate, Decimal::from(500));
        assert_eq!(quote.origin, QuoteOrigin::Cached);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_ignores_fresh_entry() {
        let source = FakeSource::with_rate(Ok(Decimal::from(999)));
        let cache = MemoryCache::new();
        let now = Utc::now();
        seed(&cache, 500, now - ChronoDuration::seconds(60));

        let quote = get_rate(&source, &cache, TTL, now, true).await.unwrap();
        assert_eq!(quote.rate, Decimal::from(999));
        assert_eq!(quote.origin, QuoteOrigin::Live);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let source = FakeSource::with_rate(Ok(Decimal::from(510)));
        let cache = MemoryCache::new();
        let now = Utc::now();
        seed(&cache, 500, now - ChronoDuration::seconds(301));

        let quote = get_rate(&source, &cache, TTL, now, false).await.unwrap();
        assert_eq!(quote.rate, Decimal::from(510));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_stale() {
        let source = FakeSource::with_rate(offline());
        let cache = MemoryCache::new();
        let now = Utc::now();
        let stored_at = now - ChronoDuration::hours(3);
        seed(&cache, 480, stored_at);

        let quote = get_rate(&source, &cache, TTL, now, false).await.unwrap();
        assert_eq!(quote.rate, Decimal::from(480));
        assert_eq!(quote.origin, QuoteOrigin::Stale);
        assert_eq!(quote.fetched_at, stored_at);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_cache_is_error() {
        let source = FakeSource::with_rate(offline());
        let cache = MemoryCache::new();

        let err = get_rate(&source, &cache, TTL, Utc::now(), false).await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::RequestError(_))));
    }

    #[tokio::test]
    async fn test_non_positive_rate_rejected() {
        let source = FakeSource::with_rate(Ok(Decimal::ZERO));
        let cache = MemoryCache::new();

        let err = get_rate(&source, &cache, TTL, Utc::now(), false).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRate(_)));
        assert_eq!(cache.get(RATE_CACHE_KEY).unwrap(), None);
    }
}
