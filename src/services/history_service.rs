use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::api::PriceSource;
use crate::cache::{Cache, CacheEntry};
use crate::models::{ChartInput, PriceObservation, PriceSample};
use crate::utils::AppError;

pub fn history_cache_key(year: i32) -> String {
    format!("history:ton-rub:{}", year)
}

/// Average the observations of `year` per calendar month (UTC), oldest month
/// first. Non-positive prices are dropped.
pub fn monthly_averages(observations: &[PriceObservation], year: i32) -> Vec<PriceSample> {
    let mut buckets: BTreeMap<u32, (Decimal, u32)> = BTreeMap::new();
    let mut dropped = 0usize;

    for obs in observations.iter().filter(|o| o.timestamp.year() == year) {
        if obs.price <= Decimal::ZERO {
            dropped += 1;
            continue;
        }
        let bucket = buckets.entry(obs.timestamp.month()).or_insert((Decimal::ZERO, 0));
        bucket.0 += obs.price;
        bucket.1 += 1;
    }

    if dropped > 0 {
        warn!("Dropped {} non-positive price observations", dropped);
    }

    buckets
        .into_iter()
        .map(|(month, (sum, count))| PriceSample::new(month, sum / Decimal::from(count)))
        .collect()
}

fn read_cached_history<C: Cache + ?Sized>(cache: &C, year: i32) -> Option<(ChartInput, CacheEntry)> {
    let entry = match cache.get(&history_cache_key(year)) {
        Ok(entry) => entry?,
        Err(e) => {
            warn!("Failed to read history cache: {}", e);
            return None;
        }
    };

    let samples = entry.decode::<Vec<PriceSample>>()?;
    match ChartInput::new(year, samples) {
        Ok(input) => Some((input, entry)),
        Err(e) => {
            warn!("Ignoring cached history for {}: {}", year, e);
            None
        }
    }
}

async fn fetch_year<S: PriceSource>(
    source: &S,
    year: i32,
    now: DateTime<Utc>,
) -> Result<ChartInput, AppError> {
    let start = Utc
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::Config(format!("cannot build start of year {}", year)))?;

    let observations = source.fetch_history(start, now).await?;
    debug!("Fetched {} observations since {}", observations.len(), start);

    Ok(ChartInput::new(year, monthly_averages(&observations, year))?)
}

/// Monthly averages for the current year up to `now`.
///
/// Same caching rules as the rate: fresh entries are reused unless
/// `refresh`, and an expired entry stands in when the fetch fails.
pub async fn get_year_history<S: PriceSource, C: Cache + ?Sized>(
    source: &S,
    cache: &C,
    ttl: Duration,
    now: DateTime<Utc>,
    refresh: bool,
) -> Result<ChartInput, AppError> {
    let year = now.year();
    let cached = read_cached_history(cache, year);

    if !refresh {
        if let Some((input, entry)) = &cached {
            if entry.is_fresh(ttl, now) {
                debug!("Using cached history for {} ({}s old)", year, entry.age(now).as_secs());
                return Ok(input.clone());
            }
        }
    }

    match fetch_year(source, year, now).await {
        Ok(input) => {
            info!("Aggregated {} months of {} prices", input.month_count(), year);
            match CacheEntry::new(&input.samples(), now) {
                Ok(entry) => {
                    if let Err(e) = cache.put(&history_cache_key(year), entry) {
                        warn!("Failed to cache history: {}", e);
                    }
                }
                Err(e) => warn!("Failed to encode history for cache: {}", e),
            }
            Ok(input)
        }
        Err(e) => match cached {
            Some((input, entry)) => {
                warn!(
                    "History fetch failed ({}), using cached data from {}s ago",
                    e,
                    entry.age(now).as_secs()
                );
                Ok(input)
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::coingecko::ApiError;
    use crate::cache::MemoryCache;
    use crate::services::rate_service::tests::FakeSource;
    use crate::utils::ChartError;
    use chrono::Duration as ChronoDuration;

    const TTL: Duration = Duration::from_secs(3600);

    fn obs(year: i32, month: u32, day: u32, price: i64) -> PriceObservation {
        PriceObservation {
            timestamp: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
            price: Decimal::from(price),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_monthly_averages_buckets_by_month() {
        let observations = vec![
            obs(2026, 1, 5, 100),
            obs(2026, 1, 20, 200),
            obs(2026, 2, 1, 150),
            obs(2026, 4, 3, 90),
            obs(2026, 4, 10, 91),
        ];
        let samples = monthly_averages(&observations, 2026);
        assert_eq!(
            samples,
            vec![
                PriceSample::new(1, Decimal::from(150)),
                PriceSample::new(2, Decimal::from(150)),
                PriceSample::new(4, Decimal::new(905, 1)),
            ]
        );
    }

    #[test]
    fn test_monthly_averages_ignores_other_years_and_bad_prices() {
        let observations = vec![
            obs(2025, 12, 31, 10),
            obs(2026, 3, 1, 0),
            obs(2026, 3, 2, -5),
            obs(2026, 3, 3, 40),
        ];
        let samples = monthly_averages(&observations, 2026);
        assert_eq!(samples, vec![PriceSample::new(3, Decimal::from(40))]);
    }

    #[test]
    fn test_monthly_averages_empty() {
        assert!(monthly_averages(&[], 2026).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_aggregates_and_caches() {
        let source = FakeSource::with_history(Ok(vec![obs(2026, 1, 2, 300), obs(2026, 3, 2, 330)]));
        let cache = MemoryCache::new();

        let input = get_year_history(&source, &cache, TTL, now(), false).await.unwrap();
        assert_eq!(input.year(), 2026);
        assert_eq!(input.samples().len(), 2);

        let stored = cache.get(&history_cache_key(2026)).unwrap().unwrap();
        assert_eq!(stored.decode::<Vec<PriceSample>>().unwrap(), input.samples().to_vec());
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let source = FakeSource::with_history(Ok(vec![obs(2026, 1, 2, 999)]));
        let cache = MemoryCache::new();
        let samples = vec![PriceSample::new(1, Decimal::from(300))];
        cache
            .put(
                &history_cache_key(2026),
                CacheEntry::new(&samples, now() - ChronoDuration::minutes(10)).unwrap(),
            )
            .unwrap();

        let input = get_year_history(&source, &cache, TTL, now(), false).await.unwrap();
        assert_eq!(input.samples(), samples.as_slice());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_observations_is_no_data() {
        let source = FakeSource::with_history(Ok(vec![]));
        let cache = MemoryCache::new();

        let err = get_year_history(&source, &cache, TTL, now(), false).await.unwrap_err();
        assert!(matches!(err, AppError::Chart(ChartError::NoData)));
        assert_eq!(cache.get(&history_cache_key(2026)).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_uses_stale_history() {
        let source = FakeSource::with_history(Err(ApiError::ServerError(503, "down".to_string())));
        let cache = MemoryCache::new();
        let samples = vec![PriceSample::new(1, Decimal::from(300)), PriceSample::new(2, Decimal::from(310))];
        cache
            .put(
                &history_cache_key(2026),
                CacheEntry::new(&samples, now() - ChronoDuration::days(2)).unwrap(),
            )
            .unwrap();

        let input = get_year_history(&source, &cache, TTL, now(), false).await.unwrap();
        assert_eq!(input.samples(), samples.as_slice());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_last_years_cache_is_not_used() {
        let source = FakeSource::with_history(Err(ApiError::ServerError(503, "down".to_string())));
        let cache = MemoryCache::new();
        cache
            .put(
                &history_cache_key(2025),
                CacheEntry::new(&vec![PriceSample::new(12, Decimal::from(300))], now()).unwrap(),
            )
            .unwrap();

        let err = get_year_history(&source, &cache, TTL, now(), false).await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::ServerError(503, _))));
    }
}
