use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use super::Context;
use crate::models::{QuoteOrigin, RateQuote};
use crate::services::rate_service;
use crate::utils::{fmt_money, AppError};

pub async fn execute(ctx: &Context) -> Result<(), AppError> {
    info!("💹 Rate command called");

    let now = Utc::now();
    let quote = rate_service::get_rate(
        &ctx.client,
        ctx.cache.as_ref(),
        ctx.config.rate_ttl,
        now,
        ctx.refresh,
    )
    .await?;

    println!("{}", format_quote(&quote, now));
    Ok(())
}

/// "1 TON = 512.34 RUB", plus where the number came from when it is not live
pub fn format_quote(quote: &RateQuote, now: DateTime<Utc>) -> String {
    let line = format!("1 TON = {} RUB", fmt_money(quote.rate));
    let age = (now - quote.fetched_at).to_std().unwrap_or_default();

    match quote.origin {
        QuoteOrigin::Live => line,
        QuoteOrigin::Cached => format!("{} (cached {} ago)", line, format_age(age)),
        QuoteOrigin::Stale => format!("{} (stale, API unavailable; {} old)", line, format_age(age)),
    }
}

/// Coarse age: "45s", "12m", "3h 5m", "2d 4h"
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}
