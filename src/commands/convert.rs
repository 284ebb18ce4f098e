use chrono::Utc;
use tracing::info;

use super::rate::format_quote;
use super::Context;
use crate::models::Direction;
use crate::services::{convert_service, rate_service};
use crate::utils::AppError;

/// Convert `amount` in the given direction at the current rate. The amount is
/// validated before any network call.
pub async fn execute(ctx: &Context, amount: &str, direction: Direction) -> Result<(), AppError> {
    info!("💱 Convert command called: {} {}", amount, direction.source_ticker());

    let amount = convert_service::parse_amount(amount)?;

    let now = Utc::now();
    let quote = rate_service::get_rate(
        &ctx.client,
        ctx.cache.as_ref(),
        ctx.config.rate_ttl,
        now,
        ctx.refresh,
    )
    .await?;

    let result = convert_service::convert(amount, quote.rate, direction)?;
    println!("{}", convert_service::format_conversion(&result));
    println!("Rate: {}", format_quote(&quote, now));
    Ok(())
}
