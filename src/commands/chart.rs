use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};

use super::rate::format_quote;
use super::Context;
use crate::services::{chart_service, history_service, plot_service, rate_service};
use crate::utils::AppError;

pub async fn execute(ctx: &Context, png: Option<&Path>) -> Result<(), AppError> {
    info!("📈 Chart command called");

    let now = Utc::now();
    let cache = ctx.cache.as_ref();
    let (rate, history) = tokio::join!(
        rate_service::get_rate(&ctx.client, cache, ctx.config.rate_ttl, now, ctx.refresh),
        history_service::get_year_history(&ctx.client, cache, ctx.config.history_ttl, now, ctx.refresh),
    );

    let input = history?;

    // The chart stands on its own; a missing current rate only drops the header
    match rate {
        Ok(quote) => println!("Current rate: {}\n", format_quote(&quote, now)),
        Err(e) => warn!("Current rate unavailable: {}", e),
    }

    print!("{}", chart_service::render_chart(&input));

    if let Some(path) = png {
        plot_service::render_png(&input, path, plot_service::DEFAULT_WIDTH, plot_service::DEFAULT_HEIGHT)?;
        info!("Chart image written to {}", path.display());
        println!("\nChart saved to {}", path.display());
    }

    Ok(())
}
