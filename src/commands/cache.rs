use std::path::Path;

use tracing::info;

use super::Context;
use crate::utils::AppError;

pub fn clear(ctx: &Context) -> Result<(), AppError> {
    ctx.cache.clear()?;
    info!("🧹 Cache cleared");
    println!("{}", clear_message(ctx.cache_file.as_deref()));
    Ok(())
}

fn clear_message(cache_file: Option<&Path>) -> String {
    match cache_file {
        Some(path) => format!("Cache cleared ({})", path.display()),
        None => "Cache disabled (--no-cache); nothing on disk was changed".to_string(),
    }
}
