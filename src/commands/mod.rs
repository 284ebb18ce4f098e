pub mod cache;
pub mod chart;
pub mod convert;
pub mod rate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::api::coingecko::CoinGeckoClient;
use crate::cache::{Cache, FileCache, MemoryCache};
use crate::config::Config;
use crate::models::Direction;
use crate::utils::AppError;

#[derive(Parser, Debug)]
#[command(name = "tonrub", version, about = "TON/RUB rate, converter and monthly chart")]
pub struct Cli {
    /// Fetch from the API even when the cache is fresh
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Keep everything in memory; the cache file is neither read nor written
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show the current rate (default)
    Rate,
    /// Convert TON to RUB
    Ton {
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Convert RUB to TON
    Rub {
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Chart the monthly averages of the current year
    Chart {
        /// Also save the chart as a PNG image
        #[arg(long, value_name = "PATH")]
        png: Option<PathBuf>,
    },
    /// Manage the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CacheAction {
    /// Delete every cached rate and history
    Clear,
}

/// Everything a command needs to run
pub struct Context {
    pub config: Config,
    pub client: CoinGeckoClient,
    pub cache: Box<dyn Cache>,
    /// Backing file of `cache`; `None` when running with `--no-cache`
    pub cache_file: Option<PathBuf>,
    pub refresh: bool,
}

impl Context {
    pub fn new(config: Config, no_cache: bool, refresh: bool) -> Result<Self, AppError> {
        let client = CoinGeckoClient::new(&config)?;
        let (cache, cache_file): (Box<dyn Cache>, Option<PathBuf>) = if no_cache {
            debug!("Cache disabled for this run");
            (Box::new(MemoryCache::new()), None)
        } else {
            let file_cache = FileCache::new(config.cache_file.clone());
            debug!("Using cache file {}", file_cache.path().display());
            let path = file_cache.path().to_path_buf();
            (Box::new(file_cache), Some(path))
        };

        Ok(Self {
            config,
            client,
            cache,
            cache_file,
            refresh,
        })
    }
}

pub async fn handle(ctx: &Context, command: Option<Command>) -> Result<(), AppError> {
    let command = command.unwrap_or(Command::Rate);
    debug!("Running {:?}", command);

    match command {
        Command::Rate => rate::execute(ctx).await,
        Command::Ton { amount } => convert::execute(ctx, &amount, Direction::TonToRub).await,
        Command::Rub { amount } => convert::execute(ctx, &amount, Direction::RubToTon).await,
        Command::Chart { png } => chart::execute(ctx, png.as_deref()).await,
        Command::Cache {
            action: CacheAction::Clear,
        } => cache::clear(ctx),
    }
}
