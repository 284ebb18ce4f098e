//! Key-value cache with per-entry timestamps
//!
//! Entries never expire on their own. Callers compare `CacheEntry::age`
//! against their TTL, which also lets them fall back to an expired entry
//! when the price API is unreachable.

pub mod file;
pub mod memory;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileCache;
pub use memory::MemoryCache;

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to access cache file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode cache value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A stored value and the moment it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new<T: Serialize>(value: &T, stored_at: DateTime<Utc>) -> Result<Self, CacheError> {
        Ok(Self {
            value: serde_json::to_value(value)?,
            stored_at,
        })
    }

    /// Time since the entry was written; entries from the future count as fresh
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }

    /// Decode the stored value; `None` if it no longer matches `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.value.clone()).ok()
    }
}

pub trait Cache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;

    /// Drop every entry
    fn clear(&self) -> Result<(), CacheError>;
}
