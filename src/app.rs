//! Cache-or-fetch flow
//!
//! Checks the file cache, and only when it has expired calls out for fresh
//! data and stores it. This is the consumer side of `TimedFileCache`: the
//! cache never fetches on its own.

use serde_json::Value;
use std::fmt;
use std::fs;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CacheError, TimedFileCache};
use crate::cli::StartupConfig;
use crate::fetch::{FetchError, JsonFetcher};

/// Errors surfaced by the command-line flow
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The directory holding the cache file could not be created
    #[error("Failed to create cache directory {}: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where a returned value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Read from a fresh cache file
    Cached,
    /// Fetched because the cache was expired or missing
    Fetched,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Cached => f.write_str("Cache is valid"),
            Source::Fetched => f.write_str("Cache is expired"),
        }
    }
}

/// Returns the cached value if fresh, otherwise fetches and stores a new one
///
/// # Arguments
/// * `cache` - The cache to read from and write to
/// * `fetch` - Called at most once, only when fresh data is needed
///
/// # Returns
/// * `Ok((value, source))` with the data and whether it was fetched
/// * `Err(AppError)` if reading, fetching, or saving fails
pub async fn load_or_fetch<F, Fut>(
    cache: &mut TimedFileCache,
    fetch: F,
) -> Result<(Value, Source), AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, FetchError>>,
{
    if !cache.is_expired() {
        if let Some(value) = cache.get()? {
            debug!(path = %cache.path().display(), "serving from cache");
            return Ok((value, Source::Cached));
        }
        // File disappeared after the freshness check
    }

    info!(path = %cache.path().display(), "cache expired, fetching");
    let value = fetch().await?;
    cache.set(value.clone())?;
    Ok((value, Source::Fetched))
}

/// Runs the flow described by `config` against the network
pub async fn run(config: &StartupConfig) -> Result<(Value, Source), AppError> {
    if let Some(dir) = config.cache_path.parent() {
        if config.create_dir && !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| AppError::CacheDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
    }

    let mut cache: TimedFileCache = TimedFileCache::new()
        .with_path(&config.cache_path)
        .with_ttl(config.ttl);
    let fetcher = JsonFetcher::new()?;

    load_or_fetch(&mut cache, || fetcher.fetch(&config.url)).await
}
