//! Timed file cache for a single JSON value
//!
//! Provides a `TimedFileCache` that persists one serializable value to a JSON
//! file and judges staleness from the file's modification time plus a fixed TTL.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// File name used when no name or path is given
pub const DEFAULT_FILE_NAME: &str = "cache.json";

/// Default time-to-live: one hour
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Unix mode given to a newly created cache file
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Errors that can occur when reading or writing the cache file
#[derive(Debug, Error)]
pub enum CacheError {
    /// No file exists at the cache path
    #[error("Cache file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but does not contain valid JSON for the cached type
    #[error("Failed to parse cache file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the file failed for a reason other than it being absent
    #[error("Failed to read cache file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the file failed
    #[error("Failed to write cache file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The in-memory value could not be encoded as JSON
    #[error("Failed to serialize cache value: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A single value cached in a JSON file with a fixed time-to-live
///
/// Freshness is derived from the file's modification time on every call,
/// so re-saving resets the clock and separate instances pointed at the same
/// path agree on what is on disk. The in-memory `value` only reflects what
/// this instance last `set`.
///
/// # Example
///
/// ```no_run
/// use jsoncache::cache::TimedFileCache;
/// use serde_json::json;
/// use std::time::Duration;
///
/// let mut cache: TimedFileCache = TimedFileCache::new()
///     .with_file_name("products.json")
///     .with_ttl(Duration::from_secs(600));
///
/// let data = if cache.is_expired() {
///     let fresh = json!({"id": 1});
///     cache.set(fresh.clone())?;
///     fresh
/// } else {
///     cache.get()?.unwrap_or_default()
/// };
/// println!("{}", data);
/// # Ok::<(), jsoncache::cache::CacheError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TimedFileCache<T = Value> {
    path: PathBuf,
    ttl: Duration,
    value: Option<T>,
}

impl<T> Default for TimedFileCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimedFileCache<T> {
    /// Creates a cache at `cache.json` in the current working directory with a one hour TTL
    ///
    /// Does not touch the cache file.
    pub fn new() -> Self {
        Self {
            path: in_working_dir(DEFAULT_FILE_NAME),
            ttl: DEFAULT_TTL,
            value: None,
        }
    }

    /// Uses `name` inside the current working directory as the cache file
    pub fn with_file_name(mut self, name: impl AsRef<Path>) -> Self {
        self.path = in_working_dir(name);
        self
    }

    /// Uses `path` as the cache file, overriding any file name
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets how long a saved file stays fresh
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Seeds the in-memory value without writing it
    pub fn with_value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The value last stored in this instance, if any
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns true if a regular file exists at the cache path
    ///
    /// A directory at the path counts as absent, so it is reported expired
    /// and `get` returns `None`.
    pub fn is_valid(&self) -> bool {
        self.path.is_file()
    }

    /// Last modification time of the cache file, or `None` if it is absent
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return None,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %self.path.display(), error = %e, "cannot stat cache file");
                }
                return None;
            }
        };
        metadata.modified().ok().map(DateTime::<Utc>::from)
    }

    /// When the current file goes stale
    ///
    /// `None` if the file is absent or the TTL is too large to represent.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let modified = self.modified_at()?;
        let ttl = ChronoDuration::from_std(self.ttl).ok()?;
        modified.checked_add_signed(ttl)
    }

    /// Returns true if the file is absent or older than the TTL
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Same as [`is_expired`](Self::is_expired), evaluated at `now`
    ///
    /// A file whose expiry equals `now` exactly is still fresh.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let Some(modified) = self.modified_at() else {
            return true;
        };

        // A TTL past the representable range never lapses
        match ChronoDuration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| modified.checked_add_signed(ttl))
        {
            Some(expires_at) => expires_at < now,
            None => false,
        }
    }
}

impl<T: DeserializeOwned> TimedFileCache<T> {
    /// Reads and parses the cache file
    ///
    /// Leaves the in-memory value untouched.
    ///
    /// # Returns
    /// * `Ok(T)` with the decoded value
    /// * `Err(CacheError::NotFound)` if the file does not exist
    /// * `Err(CacheError::Parse)` if the content is not valid JSON for `T`
    pub fn load(&self) -> Result<T, CacheError> {
        let bytes = fs::read(&self.path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => CacheError::NotFound {
                path: self.path.clone(),
            },
            _ => CacheError::Read {
                path: self.path.clone(),
                source,
            },
        })?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "loaded cache file");

        serde_json::from_slice(&bytes).map_err(|source| CacheError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns the cached value, or `None` if there is no cache file
    ///
    /// A present but corrupt file is still an error.
    pub fn get(&self) -> Result<Option<T>, CacheError> {
        if !self.is_valid() {
            return Ok(None);
        }

        match self.load() {
            Ok(value) => Ok(Some(value)),
            // Removed between the existence check and the read
            Err(CacheError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<T: Serialize> TimedFileCache<T> {
    /// Stores `data` in memory and writes it to the cache file
    pub fn set(&mut self, data: T) -> Result<(), CacheError> {
        self.value = Some(data);
        self.save()
    }

    /// Writes the in-memory value to the cache file, replacing its contents
    ///
    /// An empty cache is written as `null`. The data goes to a temporary file
    /// in the same directory which is then renamed over the cache file, so
    /// readers see either the old or the new contents. Concurrent writers are
    /// still last-writer-wins.
    pub fn save(&self) -> Result<(), CacheError> {
        let json = serde_json::to_vec(&self.value).map_err(CacheError::Serialize)?;
        self.write_atomic(&json).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), bytes = json.len(), "saved cache file");
        Ok(())
    }

    fn write_atomic(&self, contents: &[u8]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // The temp file starts out owner-only; carry over the existing mode
        let permissions = match fs::metadata(&self.path) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => new_file_permissions(),
            Err(e) => return Err(e),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        if let Some(permissions) = permissions {
            temp.as_file().set_permissions(permissions)?;
        }
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl<T: Serialize> fmt::Display for TimedFileCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => f.write_str("null"),
            Some(value) => match serde_json::to_string(value) {
                Ok(json) => f.write_str(&json),
                Err(e) => write!(f, "<unserializable: {}>", e),
            },
        }
    }
}

/// Mode for a cache file that does not exist yet
#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// Resolves `name` against the current working directory
///
/// Falls back to the bare name when the working directory is unavailable.
fn in_working_dir(name: impl AsRef<Path>) -> PathBuf {
    let name = name.as_ref();
    match std::env::current_dir() {
        Ok(dir) => dir.join(name),
        Err(_) => name.to_path_buf(),
    }
}
