//! Cache module for storing a single API response to disk
//!
//! This module provides a file-backed cache that persists one JSON value with a
//! fixed TTL (time-to-live). Staleness comes from the file's modification time,
//! and expired data stays readable so callers can decide whether to refetch.

mod timed;

pub use timed::{CacheError, TimedFileCache, DEFAULT_FILE_NAME, DEFAULT_TTL};
