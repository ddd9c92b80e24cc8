//! jsoncache library
//!
//! A flat-file cache for a single JSON value with a fixed time-to-live, plus
//! the fetch flow and CLI types used by the `jsoncache` binary.

pub mod app;
pub mod cache;
pub mod cli;
pub mod fetch;

pub use cache::{CacheError, TimedFileCache};
