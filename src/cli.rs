//! Command-line interface parsing for jsoncache
//!
//! This module handles parsing of CLI arguments using clap and resolves them
//! into the cache location, TTL, and URL used by the cache-or-fetch flow.

use clap::Parser;
use directories::ProjectDirs;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{DEFAULT_FILE_NAME, DEFAULT_TTL};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The URL could not be parsed or is not http(s)
    #[error("Invalid URL: '{url}' ({reason})")]
    InvalidUrl { url: String, reason: String },

    /// No platform cache directory is available (e.g., no home directory)
    #[error("Could not determine the user cache directory")]
    NoCacheDir,
}

/// jsoncache - Cache a JSON API response to a flat file
#[derive(Parser, Debug)]
#[command(name = "jsoncache")]
#[command(about = "Fetch a JSON document, reusing a cached copy until it expires")]
#[command(version)]
pub struct Cli {
    /// URL of the JSON document to fetch when the cache is expired
    #[arg(value_name = "URL")]
    pub url: String,

    /// Cache file name, resolved in the current directory (or the user cache directory)
    #[arg(long, value_name = "NAME", conflicts_with = "path")]
    pub file: Option<String>,

    /// Full path of the cache file
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Keep the cache file in the platform cache directory (e.g. ~/.cache/jsoncache/)
    #[arg(long, conflicts_with = "path")]
    pub user_cache: bool,

    /// Seconds a cached response stays fresh
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TTL.as_secs())]
    pub ttl: u64,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Log cache and network activity to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration derived from CLI arguments for a single run
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// URL to fetch when the cache is expired
    pub url: String,
    /// Location of the cache file
    pub cache_path: PathBuf,
    /// How long the cache file stays fresh
    pub ttl: Duration,
    /// Whether the cache file's directory should be created before use
    pub create_dir: bool,
    /// Whether to pretty-print the output
    pub pretty: bool,
}

/// Checks that `s` is an absolute http(s) URL.
///
/// # Returns
/// * `Ok(Url)` for a parseable http or https URL
/// * `Err(CliError::InvalidUrl)` otherwise
pub fn parse_url_arg(s: &str) -> Result<Url, CliError> {
    let url = Url::parse(s).map_err(|e| CliError::InvalidUrl {
        url: s.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(CliError::InvalidUrl {
            url: s.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the resolved cache location
    /// * `Err(CliError)` if the URL is invalid or no cache directory exists
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let url = parse_url_arg(&cli.url)?;
        let file_name = cli.file.as_deref().unwrap_or(DEFAULT_FILE_NAME);

        let (cache_path, create_dir) = match (&cli.path, cli.user_cache) {
            (Some(path), _) => (path.clone(), false),
            (None, true) => {
                let project_dirs =
                    ProjectDirs::from("", "", "jsoncache").ok_or(CliError::NoCacheDir)?;
                (project_dirs.cache_dir().join(file_name), true)
            }
            // Relative paths resolve against the working directory at use time
            (None, false) => (PathBuf::from(file_name), false),
        };

        Ok(StartupConfig {
            url: url.to_string(),
            cache_path,
            ttl: Duration::from_secs(cli.ttl),
            create_dir,
            pretty: cli.pretty,
        })
    }
}
