//! jsoncache - Fetch a JSON document through a flat-file cache
//!
//! Serves the cached copy while it is fresh and refetches it once the file
//! is older than the TTL.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jsoncache::app;
use jsoncache::cli::{Cli, StartupConfig};

/// Installs a stderr log subscriber, honouring `RUST_LOG` when set
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "jsoncache=debug"
    } else {
        "jsoncache=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Renders the value for stdout
fn render(value: &serde_json::Value, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (value, source) = match app::run(&config).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    eprintln!("{}", source);
    match render(&value, config.pretty) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
