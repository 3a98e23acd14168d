//! Logging setup for the command line runner

use anyhow::{anyhow, Result};
use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise the engine logs at `info` with
/// `--verbose` and at `warn` without it. Output goes to stderr so the JSON
/// report on stdout stays clean.
pub fn init(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { Level::INFO } else { Level::WARN };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let registry = Registry::default().with(env_filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .try_init()
    };

    result.map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
