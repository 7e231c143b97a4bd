//! Tracing subscriber initialization
//!
//! Hosts call [`init_tracing`] once at startup. `RUST_LOG` overrides the
//! configured level when present.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Build the default filter directive for a configured level
pub fn filter_directive(level: &str) -> Result<String> {
    let level = level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(Error::Config(format!("Unknown log level: {}", level)));
    }
    Ok(format!("{level},bitquiz_core={level},bitquiz_common={level}"))
}

/// Install the global tracing subscriber
///
/// Returns an error (instead of panicking) if a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let directive = filter_directive(&config.level)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let result = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
        None => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
    };

    result.map_err(|e| Error::Internal(format!("Tracing already initialized: {}", e)))?;

    tracing::info!(
        level = %config.level,
        file = ?config.file,
        "Logging initialized"
    );
    Ok(())
}
