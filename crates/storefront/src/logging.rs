//! Installing the global tracing subscriber.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `RUST_LOG` nor the configuration names one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log to stderr, filtered by `RUST_LOG` when set and by `level` otherwise.
///
/// # Errors
///
/// Returns an error if a global subscriber was already installed.
pub fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}
