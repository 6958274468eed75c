//! Logging setup shared by the binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

const DEFAULT_FILTER: &str = "fintrack=debug";

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured filter, which wins over
/// `fintrack=debug`. Calling this twice is harmless; the second call is ignored.
pub fn init(logging: &LoggingConfig) {
    let fallback = logging.filter.as_deref().unwrap_or(DEFAULT_FILTER);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
}
