//! Tracing/logging initialization.

use storefront_config::{LogFormat, Settings};
use tracing_subscriber::EnvFilter;

/// Filter directive: `RUST_LOG` wins, then the configured filter.
pub fn filter_for(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(settings: &Settings) {
    let filter = filter_for(settings);

    let result = match settings.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .with_target(true)
            .try_init(),
    };

    if result.is_ok() {
        ::tracing::debug!(format = ?settings.log_format, "tracing initialised");
    }
}
