//! Tracing/logging setup shared by storefront binaries and test harnesses.

use storefront_config::Settings;

/// Initialize process-wide tracing with default settings.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&Settings::default());
}

/// Initialize process-wide tracing from loaded settings.
pub fn init_with(settings: &Settings) {
    tracing::init(settings);
}

/// Tracing configuration (filters, formats).
pub mod tracing;
