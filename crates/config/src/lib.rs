//! Process configuration for storefront services.
//!
//! Settings come from the environment (optionally seeded from a `.env` file).

pub mod settings;

pub use settings::{
    ConfigError, DEFAULT_CURRENCY, DEFAULT_LOG_FILTER, DEFAULT_WEIGHT_ATTRIBUTE, LogFormat, Settings,
};
