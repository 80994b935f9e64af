use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CURRENCY: &str = "GBP";
pub const DEFAULT_WEIGHT_ATTRIBUTE: &str = "weight";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number, got '{value}'")]
    NotANumber { key: &'static str, value: String },

    #[error("{key} must not be negative, got '{value}'")]
    Negative { key: &'static str, value: String },

    #[error("{key} must be a three-letter currency code, got '{value}'")]
    InvalidCurrency { key: &'static str, value: String },

    #[error("{key} must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { key: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Storefront settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency assigned to stock records submitted without one.
    pub default_currency: String,
    /// Product attribute code the shipping scale reads weights from.
    pub weight_attribute: String,
    /// Weight used when a product has no weight attribute value.
    pub default_weight: Option<f64>,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
            weight_attribute: DEFAULT_WEIGHT_ATTRIBUTE.to_string(),
            default_weight: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if
    /// one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset or blank keys
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut settings = Settings::default();

        if let Some(currency) = get("STOREFRONT_DEFAULT_CURRENCY") {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidCurrency {
                    key: "STOREFRONT_DEFAULT_CURRENCY",
                    value: currency,
                });
            }
            settings.default_currency = currency.to_ascii_uppercase();
        }

        if let Some(code) = get("STOREFRONT_WEIGHT_ATTRIBUTE") {
            settings.weight_attribute = code;
        }

        if let Some(raw) = get("STOREFRONT_DEFAULT_WEIGHT") {
            let weight = raw
                .parse::<f64>()
                .ok()
                .filter(|w| w.is_finite())
                .ok_or_else(|| ConfigError::NotANumber {
                    key: "STOREFRONT_DEFAULT_WEIGHT",
                    value: raw.clone(),
                })?;
            if weight < 0.0 {
                return Err(ConfigError::Negative {
                    key: "STOREFRONT_DEFAULT_WEIGHT",
                    value: raw,
                });
            }
            settings.default_weight = Some(weight);
        }

        if let Some(filter) = get("STOREFRONT_LOG_FILTER") {
            settings.log_filter = filter;
        }

        if let Some(format) = get("STOREFRONT_LOG_FORMAT") {
            settings.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::InvalidLogFormat {
                        key: "STOREFRONT_LOG_FORMAT",
                        value: format,
                    });
                }
            };
        }

        Ok(settings)
    }
}
