//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_DIR` - Directory holding persisted snapshots (default: `.go-marketplace`)
//! - `CART_STORAGE_NAMESPACE` - Storage key namespace (default: `@GoMarketplace`)
//! - `CART_CURRENCY` - ISO 4217 code used to format prices (default: `BRL`)

use std::path::PathBuf;

use go_marketplace_core::CurrencyCode;
use thiserror::Error;

use crate::snapshot::{self, DEFAULT_NAMESPACE};

const DEFAULT_STORAGE_DIR: &str = ".go-marketplace";
const DEFAULT_CURRENCY: &str = "BRL";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory for the file storage backend
    pub storage_dir: PathBuf,
    /// Namespace prefixed to storage keys
    pub namespace: String,
    /// Currency used to display prices
    pub currency: CurrencyCode,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            namespace: DEFAULT_NAMESPACE.to_string(),
            currency: CurrencyCode::BRL,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_dir = PathBuf::from(
            lookup("CART_STORAGE_DIR").unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string()),
        );

        let namespace =
            lookup("CART_STORAGE_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        if namespace.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_NAMESPACE".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let currency = lookup("CART_CURRENCY")
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_CURRENCY".to_string(), e.to_string()))?;

        Ok(Self {
            storage_dir,
            namespace,
            currency,
        })
    }

    /// Key the cart snapshot is stored under, e.g. `@GoMarketplace:products`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        snapshot::storage_key(&self.namespace)
    }
}
