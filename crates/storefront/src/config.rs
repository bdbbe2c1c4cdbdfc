//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CITYFASHION_API_URL` - Base URL of the CityFashion API
//!   (default: `http://localhost:4000`)
//! - `CITYFASHION_STATE_DIR` - Directory for persisted client state
//!   (default: `.cityfashion`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Default API base when none is configured, matching the local dev server.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Default state directory relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".cityfashion";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the CityFashion API, without a trailing slash.
    pub api_base_url: String,
    /// Directory holding the persisted session and cart state.
    pub state_dir: PathBuf,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CITYFASHION_API_URL` is not a valid URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_env_or_default("CITYFASHION_API_URL", DEFAULT_API_URL);
        let api_base_url = normalize_base_url(&api_base_url)?;
        let state_dir = PathBuf::from(get_env_or_default(
            "CITYFASHION_STATE_DIR",
            DEFAULT_STATE_DIR,
        ));

        Ok(Self {
            api_base_url,
            state_dir,
        })
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate a base URL and strip any trailing slash.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("CITYFASHION_API_URL".to_string(), e.to_string()))?;
    Ok(raw.trim_end_matches('/').to_string())
}
