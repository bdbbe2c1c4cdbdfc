//! Admin client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CITYFASHION_ADMIN_API_URL` - Base URL of the CityFashion API for
//!   admin calls; falls back to `CITYFASHION_API_URL`, then to
//!   `http://localhost:4000`
//! - `CITYFASHION_STATE_DIR` - Directory for persisted client state
//!   (default: `.cityfashion`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Default API base when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Default state directory relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".cityfashion";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin client configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Base URL of the CityFashion API, without a trailing slash.
    pub api_base_url: String,
    /// Directory holding the persisted admin session.
    pub state_dir: PathBuf,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured base URL is not valid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_api_base_url();
        Url::parse(&api_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CITYFASHION_ADMIN_API_URL".to_string(), e.to_string())
        })?;
        let state_dir = PathBuf::from(
            std::env::var("CITYFASHION_STATE_DIR")
                .unwrap_or_else(|_| DEFAULT_STATE_DIR.to_string()),
        );

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            state_dir,
        })
    }
}

/// Admin URL with fallback to the shared API URL (single-server deploys).
fn get_api_base_url() -> String {
    if let Ok(value) = std::env::var("CITYFASHION_ADMIN_API_URL") {
        return value;
    }
    if let Ok(value) = std::env::var("CITYFASHION_API_URL") {
        return value;
    }
    DEFAULT_API_URL.to_string()
}
