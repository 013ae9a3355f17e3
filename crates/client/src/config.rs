//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ARMORY_API_URL` - Base URL of the armory REST API
//!   (default: `http://localhost:8080/api`)
//! - `ARMORY_SESSION_FILE` - Path of the persisted session file
//!   (default: `.armory-session.json`)
//! - `ARMORY_TIMEOUT_SECS` - HTTP request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_SESSION_FILE: &str = ".armory-session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Armory client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// Path of the persisted session file.
    pub session_file: PathBuf,
    /// Request timeout applied to every call.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = normalize_api_url(&get_env_or_default("ARMORY_API_URL", DEFAULT_API_URL));
        let session_file = PathBuf::from(get_env_or_default(
            "ARMORY_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let timeout_secs = match get_optional_env("ARMORY_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("ARMORY_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            session_file,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Strip trailing slashes so endpoint paths can always be joined with `/`.
fn normalize_api_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_api_url_strips_trailing_slash() {
        assert_eq!(
            normalize_api_url("http://localhost:8080/api/"),
            "http://localhost:8080/api"
        );
        assert_eq!(
            normalize_api_url("http://localhost:8080/api"),
            "http://localhost:8080/api"
        );
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.session_file, PathBuf::from(".armory-session.json"));
    }

    #[test]
    fn test_get_env_or_default_falls_back() {
        assert_eq!(
            get_env_or_default("ARMORY_TEST_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
    }
}
