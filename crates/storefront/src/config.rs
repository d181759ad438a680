//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QKART_BACKEND_URL` - Base URL of the backend REST API (e.g. `http://localhost:8082/api/v1`)
//!
//! ## Optional
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search debounce interval (default: 500)
//! - `QKART_HTTP_TIMEOUT_SECS` - Transport timeout for backend calls (default: none)
//! - `QKART_USERNAME` - Signed-in user name (requires `QKART_TOKEN`)
//! - `QKART_TOKEN` - Bearer token issued at login (requires `QKART_USERNAME`)
//! - `QKART_BALANCE` - Wallet balance reported at login (requires a session)

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::search::DEFAULT_DEBOUNCE;
use crate::session::Session;

const BACKEND_URL: &str = "QKART_BACKEND_URL";
const SEARCH_DEBOUNCE_MS: &str = "QKART_SEARCH_DEBOUNCE_MS";
const HTTP_TIMEOUT_SECS: &str = "QKART_HTTP_TIMEOUT_SECS";
const USERNAME: &str = "QKART_USERNAME";
const TOKEN: &str = "QKART_TOKEN";
const BALANCE: &str = "QKART_BALANCE";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend connection settings
    pub backend: BackendConfig,
    /// Quiet period before a search is sent
    pub search_debounce: Duration,
    /// Session supplied by the environment, if any
    pub session: Option<Session>,
}

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL; always ends with `/` so endpoint paths join under it
    pub base_url: Url,
    /// Transport timeout for a single request
    pub timeout: Option<Duration>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(&get_required(&lookup, BACKEND_URL)?)?;

        let timeout = lookup(HTTP_TIMEOUT_SECS)
            .map(|value| parse_u64(HTTP_TIMEOUT_SECS, &value))
            .transpose()?
            .map(Duration::from_secs);

        let search_debounce = lookup(SEARCH_DEBOUNCE_MS)
            .map(|value| parse_u64(SEARCH_DEBOUNCE_MS, &value))
            .transpose()?
            .map_or(DEFAULT_DEBOUNCE, Duration::from_millis);

        let session = match (lookup(USERNAME), lookup(TOKEN)) {
            (Some(username), Some(token)) => {
                Some(Session::new(username, SecretString::from(token)))
            }
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar(TOKEN.to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar(USERNAME.to_string())),
        };

        let session = match (session, lookup(BALANCE)) {
            (Some(session), Some(value)) => Some(session.with_balance(parse_balance(&value)?)),
            (None, Some(_)) => {
                return Err(ConfigError::InvalidEnvVar(
                    BALANCE.to_string(),
                    format!("requires {USERNAME} and {TOKEN}"),
                ));
            }
            (session, None) => session,
        };

        Ok(Self {
            backend: BackendConfig { base_url, timeout },
            search_debounce,
            session,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_balance(value: &str) -> Result<Decimal, ConfigError> {
    let balance = value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(BALANCE.to_string(), e.to_string()))?;
    if balance.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            BALANCE.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(balance)
}

/// Parse the backend URL, requiring http(s) and a trailing `/`.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(BACKEND_URL.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            BACKEND_URL.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_backend_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == BACKEND_URL));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[(BACKEND_URL, "http://localhost:8082/api/v1")]).unwrap();

        assert_eq!(
            config.backend.base_url.as_str(),
            "http://localhost:8082/api/v1/"
        );
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert!(config.backend.timeout.is_none());
        assert!(config.session.is_none());
    }

    #[test]
    fn test_trailing_slash_is_kept() {
        let config = load(&[(BACKEND_URL, "https://shop.example/")]).unwrap();
        assert_eq!(config.backend.base_url.as_str(), "https://shop.example/");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = load(&[(BACKEND_URL, "ftp://shop.example")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (BACKEND_URL, "http://localhost:8082"),
            (SEARCH_DEBOUNCE_MS, "250"),
            (HTTP_TIMEOUT_SECS, "10"),
        ])
        .unwrap();

        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.backend.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_invalid_debounce() {
        let err = load(&[
            (BACKEND_URL, "http://localhost:8082"),
            (SEARCH_DEBOUNCE_MS, "soon"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == SEARCH_DEBOUNCE_MS));
    }

    #[test]
    fn test_session_from_env() {
        let config = load(&[
            (BACKEND_URL, "http://localhost:8082"),
            (USERNAME, "crio-user"),
            (TOKEN, "eyJhbGciOiJIUzI1NiJ9.e30.sig"),
        ])
        .unwrap();

        let session = config.session.unwrap();
        assert_eq!(session.username(), "crio-user");
        assert_eq!(
            session.token().expose_secret(),
            "eyJhbGciOiJIUzI1NiJ9.e30.sig"
        );
    }

    #[test]
    fn test_balance_attaches_to_session() {
        let config = load(&[
            (BACKEND_URL, "http://localhost:8082"),
            (USERNAME, "crio-user"),
            (TOKEN, "abc"),
            (BALANCE, "4750.50"),
        ])
        .unwrap();

        assert_eq!(
            config.session.unwrap().balance(),
            Some(Decimal::new(475_050, 2))
        );
    }

    #[test]
    fn test_session_without_balance() {
        let config = load(&[
            (BACKEND_URL, "http://localhost:8082"),
            (USERNAME, "crio-user"),
            (TOKEN, "abc"),
        ])
        .unwrap();
        assert!(config.session.unwrap().balance().is_none());
    }

    #[test]
    fn test_invalid_balance() {
        for value in ["lots", "-10"] {
            let err = load(&[
                (BACKEND_URL, "http://localhost:8082"),
                (USERNAME, "crio-user"),
                (TOKEN, "abc"),
                (BALANCE, value),
            ])
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == BALANCE));
        }
    }

    #[test]
    fn test_balance_without_session() {
        let err = load(&[(BACKEND_URL, "http://localhost:8082"), (BALANCE, "100")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == BALANCE));
    }

    #[test]
    fn test_token_without_username() {
        let err = load(&[(BACKEND_URL, "http://localhost:8082"), (TOKEN, "abc")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == USERNAME));
    }
}
