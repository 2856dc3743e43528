//! Configuration management for releasewatch.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the local data directory. The hierarchy is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)
//!
//! Credentials have no default. They must be supplied by the environment and
//! are never compiled into the binary.

use std::{env, fmt, path::PathBuf, time::Duration};

use crate::{
    error::{CatalogError, Result},
    management::Pacing,
    spotify::RetryPolicy,
};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_MARKET: &str = "NL";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
pub const MIN_LOOKBACK_DAYS: u32 = 1;
pub const MAX_LOOKBACK_DAYS: u32 = 14;
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Returns the platform specific data directory of the application.
///
/// - Linux: `~/.local/share/releasewatch`
/// - macOS: `~/Library/Application Support/releasewatch`
/// - Windows: `%LOCALAPPDATA%/releasewatch`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("releasewatch");
    path
}

/// Loads environment variables from the `.env` file in the data directory.
///
/// Creates the data directory if it doesn't exist. A missing `.env` file is
/// not an error, the variables may come from the process environment.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an existing `.env`
/// file cannot be parsed.
pub async fn load_env() -> Result<()> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|e| CatalogError::config(e.to_string()))?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| CatalogError::config(e.to_string()))?;
    }
    Ok(())
}

/// Clamps a lookback period to the supported range of days.
pub fn clamp_lookback_days(days: u32) -> u32 {
    days.clamp(MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS)
}

/// Client credentials for the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Everything a [`crate::spotify::CatalogClient`] needs to be constructed.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Base URL of the Web API, without trailing slash.
    pub api_url: String,
    /// Client-credentials token endpoint.
    pub token_url: String,
    /// Market passed to release and recommendation lookups.
    pub market: String,
    /// Default lookback period for new releases, already clamped.
    pub lookback_days: u32,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    pub pacing: Pacing,
    /// A token counts as expired this long before its real expiry.
    pub token_safety_margin: Duration,
    /// Extra wait after a rate-limit window before the queue resumes.
    pub drain_buffer: Duration,
    /// Used when a 429 carries no usable `Retry-After` header.
    pub default_retry_after_secs: u64,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            market: DEFAULT_MARKET.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            http_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            pacing: Pacing::default(),
            token_safety_margin: Duration::from_secs(60),
            drain_buffer: Duration::from_secs(1),
            default_retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
        }
    }

    /// Builds the configuration from the process environment.
    ///
    /// Reads `SPOTIFY_API_AUTH_CLIENT_ID` and `SPOTIFY_API_AUTH_CLIENT_SECRET`
    /// (required) plus the optional `SPOTIFY_API_URL`, `SPOTIFY_API_TOKEN_URL`,
    /// `SPOTIFY_MARKET`, `RELEASE_LOOKBACK_DAYS` and `HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CatalogError::config(format!("{key} must be set")))
        };

        let mut config = Self::new(Credentials::new(
            required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
        ));

        if let Some(url) = lookup("SPOTIFY_API_URL") {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("SPOTIFY_API_TOKEN_URL") {
            config.token_url = url.trim().to_string();
        }
        if let Some(market) = lookup("SPOTIFY_MARKET") {
            config.market = market.trim().to_uppercase();
        }
        if let Some(days) = lookup("RELEASE_LOOKBACK_DAYS") {
            let days = days.trim().parse::<u32>().map_err(|e| {
                CatalogError::config(format!("RELEASE_LOOKBACK_DAYS is not a number: {e}"))
            })?;
            config.lookback_days = clamp_lookback_days(days);
        }
        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                CatalogError::config(format!("HTTP_TIMEOUT_SECS is not a number: {e}"))
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_requires_credentials() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("SPOTIFY_API_AUTH_CLIENT_ID"));

        let err = ClientConfig::from_lookup(lookup_from(&[(
            "SPOTIFY_API_AUTH_CLIENT_ID",
            "id",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("SPOTIFY_API_AUTH_CLIENT_SECRET"));
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SPOTIFY_API_AUTH_CLIENT_ID", "id"),
            ("SPOTIFY_API_AUTH_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.market, "NL");
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.default_retry_after_secs, 30);
        assert_eq!(config.pacing.batch_size, 5);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_from_lookup_overrides_and_clamps() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SPOTIFY_API_AUTH_CLIENT_ID", "id"),
            ("SPOTIFY_API_AUTH_CLIENT_SECRET", "secret"),
            ("SPOTIFY_API_URL", "http://localhost:9000/v1/"),
            ("SPOTIFY_MARKET", "de"),
            ("RELEASE_LOOKBACK_DAYS", "90"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://localhost:9000/v1");
        assert_eq!(config.market, "DE");
        assert_eq!(config.lookback_days, 14);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_rejects_bad_lookback() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            ("SPOTIFY_API_AUTH_CLIENT_ID", "id"),
            ("SPOTIFY_API_AUTH_CLIENT_SECRET", "secret"),
            ("RELEASE_LOOKBACK_DAYS", "a week"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn test_clamp_lookback_days() {
        assert_eq!(clamp_lookback_days(0), 1);
        assert_eq!(clamp_lookback_days(7), 7);
        assert_eq!(clamp_lookback_days(30), 14);
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("client", "super-secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("client"));
        assert!(!debug.contains("super-secret"));
    }
}
