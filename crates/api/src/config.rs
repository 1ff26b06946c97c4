//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Store
//! - `PD_STORE` - `postgres` (default) or `memory`
//! - `PD_DATABASE_URL` - `PostgreSQL` connection string, required for `postgres`
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PD_HOST` - Bind address (default: 127.0.0.1)
//! - `PD_PORT` - Listen port (default: 5000)
//! - `PD_FRONTEND_URL` - Browser origin allowed by CORS, with credentials
//! - `PD_TOKEN_TTL_HOURS` - Bearer token lifetime, at most ten years (default: 720)
//! - `PD_RATE_LIMIT` - Rate limit register and login (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Upper bound on `PD_TOKEN_TTL_HOURS` (ten years).
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which persistence backend to run against.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// `PostgreSQL` with the given connection URL (contains password).
    Postgres { database_url: SecretString },
    /// Process-local store, lost on restart.
    Memory,
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Persistence backend
    pub store: StoreConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origin allowed to call the API from a browser
    pub frontend_url: Option<Url>,
    /// Lifetime of issued bearer tokens, in hours
    pub token_ttl_hours: i64,
    /// Whether register and login are rate limited
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl ApiConfig {
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

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let store = match env.or_default("PD_STORE", "postgres").as_str() {
            "postgres" => StoreConfig::Postgres {
                database_url: env.database_url("PD_DATABASE_URL")?,
            },
            "memory" => StoreConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "PD_STORE".to_string(),
                    format!("expected `postgres` or `memory`, got `{other}`"),
                ));
            }
        };

        let frontend_url = env
            .optional("PD_FRONTEND_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("PD_FRONTEND_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let token_ttl_hours: i64 = env.parsed("PD_TOKEN_TTL_HOURS", "720")?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::InvalidEnvVar(
                "PD_TOKEN_TTL_HOURS".to_string(),
                format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
            ));
        }

        Ok(Self {
            store,
            host: env.parsed("PD_HOST", "127.0.0.1")?,
            port: env.parsed("PD_PORT", "5000")?,
            frontend_url,
            token_ttl_hours,
            rate_limit: env.parsed("PD_RATE_LIMIT", "true")?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parsed("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Bearer token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with typed accessors.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, using `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_store() {
        let config = load(&[("PD_STORE", "memory")]).unwrap();

        assert!(matches!(config.store, StoreConfig::Memory));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.token_ttl_hours, 720);
        assert!(config.rate_limit);
        assert!(config.frontend_url.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "PD_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_falls_back_to_generic_var() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/pd")]).unwrap();
        let StoreConfig::Postgres { database_url } = config.store else {
            panic!("expected postgres store");
        };
        assert_eq!(database_url.expose_secret(), "postgres://localhost/pd");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("PD_STORE", "mongo")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("PD_STORE", "memory"), ("PD_PORT", "eighty")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("PD_STORE", "memory"), ("PD_FRONTEND_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("PD_STORE", "memory"), ("PD_TOKEN_TTL_HOURS", "0")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_token_ttl_is_capped() {
        assert!(matches!(
            load(&[("PD_STORE", "memory"), ("PD_TOKEN_TTL_HOURS", "10000000000")]),
            Err(ConfigError::InvalidEnvVar(ref key, _)) if key == "PD_TOKEN_TTL_HOURS"
        ));
        assert!(matches!(
            load(&[("PD_STORE", "memory"), ("PD_TOKEN_TTL_HOURS", "87601")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));

        let config = load(&[("PD_STORE", "memory"), ("PD_TOKEN_TTL_HOURS", "87600")]).unwrap();
        assert_eq!(config.token_ttl(), chrono::Duration::days(3650));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PD_STORE", "memory"),
            ("PD_HOST", "0.0.0.0"),
            ("PD_PORT", "8080"),
            ("PD_FRONTEND_URL", "http://localhost:5173"),
            ("PD_RATE_LIMIT", "false"),
            ("SENTRY_SAMPLE_RATE", "0.5"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().port(), 8080);
        assert_eq!(
            config.frontend_url.unwrap().origin().ascii_serialization(),
            "http://localhost:5173"
        );
        assert!(!config.rate_limit);
        assert!((config.sentry_sample_rate - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("PD_DATABASE_URL", "postgres://user:hunter2@db/pd")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
