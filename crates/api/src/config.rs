use std::str::FromStr;

use chrono::Duration;
use warden_core::password::HashCost;
use warden_core::service::{
    AuthSettings, DEFAULT_MAX_TOKEN_ATTEMPTS, DEFAULT_MIN_PASSWORD_LENGTH,
    DEFAULT_SESSION_TTL_HOURS,
};

/// Credential and session policy loaded from the environment.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session lifetime in hours (default: 24).
    pub session_ttl_hours: i64,
    /// Token regeneration attempts on a digest collision (default: 3).
    pub max_token_attempts: u32,
    /// Minimum password length at registration (default: 8).
    pub min_password_length: usize,
    /// Argon2id work factor (default: 19 MiB, 2 passes, 1 lane).
    pub hash_cost: HashCost,
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `SESSION_TTL_HOURS`   | `24`    |
    /// | `TOKEN_MAX_ATTEMPTS`  | `3`     |
    /// | `PASSWORD_MIN_LENGTH` | `8`     |
    /// | `ARGON2_MEMORY_KIB`   | `19456` |
    /// | `ARGON2_ITERATIONS`   | `2`     |
    /// | `ARGON2_PARALLELISM`  | `1`     |
    ///
    /// # Panics
    ///
    /// Panics if any variable is set but does not parse, or if the result
    /// fails [`AuthConfig::validate`].
    pub fn from_env() -> Self {
        let defaults = HashCost::default();
        let config = Self {
            session_ttl_hours: env_or("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS),
            max_token_attempts: env_or("TOKEN_MAX_ATTEMPTS", DEFAULT_MAX_TOKEN_ATTEMPTS),
            min_password_length: env_or("PASSWORD_MIN_LENGTH", DEFAULT_MIN_PASSWORD_LENGTH),
            hash_cost: HashCost::new(
                env_or("ARGON2_MEMORY_KIB", defaults.memory_kib),
                env_or("ARGON2_ITERATIONS", defaults.iterations),
                env_or("ARGON2_PARALLELISM", defaults.parallelism),
            ),
        };
        config
            .validate()
            .unwrap_or_else(|e| panic!("Invalid auth configuration: {e}"));
        config
    }

    /// Reject values that parse but cannot work: a session must outlive the
    /// login that creates it, and at least one token attempt must be made.
    pub fn validate(&self) -> Result<(), String> {
        if self.session_ttl_hours <= 0 {
            return Err(format!(
                "SESSION_TTL_HOURS must be positive, got {}",
                self.session_ttl_hours
            ));
        }
        if self.max_token_attempts == 0 {
            return Err("TOKEN_MAX_ATTEMPTS must be at least 1".into());
        }
        Ok(())
    }

    pub fn settings(&self) -> AuthSettings {
        AuthSettings {
            session_ttl: Duration::hours(self.session_ttl_hours),
            max_token_attempts: self.max_token_attempts,
            min_password_length: self.min_password_length,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            max_token_attempts: DEFAULT_MAX_TOKEN_ATTEMPTS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            hash_cost: HashCost::default(),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. When unset the in-memory backend is used.
    pub database_url: Option<String>,
    /// How often expired and revoked sessions are purged (default: `3600`).
    pub session_sweep_interval_secs: u64,
    /// Whether the session cookie carries the `Secure` attribute (default: `true`).
    pub cookie_secure: bool,
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                    |
    /// |-------------------------------|----------------------------|
    /// | `HOST`                        | `0.0.0.0`                  |
    /// | `PORT`                        | `3000`                     |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                       |
    /// | `DATABASE_URL`                | unset (in-memory backend)  |
    /// | `SESSION_SWEEP_INTERVAL_SECS` | `3600`                     |
    /// | `COOKIE_SECURE`               | `true`                     |
    ///
    /// See [`AuthConfig::from_env`] for the credential policy variables.
    ///
    /// # Panics
    ///
    /// Panics on unparseable values or if [`ServerConfig::validate`] fails.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let config = Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            database_url,
            session_sweep_interval_secs: env_or("SESSION_SWEEP_INTERVAL_SECS", 3600),
            cookie_secure: env_or("COOKIE_SECURE", true),
            auth: AuthConfig::from_env(),
        };
        config
            .validate()
            .unwrap_or_else(|e| panic!("Invalid server configuration: {e}"));
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.session_sweep_interval_secs == 0 {
            return Err("SESSION_SWEEP_INTERVAL_SECS must be at least 1".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be at least 1".into());
        }
        self.auth.validate()
    }
}

/// Read and parse an environment variable, falling back to `default` when unset.
///
/// Misconfiguration fails fast at startup.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid value: {e}")),
        Err(_) => default,
    }
}
