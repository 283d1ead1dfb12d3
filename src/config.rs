//! Storefront configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a default so that a bare
//! `cargo run` starts a local, in-memory storefront.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;

/// Development fallback for `TOKEN_SECRET`.
pub const DEFAULT_TOKEN_SECRET: &str = "ticketfront-dev-secret";

/// Which implementation backs the identity, catalog and purchase stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// Simulated backends persisting to local key/value storage.
    #[default]
    Local,
    /// HTTP backends calling the remote identity, events and purchases APIs.
    Remote,
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "simulated" => Ok(Self::Local),
            "remote" | "http" => Ok(Self::Remote),
            other => Err(format!("unknown backend mode: {other}")),
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// Top-level storefront configuration.
///
/// Loaded once at startup via [`StorefrontConfig::from_env`].
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Backend implementation selector.
    pub backend_mode: BackendMode,

    /// Base URL of the remote identity service (`/auth/SignIn`, `/users`).
    pub identity_api_url: String,

    /// Base URL of the remote events collection.
    pub events_api_url: String,

    /// Base URL of the remote purchases collection.
    pub purchases_api_url: String,

    /// Per-request timeout for the remote HTTP client.
    pub request_timeout_secs: u64,

    /// JSON file backing local storage. `None` keeps everything in memory.
    pub storage_path: Option<PathBuf>,

    /// Artificial delay applied by the simulated backends.
    pub simulated_latency_ms: u64,

    /// HMAC secret used to verify (and, locally, issue) credential tokens.
    pub token_secret: SecretString,

    /// Lifetime of tokens issued by the local identity backend.
    pub token_ttl_secs: u64,

    /// Seed the local catalog with sample events when it is empty.
    pub seed_sample_events: bool,

    /// Optional administrator account created by the local identity backend.
    pub local_admin_email: Option<String>,

    /// Password for [`Self::local_admin_email`].
    pub local_admin_password: Option<SecretString>,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Emit logs as JSON lines (`LOG_FORMAT=json`) instead of plain text.
    pub log_json: bool,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            backend_mode: BackendMode::Local,
            identity_api_url: "http://localhost:8080".to_string(),
            events_api_url: "http://localhost/api/eventos".to_string(),
            purchases_api_url: "http://localhost/api/compras".to_string(),
            request_timeout_secs: 30,
            storage_path: None,
            simulated_latency_ms: 0,
            token_secret: SecretString::from(DEFAULT_TOKEN_SECRET),
            token_ttl_secs: 60 * 60 * 24,
            seed_sample_events: true,
            local_admin_email: None,
            local_admin_password: None,
            event_bus_capacity: 1_024,
            log_json: false,
        }
    }
}

impl StorefrontConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to [`StorefrontConfig::default`] for every unset key.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` or `BACKEND_MODE` is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let backend_mode = match std::env::var("BACKEND_MODE") {
            Ok(raw) => raw.parse::<BackendMode>()?,
            Err(_) => defaults.backend_mode,
        };

        let token_secret = std::env::var("TOKEN_SECRET")
            .map(SecretString::from)
            .unwrap_or(defaults.token_secret);

        Ok(Self {
            listen_addr,
            backend_mode,
            identity_api_url: env_or("IDENTITY_API_URL", defaults.identity_api_url),
            events_api_url: env_or("EVENTS_API_URL", defaults.events_api_url),
            purchases_api_url: env_or("PURCHASES_API_URL", defaults.purchases_api_url),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            storage_path: std::env::var("STORAGE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            simulated_latency_ms: parse_env("SIMULATED_LATENCY_MS", defaults.simulated_latency_ms),
            token_secret,
            token_ttl_secs: parse_env("TOKEN_TTL_SECS", defaults.token_ttl_secs),
            seed_sample_events: parse_env_bool("SEED_SAMPLE_EVENTS", defaults.seed_sample_events),
            local_admin_email: std::env::var("LOCAL_ADMIN_EMAIL").ok(),
            local_admin_password: std::env::var("LOCAL_ADMIN_PASSWORD")
                .ok()
                .map(SecretString::from),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        })
    }

    /// Returns `true` when the token secret is still the development default.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        use secrecy::ExposeSecret;
        self.token_secret.expose_secret() == DEFAULT_TOKEN_SECRET
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_mode_parses_aliases() {
        assert_eq!("remote".parse::<BackendMode>(), Ok(BackendMode::Remote));
        assert_eq!(" Local ".parse::<BackendMode>(), Ok(BackendMode::Local));
        assert_eq!("simulated".parse::<BackendMode>(), Ok(BackendMode::Local));
        assert!("grpc".parse::<BackendMode>().is_err());
    }

    #[test]
    fn defaults_are_local_and_in_memory() {
        let config = StorefrontConfig::default();
        assert_eq!(config.backend_mode, BackendMode::Local);
        assert!(config.storage_path.is_none());
        assert!(config.uses_default_secret());
        assert_eq!(config.backend_mode.to_string(), "local");
    }
}
