//! Configuration for the gate and the hosting service.
//!
//! Values are read from the environment. Loading goes through a lookup
//! closure so tests never have to mutate process-wide state.

use std::time::Duration;

use crate::errors::ConfigError;

/// Scheme label expected in front of the token.
pub const DEFAULT_TOKEN_SCHEME: &str = "JWT ";
/// Upper bound on a single auth-service round trip.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Settings for talking to the remote authentication service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    /// Endpoint that receives `POST {"token": ...}`.
    pub url: String,
    /// Prefix stripped from the `Authorization` header.
    pub token_scheme: String,
    /// Accept self-signed or otherwise untrusted certificates.
    pub accept_invalid_certs: bool,
    /// `None` waits for the auth service indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token_scheme: DEFAULT_TOKEN_SCHEME.to_string(),
            accept_invalid_certs: false,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

impl AuthConfig {
    /// Loads the config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the config through `lookup`.
    ///
    /// # Errors
    /// `ConfigError::Missing` when `AUTH_SERVICE_URL` is unset or blank,
    /// `ConfigError::Invalid` when a flag or number does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::parse(&lookup)?;
        if config.url.is_empty() {
            return Err(ConfigError::Missing("AUTH_SERVICE_URL"));
        }
        Ok(config)
    }

    /// Parses every setting, leaving `url` empty when it is unset or blank.
    fn parse<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            url: lookup("AUTH_SERVICE_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            ..Self::default()
        };

        if let Some(scheme) = lookup("AUTH_TOKEN_SCHEME").filter(|v| !v.is_empty()) {
            config.token_scheme = scheme;
        }

        if let Some(raw) = lookup("AUTH_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = parse_flag("AUTH_ACCEPT_INVALID_CERTS", &raw)?;
        }

        if let Some(raw) = lookup("AUTH_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "AUTH_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
        }),
    }
}

/// Settings for a service that hosts gated routes.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Loads the service config from the environment.
    ///
    /// A missing `AUTH_SERVICE_URL` does not abort startup: it is logged and
    /// the URL is left empty, so every gated request is refused with `401`
    /// until the URL is set and reloaded. Invalid values are errors.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SERVER_PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let auth = AuthConfig::parse(&lookup)?;
        if auth.url.is_empty() {
            tracing::warn!("AUTH_SERVICE_URL not set, gated routes will refuse all requests");
        }

        Ok(Self { host, port, auth })
    }
}
