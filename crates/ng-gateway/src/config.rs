//! Gateway configuration.
//!
//! Every field has a sensible default so a bare `GatewayConfig::default()`
//! boots a local instance. Deployments override through the environment
//! (`from_env`) or by deserializing a config document; durations accept
//! humane strings such as "5s", "100ms" or "1h".

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener settings.
    pub http: HttpConfig,
    /// Message bus connection settings.
    pub bus: BusConfig,
    /// Token issuing and verification settings.
    pub auth: AuthConfig,
    /// Request/reply bridge settings.
    pub rpc: RpcConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

/// Message bus connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus server URLs, tried in order.
    pub servers: Vec<String>,
}

/// Token settings for the auth surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing session tokens. Must be non-empty.
    pub jwt_secret: String,
    /// Session token lifetime.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
}

/// Request/reply bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-call deadline. The clock starts when the call is issued and is
    /// never paused, reconnects included.
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    /// Reconnect attempts before a call is failed as unavailable.
    pub max_reconnects: u32,
    /// Pause between reconnect attempts.
    #[serde(with = "humantime_serde")]
    pub reconnect_wait: Duration,
    /// Fail calls immediately when the connection is down instead of
    /// attempting a reconnect first.
    pub fail_fast: bool,
    /// How often the background sweep evicts expired pending calls.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            bus: BusConfig::default(),
            auth: AuthConfig::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://127.0.0.1:4222".to_string()],
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl: Duration::from_secs(3600),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            max_reconnects: 3,
            reconnect_wait: Duration::from_millis(100),
            fail_fast: false,
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Builds a configuration from the process environment, starting from
    /// defaults. Unset variables keep their default.
    ///
    /// Recognized variables: `HTTP_HOST`, `HTTP_PORT`, `NATS_SERVER`
    /// (comma-separated for a cluster), `JWT_SECRET_KEY`, `TOKEN_TTL`,
    /// `RPC_TIMEOUT`, `RPC_MAX_RECONNECTS`, `RPC_RECONNECT_WAIT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = env_var("HTTP_HOST") {
            config.http.host = host;
        }
        if let Some(port) = env_var("HTTP_PORT") {
            config.http.port = port
                .parse()
                .map_err(|e| invalid_env("HTTP_PORT", &port, e))?;
        }
        if let Some(servers) = env_var("NATS_SERVER") {
            config.bus.servers = servers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(secret) = env_var("JWT_SECRET_KEY") {
            config.auth.jwt_secret = secret;
        }
        if let Some(ttl) = env_var("TOKEN_TTL") {
            config.auth.token_ttl = humantime_serde::parse_duration(&ttl)
                .map_err(|e| invalid_env("TOKEN_TTL", &ttl, e))?;
        }
        if let Some(timeout) = env_var("RPC_TIMEOUT") {
            config.rpc.call_timeout = humantime_serde::parse_duration(&timeout)
                .map_err(|e| invalid_env("RPC_TIMEOUT", &timeout, e))?;
        }
        if let Some(max) = env_var("RPC_MAX_RECONNECTS") {
            config.rpc.max_reconnects = max
                .parse()
                .map_err(|e| invalid_env("RPC_MAX_RECONNECTS", &max, e))?;
        }
        if let Some(wait) = env_var("RPC_RECONNECT_WAIT") {
            config.rpc.reconnect_wait = humantime_serde::parse_duration(&wait)
                .map_err(|e| invalid_env("RPC_RECONNECT_WAIT", &wait, e))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.host.is_empty() {
            return Err(ConfigError::Invalid("http.host must not be empty".into()));
        }
        if self.http.port == 0 {
            return Err(ConfigError::Invalid("http.port must not be 0".into()));
        }
        if self.bus.servers.is_empty() {
            return Err(ConfigError::Invalid(
                "bus.servers must list at least one server".into(),
            ));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must be set (JWT_SECRET_KEY)".into(),
            ));
        }
        if self.auth.token_ttl.is_zero() {
            return Err(ConfigError::Invalid(
                "auth.token_ttl must be non-zero".into(),
            ));
        }
        if self.rpc.call_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "rpc.call_timeout must be non-zero".into(),
            ));
        }
        if self.rpc.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "rpc.sweep_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The socket address string the HTTP listener binds to.
    #[must_use]
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn invalid_env(
    name: &'static str,
    value: &str,
    reason: impl std::fmt::Display,
) -> ConfigError {
    ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Serde support for durations written as humane strings.
///
/// Accepted forms: "250ms", "5s", "2m", "1h", or a bare integer meaning
/// seconds. Serialization emits "{n}ms" for sub-second values and "{n}s"
/// otherwise.
pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 && duration.as_secs() == 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    /// Parses a duration string. The "ms" suffix is checked before "s" so
    /// "100ms" is not read as a malformed seconds value.
    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration".to_string());
        }

        if let Some(millis) = s.strip_suffix("ms") {
            return millis
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| format!("invalid milliseconds in {s:?}: {e}"));
        }
        if let Some(secs) = s.strip_suffix('s') {
            return secs
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| format!("invalid seconds in {s:?}: {e}"));
        }
        if let Some(mins) = s.strip_suffix('m') {
            return mins
                .trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|e| format!("invalid minutes in {s:?}: {e}"));
        }
        if let Some(hours) = s.strip_suffix('h') {
            return hours
                .trim()
                .parse::<u64>()
                .map(|h| Duration::from_secs(h * 3600))
                .map_err(|e| format!("invalid hours in {s:?}: {e}"));
        }

        s.parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| format!("invalid duration {s:?}: {e}"))
    }
}
