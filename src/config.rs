//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::command_queue::DEFAULT_QUEUE_CAPACITY;
use crate::domain::validator::DEFAULT_SPECIAL_ACTION_PROBABILITY;

/// Port used when neither `LISTEN_ADDR` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 5111;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:5111`).
    pub listen_addr: SocketAddr,

    /// Shared admin secret (`MAIN_KEY`). When `None`, every admin call is
    /// refused.
    pub admin_secret: Option<String>,

    /// Bound of the command queue.
    pub queue_capacity: usize,

    /// Period of the broadcast loop.
    pub broadcast_interval: Duration,

    /// Admission probability of the special action.
    pub special_action_probability: f64,

    /// Requests allowed per client per rate-limit window.
    pub rate_limit_requests: u32,

    /// Length of the rate-limit window.
    pub rate_limit_window: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(addr) => addr.parse()?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], parse_env("PORT", DEFAULT_PORT))),
        };

        let admin_secret = std::env::var("MAIN_KEY").ok().filter(|k| !k.is_empty());

        let queue_capacity = parse_env("QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY);
        let broadcast_interval =
            Duration::from_millis(parse_env("BROADCAST_INTERVAL_MS", 10_u64).max(1));
        let special_action_probability = parse_env(
            "SPECIAL_ACTION_PROBABILITY",
            DEFAULT_SPECIAL_ACTION_PROBABILITY,
        )
        .clamp(0.0, 1.0);

        let rate_limit_requests = parse_env("RATE_LIMIT_REQUESTS", 500);
        let rate_limit_window =
            Duration::from_secs(parse_env("RATE_LIMIT_WINDOW_SECS", 10_u64).max(1));

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            admin_secret,
            queue_capacity,
            broadcast_interval,
            special_action_probability,
            rate_limit_requests,
            rate_limit_window,
            log_format,
        })
    }

    /// Returns a copy with the given admin secret.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: impl Into<String>) -> Self {
        self.admin_secret = Some(secret.into());
        self
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            admin_secret: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            broadcast_interval: Duration::from_millis(10),
            special_action_probability: DEFAULT_SPECIAL_ACTION_PROBABILITY,
            rate_limit_requests: 500,
            rate_limit_window: Duration::from_secs(10),
            log_format: LogFormat::Text,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = RelayConfig::default();
        assert_eq!(config.listen_addr.port(), 5111);
        assert_eq!(config.queue_capacity, 50);
        assert_eq!(config.broadcast_interval, Duration::from_millis(10));
        assert_eq!(config.rate_limit_requests, 500);
        assert_eq!(config.rate_limit_window, Duration::from_secs(10));
        assert!(config.admin_secret.is_none());
    }

    #[test]
    fn with_admin_secret_sets_key() {
        let config = RelayConfig::default().with_admin_secret("hunter2");
        assert_eq!(config.admin_secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: u32 = parse_env("COMMAND_RELAY_SURELY_UNSET_KEY", 42);
        assert_eq!(value, 42);
    }
}
