//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Connection settings for the Redis backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

impl RedisConfig {
    /// Connection URL understood by the redis driver.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Store host and port.
    pub redis: RedisConfig,
    /// Port the health endpoint listens on.
    pub health_port: u16,
    /// Pub/sub channel announcing new indices.
    pub channel: String,
    /// Delay between reconnect attempts after the subscriber connection drops.
    pub reconnect_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            health_port: 5001,
            channel: "insert".to_string(),
            reconnect_delay: Duration::from_millis(1000),
        }
    }
}

impl WorkerConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// Missing keys take their default; present but unparsable numbers are
    /// rejected so a typo never silently points the worker somewhere else.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("REDIS_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.redis.host);

        let port = parse_var(&lookup, "REDIS_PORT")?.unwrap_or(defaults.redis.port);
        let health_port = parse_var(&lookup, "HEALTH_PORT")?.unwrap_or(defaults.health_port);

        let channel = lookup("WORKER_CHANNEL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.channel);

        let reconnect_delay = parse_var::<u64, _>(&lookup, "REDIS_RECONNECT_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect_delay);

        Ok(Self {
            redis: RedisConfig { host, port },
            health_port,
            channel,
            reconnect_delay,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}
