//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Settings shared by every task worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// The base time unit. Intervals are multiples of it and control calls
    /// are observed within one tick.
    pub tick: Duration,
    /// Most recent log entries kept per task (0 = unbounded).
    pub log_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            log_capacity: 1000,
        }
    }
}

/// Relay service configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    /// Send URL with a `{target}` placeholder.
    pub endpoint_template: String,
    pub send_timeout: Duration,
    /// Interval used when a create request omits or garbles it.
    pub default_interval_secs: u64,
    /// Directory for rolling log files; stderr when unset.
    pub log_dir: Option<String>,
    pub worker: WorkerConfig,
}

impl RelayConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint_template = std::env::var("RELAY_ENDPOINT_TEMPLATE")
            .map_err(|_| ConfigError::MissingEnvVar("RELAY_ENDPOINT_TEMPLATE".into()))?;
        check_endpoint_template(&endpoint_template)?;

        let bind = std::env::var("RELAY_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_env("RELAY_PORT", 5000)?;
        let send_timeout = Duration::from_secs(parse_env("RELAY_SEND_TIMEOUT_SECS", 20)?);
        let default_interval_secs = parse_env("RELAY_DEFAULT_INTERVAL_SECS", 60)?;
        let tick = Duration::from_millis(parse_env("RELAY_TICK_MS", 1000)?);
        if tick.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_TICK_MS".into(),
                message: "must be positive".into(),
            });
        }
        let log_capacity = parse_env("RELAY_LOG_CAPACITY", 1000)?;
        let log_dir = std::env::var("RELAY_LOG_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            bind,
            port,
            endpoint_template,
            send_timeout,
            default_interval_secs,
            log_dir,
            worker: WorkerConfig { tick, log_capacity },
        })
    }
}

/// The send URL must say where the task target goes.
pub fn check_endpoint_template(template: &str) -> Result<(), ConfigError> {
    if template.contains("{target}") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: "RELAY_ENDPOINT_TEMPLATE".into(),
            message: "must contain a {target} placeholder".into(),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}
