//! Environment-driven configuration.
//!
//! Every knob has a default suitable for local development; production
//! injects real values through the environment. `.env` loading (dotenvy) is
//! the binary's job so library consumers and tests see only the process
//! environment.

use std::time::Duration;

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub mqtt: MqttConfig,
    pub service: ServiceConfig,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Comma-separated CORS origins; empty = allow none beyond same-origin.
    pub allow_origins: Vec<String>,
    /// Drain window for outstanding requests on shutdown.
    pub shutdown_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.sslmode
        )
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub addr: String,
    pub password: String,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}", self.addr)
        } else {
            format!("redis://:{}@{}", self.password, self.addr)
        }
    }
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub topic: String,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_url: String,
    pub topic_prefix: String,
}

/// Timeouts and retry policy for the coordination core.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Shelf lease TTL for single-slot commands.
    pub lease_ttl: Duration,
    /// Shelf lease TTL for batch commands.
    pub batch_lease_ttl: Duration,
    /// How long a pending operation may wait for its sensor handshake.
    pub physical_operation_timeout: Duration,
    /// Sweeper tick interval.
    pub timeout_check_interval: Duration,
    /// Shelf bridge retry policy.
    pub retry_count: u32,
    pub retry_delay: Duration,
    /// Advisory cache TTLs.
    pub shelf_summary_cache_ttl: Duration,
    pub shelf_status_cache_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::from_secs(30),
            batch_lease_ttl: Duration::from_secs(60),
            physical_operation_timeout: Duration::from_secs(300),
            timeout_check_interval: Duration::from_secs(60),
            retry_count: 3,
            retry_delay: Duration::from_secs(2),
            shelf_summary_cache_ttl: Duration::from_secs(600),
            shelf_status_cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = ServiceConfig::default();

        Ok(Self {
            server: ServerConfig {
                port: parse_env("SERVER_PORT", 8080)?,
                allow_origins: env_or("ALLOW_ORIGINS", "")
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                shutdown_grace: Duration::from_secs(30),
            },
            database: DatabaseConfig {
                host: env_or("DB_HOST", "localhost"),
                port: parse_env("DB_PORT", 5432)?,
                user: env_or("DB_USER", "admin"),
                password: env_or("DB_PASSWORD", "password"),
                name: env_or("DB_NAME", "warehouse"),
                sslmode: env_or("DB_SSLMODE", "disable"),
            },
            redis: RedisConfig {
                addr: env_or("REDIS_ADDR", "localhost:6379"),
                password: env_or("REDIS_PASSWORD", ""),
            },
            kafka: KafkaConfig {
                brokers: env_or("KAFKA_BROKERS", "localhost:9092")
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                topic: env_or("KAFKA_TOPIC", "inventory_events"),
            },
            mqtt: MqttConfig {
                broker_url: env_or("MQTT_BROKER_URL", "mqtt://localhost:1883"),
                topic_prefix: env_or("MQTT_TOPIC_PREFIX", "warehouse/shelf"),
            },
            service: ServiceConfig {
                physical_operation_timeout: duration_env(
                    "PHYSICAL_OPERATION_TIMEOUT",
                    defaults.physical_operation_timeout,
                )?,
                timeout_check_interval: duration_env(
                    "PHYSICAL_OPERATION_TIMEOUT_CHECK_INTERVAL",
                    defaults.timeout_check_interval,
                )?,
                retry_count: parse_env("RETRY_COUNT", defaults.retry_count)?,
                retry_delay: duration_env("RETRY_DELAY", defaults.retry_delay)?,
                ..defaults
            },
            log_level: env_or("LOG_LEVEL", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v.parse().with_context(|| format!("invalid {key}: {v}")),
        _ => Ok(default),
    }
}

fn duration_env(key: &str, default: Duration) -> Result<Duration> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => {
            parse_duration(&v).with_context(|| format!("invalid {key}: {v}"))
        }
        _ => Ok(default),
    }
}

/// Parse `"90"`, `"90s"`, `"5m"` or `"1h"` into a duration. Bare numbers are
/// seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };
    if digits.is_empty() {
        bail!("no digits in duration {s:?}");
    }
    let n: u64 = digits.parse()?;
    let secs = match unit.trim() {
        "" | "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        other => bail!("unknown duration unit {other:?}"),
    };
    Ok(Duration::from_secs(secs))
}
