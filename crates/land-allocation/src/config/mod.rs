use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::allocation::EvaluationConfig;

/// Deployment stage, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Runtime settings for the allocation service, sourced from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub evaluation: EvaluationConfig,
}

impl AppConfig {
    /// Reads `.env` (when present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_label(&var_or("APP_ENV", "development"));
        let port = var_or("APP_PORT", "3000");
        let server = ServerConfig {
            host: var_or("APP_HOST", "127.0.0.1"),
            port: port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { value: port })?,
        };
        let telemetry = TelemetryConfig {
            log_level: var_or("APP_LOG_LEVEL", "info"),
        };

        let defaults = EvaluationConfig::default();
        let evaluation = EvaluationConfig {
            provider_timeout_ms: positive_var("ALLOC_PROVIDER_TIMEOUT_MS")?
                .unwrap_or(defaults.provider_timeout_ms),
            max_concurrent_evaluations: positive_var("ALLOC_MAX_CONCURRENCY")?
                .unwrap_or(defaults.max_concurrent_evaluations),
        };

        Ok(Self {
            environment,
            server,
            telemetry,
            evaluation,
        })
    }
}

fn var_or(key: &str, fallback: &str) -> String {
    env::var(key).unwrap_or_else(|_| fallback.to_string())
}

/// Unset keys yield `None`; set keys must parse to a value above zero.
fn positive_var<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(Some(value)),
        _ => Err(ConfigError::InvalidTuning { key, value: raw }),
    }
}

/// HTTP listener binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost {
                    value: self.host.clone(),
                    source,
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort {
        value: String,
    },
    InvalidHost {
        value: String,
        source: std::net::AddrParseError,
    },
    InvalidTuning {
        key: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { value } => {
                write!(f, "APP_PORT '{value}' is not a valid port number")
            }
            ConfigError::InvalidHost { value, .. } => {
                write!(f, "APP_HOST '{value}' is not an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTuning { key, value } => {
                write!(f, "{key} must be a positive integer (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source, .. } => Some(source),
            ConfigError::InvalidPort { .. } | ConfigError::InvalidTuning { .. } => None,
        }
    }
}
