//! Gateway configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QUOTEGATE_DOWNSTREAM_PROTOCOL` | `http` | Scheme used for downstream calls |
//! | `QUOTEGATE_QUOTES_SERVICE` | `quotes-service` | Service name handed to the resolver |
//! | `QUOTEGATE_TIMEOUT_MS` | `1000` | Budget for each guarded call |
//! | `QUOTEGATE_BREAKER_FAILURE_THRESHOLD` | `5` | Consecutive failures that open a breaker |
//! | `QUOTEGATE_BREAKER_OPEN_TIMEOUT_MS` | `5000` | Cooldown before a trial call |

use std::env;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::ConfigError;

pub const ENV_PROTOCOL: &str = "QUOTEGATE_DOWNSTREAM_PROTOCOL";
pub const ENV_SERVICE: &str = "QUOTEGATE_QUOTES_SERVICE";
pub const ENV_TIMEOUT_MS: &str = "QUOTEGATE_TIMEOUT_MS";
pub const ENV_FAILURE_THRESHOLD: &str = "QUOTEGATE_BREAKER_FAILURE_THRESHOLD";
pub const ENV_OPEN_TIMEOUT_MS: &str = "QUOTEGATE_BREAKER_OPEN_TIMEOUT_MS";

const DEFAULT_SERVICE: &str = "quotes-service";
const DEFAULT_TIMEOUT_MS: u64 = 1_000;

/// Scheme used to reach the downstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(ConfigError::InvalidProtocol {
                value: value.to_owned(),
            }),
        }
    }
}

/// Where and how to reach the downstream quotes service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamConfig {
    pub protocol: Protocol,
    pub service: String,
    pub call_timeout: Duration,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            service: String::from(DEFAULT_SERVICE),
            call_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl DownstreamConfig {
    pub fn new(protocol: Protocol, service: impl Into<String>) -> Result<Self, ConfigError> {
        let service = service.into();
        if service.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }
        Ok(Self {
            protocol,
            service,
            ..Self::default()
        })
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatewayConfig {
    pub downstream: DownstreamConfig,
    pub breaker: CircuitBreakerConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let protocol = match lookup(ENV_PROTOCOL) {
            Some(value) => value.parse()?,
            None => Protocol::default(),
        };
        let service = lookup(ENV_SERVICE).unwrap_or_else(|| String::from(DEFAULT_SERVICE));
        let timeout_ms = parse_number(&lookup, ENV_TIMEOUT_MS)?.unwrap_or(DEFAULT_TIMEOUT_MS);

        let mut breaker = CircuitBreakerConfig::default();
        if let Some(threshold) = parse_number(&lookup, ENV_FAILURE_THRESHOLD)? {
            breaker.failure_threshold = u32::try_from(threshold).unwrap_or(u32::MAX);
        }
        if let Some(open_ms) = parse_number(&lookup, ENV_OPEN_TIMEOUT_MS)? {
            breaker.open_timeout = Duration::from_millis(open_ms);
        }

        Ok(Self {
            downstream: DownstreamConfig::new(protocol, service)?
                .with_call_timeout(Duration::from_millis(timeout_ms)),
            breaker,
        })
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { name, value })
        })
        .transpose()
}
