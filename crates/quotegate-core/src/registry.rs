use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::circuit_breaker::{BreakerStats, CircuitBreaker, CircuitBreakerConfig};

/// Guarded downstream operations. Each one owns an independent breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Quote,
    Quotes,
    Companies,
    InstanceInfo,
}

impl Operation {
    pub const ALL: [Self; 4] = [Self::Quote, Self::Quotes, Self::Companies, Self::InstanceInfo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Quotes => "quotes",
            Self::Companies => "companies",
            Self::InstanceInfo => "instance_info",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Quote => 0,
            Self::Quotes => 1,
            Self::Companies => 2,
            Self::InstanceInfo => 3,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Breaker state for one operation, as reported to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub operation: Operation,
    #[serde(flatten)]
    pub stats: BreakerStats,
}

/// Holds one circuit breaker per [`Operation`].
///
/// Share it behind an `Arc` to let several clients trip and observe the same
/// breakers.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: [CircuitBreaker; 4],
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl BreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_configs(|_| config)
    }

    /// Builds the registry with a config chosen per operation.
    pub fn with_configs(config_for: impl Fn(Operation) -> CircuitBreakerConfig) -> Self {
        Self {
            breakers: Operation::ALL.map(|operation| CircuitBreaker::new(config_for(operation))),
        }
    }

    pub fn breaker(&self, operation: Operation) -> &CircuitBreaker {
        &self.breakers[operation.index()]
    }

    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        Operation::ALL
            .iter()
            .map(|&operation| BreakerSnapshot {
                operation,
                stats: self.breaker(operation).stats(),
            })
            .collect()
    }

    pub fn reset_all(&self) {
        for breaker in &self.breakers {
            breaker.reset();
        }
    }
}
