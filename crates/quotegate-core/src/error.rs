use thiserror::Error;

/// Classification of a guarded call that was diverted to its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    BreakerOpen,
    Timeout,
    Transport,
    Status(u16),
    Decode,
    Resolve,
}

impl FallbackReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BreakerOpen => "breaker_open",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Status(_) => "status",
            Self::Decode => "decode",
            Self::Resolve => "resolve",
        }
    }
}

/// Failure talking to the downstream quotes service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DownstreamError {
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("downstream call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("downstream returned status {status}")]
    Status { status: u16 },

    #[error("failed to decode downstream response: {message}")]
    Decode { message: String },

    #[error("could not resolve service '{service}'")]
    Resolve { service: String },
}

impl DownstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(error: &serde_json::Error) -> Self {
        Self::Decode {
            message: error.to_string(),
        }
    }

    pub const fn reason(&self) -> FallbackReason {
        match self {
            Self::Transport { .. } => FallbackReason::Transport,
            Self::Timeout { .. } => FallbackReason::Timeout,
            Self::Status { status } => FallbackReason::Status(*status),
            Self::Decode { .. } => FallbackReason::Decode,
            Self::Resolve { .. } => FallbackReason::Resolve,
        }
    }
}

/// Invalid gateway configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported downstream protocol '{value}', expected http or https")]
    InvalidProtocol { value: String },

    #[error("downstream service name cannot be empty")]
    EmptyServiceName,

    #[error("environment variable {name} must be a non-negative integer: '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}
