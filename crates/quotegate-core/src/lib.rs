//! # Quotegate Core
//!
//! Resilient aggregation layer in front of a downstream quotes service.
//!
//! ## Overview
//!
//! Every lookup is shaped into a single HTTP call, run under a per-operation
//! circuit breaker with a bounded timeout, and replaced by a deterministic
//! fallback when the downstream is slow, failing or short-circuited. Callers
//! never see a downstream error from a guarded operation; the worst outcome
//! is an empty list or a quote flagged `FAILED`.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`circuit_breaker`] | Closed / open / half-open breaker |
//! | [`client`] | Caller-facing [`QuotesClient`] and its builder |
//! | [`config`] | Environment-driven configuration |
//! | [`domain`] | Quote, company and instance records |
//! | [`error`] | Downstream and configuration errors |
//! | [`fallback`] | Substitute results per operation |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`invoker`] | Breaker + timeout wrapper around a call |
//! | [`registry`] | One breaker per guarded operation |
//! | [`resolver`] | Service name to address resolution |
//! | [`shaper`] | Wire request construction |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quotegate_core::{GatewayConfig, QuotesClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QuotesClient::from_config(GatewayConfig::from_env()?);
//!
//!     let quote = client.get_quote("AAPL").await;
//!     if quote.is_failed() {
//!         println!("quotes service unavailable");
//!     }
//!
//!     let quotes = client.get_quotes("AAPL,MSFT").await;
//!     println!("{} quotes", quotes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  QuotesClient   │  single vs. batch reconciliation
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ResilientInvoker │────▶│ BreakerRegistry  │
//! └────────┬────────┘     └──────────────────┘
//!          │ ok                     │ open / error / timeout
//!          ▼                        ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ CallShaper +    │     │ fallback         │
//! │ HttpClient      │     │                  │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod circuit_breaker;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod invoker;
pub mod registry;
pub mod resolver;
pub mod shaper;

// Circuit breaker
pub use circuit_breaker::{BreakerStats, CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Client
pub use client::{QuotesClient, QuotesClientBuilder};

// Configuration
pub use config::{DownstreamConfig, GatewayConfig, Protocol};

// Domain models
pub use domain::{CompanyInfo, InstanceInfo, Quote, QuoteStatus, SymbolSet};

// Error types
pub use error::{ConfigError, DownstreamError, FallbackReason};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Invocation
pub use invoker::{Invocation, Outcome, ResilientInvoker};

// Breakers per operation
pub use registry::{BreakerRegistry, BreakerSnapshot, Operation};

// Resolution
pub use resolver::{DirectResolver, ServiceResolver, StaticResolver};

pub use shaper::CallShaper;
