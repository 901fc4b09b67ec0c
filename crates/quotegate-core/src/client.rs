//! Caller-facing quote lookups.
//!
//! [`QuotesClient`] shapes each request, runs it through the
//! [`ResilientInvoker`](crate::invoker::ResilientInvoker) and reconciles the
//! single vs. batch response shapes.
//!
//! | Method | Breaker | Fallback |
//! |--------|---------|----------|
//! | [`get_quote`](QuotesClient::get_quote) | `quote` | `FAILED` quote |
//! | [`get_quotes`](QuotesClient::get_quotes) | `quote` or `quotes` | see delegate |
//! | [`get_multiple_quotes`](QuotesClient::get_multiple_quotes) | `quotes` | empty list |
//! | [`get_companies`](QuotesClient::get_companies) | `companies` | empty list |
//! | [`get_instance_info`](QuotesClient::get_instance_info) | `instance_info` | placeholder map |
//! | [`kill_instance`](QuotesClient::kill_instance) | none | none |

use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::config::{DownstreamConfig, GatewayConfig};
use crate::domain::{CompanyInfo, InstanceInfo, Quote, SymbolSet};
use crate::error::DownstreamError;
use crate::fallback;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::invoker::ResilientInvoker;
use crate::registry::{BreakerRegistry, BreakerSnapshot, Operation};
use crate::resolver::{DirectResolver, ServiceResolver};
use crate::shaper::CallShaper;

/// Resilient client for the downstream quotes service.
pub struct QuotesClient {
    config: RwLock<Arc<DownstreamConfig>>,
    http_client: Arc<dyn HttpClient>,
    resolver: Arc<dyn ServiceResolver>,
    invoker: ResilientInvoker,
}

impl QuotesClient {
    pub fn builder() -> QuotesClientBuilder {
        QuotesClientBuilder::new()
    }

    /// Client using reqwest and direct name resolution.
    pub fn from_config(config: GatewayConfig) -> Self {
        QuotesClientBuilder::new()
            .with_config(config.downstream)
            .with_breaker_config(config.breaker)
            .build()
    }

    /// Quote for one symbol.
    ///
    /// Goes through the batch endpoint with a one-element set. Anything
    /// other than exactly one record yields [`Quote::default`]; a failed
    /// call yields a `FAILED` quote for `symbol`.
    pub async fn get_quote(&self, symbol: &str) -> Quote {
        debug!(symbol, "fetching quote");
        let config = self.current_config();
        let symbols = SymbolSet::single(symbol);

        self.invoker
            .invoke(
                Operation::Quote,
                config.call_timeout,
                async {
                    let quotes = self.fetch_quotes(&config, &symbols).await?;
                    Ok::<_, DownstreamError>(exactly_one(quotes))
                },
                || fallback::quote(symbol),
            )
            .await
    }

    /// Quotes for a comma-separated list. A single token is served through
    /// [`QuotesClient::get_quote`] so the result is always a list.
    pub async fn get_quotes(&self, comma_list: &str) -> Vec<Quote> {
        let symbols = SymbolSet::from_comma_list(comma_list);
        match symbols.as_slice() {
            [single] => vec![self.get_quote(single).await],
            _ => self.get_multiple_quotes(&symbols).await,
        }
    }

    /// Quotes for every symbol in one downstream call.
    ///
    /// An empty set returns an empty list without contacting the
    /// downstream. On failure the result is also empty.
    pub async fn get_multiple_quotes(&self, symbols: &SymbolSet) -> Vec<Quote> {
        if symbols.is_empty() {
            debug!("empty symbol set, skipping downstream call");
            return Vec::new();
        }
        debug!(symbols = %symbols, "fetching multiple quotes");
        let config = self.current_config();

        self.invoker
            .invoke(
                Operation::Quotes,
                config.call_timeout,
                self.fetch_quotes(&config, symbols),
                || fallback::quotes(symbols),
            )
            .await
    }

    /// Companies whose name or symbol matches `name`.
    pub async fn get_companies(&self, name: &str) -> Vec<CompanyInfo> {
        debug!(name, "fetching companies");
        let config = self.current_config();

        self.invoker
            .invoke(
                Operation::Companies,
                config.call_timeout,
                async {
                    let request = self.shaper(&config)?.company_search(name);
                    self.fetch_json::<Vec<CompanyInfo>>(request).await
                },
                || fallback::companies(name),
            )
            .await
    }

    pub async fn get_instance_info(&self) -> InstanceInfo {
        debug!("fetching quotes service instance info");
        let config = self.current_config();

        self.invoker
            .invoke(
                Operation::InstanceInfo,
                config.call_timeout,
                async {
                    let request = self.shaper(&config)?.instance_info();
                    self.fetch_json::<InstanceInfo>(request).await
                },
                fallback::instance_info,
            )
            .await
    }

    /// Asks the downstream instance to shut itself down.
    ///
    /// Not guarded: no breaker, no fallback. The response body or the
    /// failure is handed back unchanged.
    pub async fn kill_instance(&self) -> Result<String, DownstreamError> {
        let config = self.current_config();
        let request = self.shaper(&config)?.kill_instance();
        warn!(service = %config.service, "requesting downstream instance shutdown");

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(DownstreamError::Status {
                status: response.status,
            });
        }
        Ok(response.body)
    }

    pub fn breaker_snapshots(&self) -> Vec<BreakerSnapshot> {
        self.invoker.registry().snapshots()
    }

    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        self.invoker.registry()
    }

    /// Replaces the downstream configuration. Calls already in flight keep
    /// the config they started with.
    pub fn refresh_config(&self, config: DownstreamConfig) {
        debug!(service = %config.service, protocol = %config.protocol, "refreshing downstream config");
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    pub fn current_config(&self) -> Arc<DownstreamConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn shaper(&self, config: &DownstreamConfig) -> Result<CallShaper, DownstreamError> {
        let address =
            self.resolver
                .resolve(&config.service)
                .ok_or_else(|| DownstreamError::Resolve {
                    service: config.service.clone(),
                })?;
        let timeout_ms = u64::try_from(config.call_timeout.as_millis()).unwrap_or(u64::MAX);
        Ok(CallShaper::new(config.protocol, &address, timeout_ms))
    }

    async fn fetch_quotes(
        &self,
        config: &DownstreamConfig,
        symbols: &SymbolSet,
    ) -> Result<Vec<Quote>, DownstreamError> {
        let Some(request) = self.shaper(config)?.batch_quotes(symbols) else {
            return Ok(Vec::new());
        };
        let quotes: Vec<Quote> = self.fetch_json(request).await?;
        debug!(count = quotes.len(), "received quotes");
        Ok(quotes)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, DownstreamError> {
        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(DownstreamError::Status {
                status: response.status,
            });
        }
        serde_json::from_str(&response.body).map_err(|error| DownstreamError::decode(&error))
    }
}

fn exactly_one(mut quotes: Vec<Quote>) -> Quote {
    if quotes.len() == 1 {
        if let Some(quote) = quotes.pop() {
            return quote;
        }
    }
    debug!(
        count = quotes.len(),
        "expected exactly one quote, returning an empty quote"
    );
    Quote::default()
}

/// Assembles a [`QuotesClient`].
///
/// Unset parts default to reqwest transport, [`DirectResolver`] and a fresh
/// [`BreakerRegistry`].
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use quotegate_core::{BreakerRegistry, DownstreamConfig, Protocol, QuotesClient, StaticResolver};
///
/// let registry = Arc::new(BreakerRegistry::default());
/// let client = QuotesClient::builder()
///     .with_config(DownstreamConfig::new(Protocol::Http, "quotes-service")?)
///     .with_resolver(Arc::new(StaticResolver::new().with_entry("quotes-service", "10.0.0.5:8080")))
///     .with_registry(registry)
///     .build();
/// ```
#[derive(Default)]
pub struct QuotesClientBuilder {
    config: Option<DownstreamConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    resolver: Option<Arc<dyn ServiceResolver>>,
    registry: Option<Arc<BreakerRegistry>>,
    breaker_config: Option<CircuitBreakerConfig>,
}

impl QuotesClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DownstreamConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ServiceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Shares an existing registry. Takes precedence over
    /// [`QuotesClientBuilder::with_breaker_config`].
    pub fn with_registry(mut self, registry: Arc<BreakerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_breaker_config(mut self, breaker_config: CircuitBreakerConfig) -> Self {
        self.breaker_config = Some(breaker_config);
        self
    }

    pub fn build(self) -> QuotesClient {
        let registry = self.registry.unwrap_or_else(|| {
            Arc::new(BreakerRegistry::new(self.breaker_config.unwrap_or_default()))
        });

        QuotesClient {
            config: RwLock::new(Arc::new(self.config.unwrap_or_default())),
            http_client: self
                .http_client
                .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new())),
            resolver: self.resolver.unwrap_or_else(|| Arc::new(DirectResolver)),
            invoker: ResilientInvoker::new(registry),
        }
    }
}
