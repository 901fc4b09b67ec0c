//! Behavior-driven tests for the resilient quote gateway.
//!
//! These tests drive `QuotesClient` against a scripted downstream and check
//! what callers observe: records passed through, fallbacks served, and which
//! calls actually reach the wire.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use quotegate_core::{
    BreakerRegistry, CircuitBreakerConfig, CircuitState, DownstreamConfig, DownstreamError,
    HttpClient, HttpError, HttpRequest, HttpResponse, Operation, Protocol, Quote, QuoteStatus,
    QuotesClient, StaticResolver, SymbolSet,
};
use serde_json::json;

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, HttpError> + Send + Sync;

struct ScriptedHttpClient {
    responder: Box<Responder>,
    delay: Option<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    fn new(
        responder: impl Fn(&HttpRequest) -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            delay: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn replying(body: serde_json::Value) -> Arc<Self> {
        let body = body.to_string();
        Self::new(move |_| Ok(HttpResponse::ok_json(body.clone())))
    }

    fn failing_with_status(status: u16) -> Arc<Self> {
        Self::new(move |_| Ok(HttpResponse::with_status(status, "upstream error")))
    }

    fn slow(delay: Duration, body: serde_json::Value) -> Arc<Self> {
        let body = body.to_string();
        Arc::new(Self {
            responder: Box::new(move |_| Ok(HttpResponse::ok_json(body.clone()))),
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn recorded_paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .iter()
            .map(|request| request.path_and_query().to_owned())
            .collect()
    }

    fn recorded_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    fn call_count(&self) -> usize {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .len()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = (self.responder)(&request);
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            response
        })
    }
}

const BUDGET: Duration = Duration::from_millis(200);

fn downstream_config() -> DownstreamConfig {
    DownstreamConfig::new(Protocol::Http, "quotes:8080")
        .expect("valid config")
        .with_call_timeout(BUDGET)
}

fn client_with(http: Arc<ScriptedHttpClient>, breaker: CircuitBreakerConfig) -> QuotesClient {
    QuotesClient::builder()
        .with_config(downstream_config())
        .with_http_client(http)
        .with_breaker_config(breaker)
        .build()
}

fn client(http: Arc<ScriptedHttpClient>) -> QuotesClient {
    client_with(http, CircuitBreakerConfig::default())
}

fn quote_json(symbol: &str, price: f64) -> serde_json::Value {
    json!({ "symbol": symbol, "name": format!("{symbol} Inc"), "lastPrice": price, "volume": 1000 })
}

// =============================================================================
// Single quote lookups
// =============================================================================

#[tokio::test]
async fn when_downstream_returns_one_record_user_gets_it_unmodified() {
    // Given: a healthy downstream with one match
    let http = ScriptedHttpClient::replying(json!([quote_json("ABC", 12.5)]));
    let client = client(http.clone());

    // When: a single quote is requested
    let quote = client.get_quote("ABC").await;

    // Then: the record is passed through and the call used the batch endpoint
    assert_eq!(
        serde_json::to_value(&quote).expect("quote should encode"),
        quote_json("ABC", 12.5)
    );
    assert_eq!(quote.status, None);
    assert_eq!(http.recorded_paths(), vec!["/v1/quotes?q=ABC"]);
}

#[tokio::test]
async fn when_record_has_epoch_timestamp_and_unknown_fields_user_gets_it_verbatim() {
    // Given: a record whose opaque fields use shapes the gateway never interprets
    let record = json!({
        "symbol": "ABC",
        "lastPrice": 1.0,
        "timestamp": 1_700_000_000_000_u64,
        "volume": "1.2M",
        "exchangeLatency": { "ms": 12 }
    });
    let http = ScriptedHttpClient::replying(json!([record.clone()]));
    let client = client(http);

    // When
    let quote = client.get_quote("ABC").await;

    // Then: it is a success, not a decode fallback
    assert!(!quote.is_failed());
    assert_eq!(serde_json::to_value(&quote).expect("quote should encode"), record);
    assert_eq!(
        client.registry().breaker(Operation::Quote).stats().window_failures,
        0
    );
}

#[tokio::test]
async fn when_downstream_returns_no_records_user_gets_empty_quote() {
    let client = client(ScriptedHttpClient::replying(json!([])));

    let quote = client.get_quote("ABC").await;

    assert_eq!(quote, Quote::default());
    assert_eq!(quote.symbol, "");
    assert_eq!(quote.status, None);
}

#[tokio::test]
async fn when_downstream_returns_several_records_user_gets_empty_quote_not_failed() {
    let client = client(ScriptedHttpClient::replying(json!([
        quote_json("ABC", 1.0),
        quote_json("ABC.L", 2.0)
    ])));

    let quote = client.get_quote("ABC").await;

    assert_eq!(quote, Quote::default());
    assert!(!quote.is_failed(), "cardinality anomaly is not a downstream failure");
}

#[tokio::test]
async fn cardinality_anomaly_counts_as_successful_call() {
    let client = client_with(
        ScriptedHttpClient::replying(json!([])),
        CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        },
    );

    client.get_quote("ABC").await;

    let breaker = client.registry().breaker(Operation::Quote);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[tokio::test]
async fn when_downstream_errors_user_gets_failed_quote_for_symbol() {
    let client = client(ScriptedHttpClient::failing_with_status(503));

    let quote = client.get_quote("ABC").await;

    assert_eq!(quote, Quote::failed("ABC"));
    assert_eq!(quote.status, Some(QuoteStatus::Failed));
}

#[tokio::test]
async fn when_downstream_is_unreachable_user_gets_failed_quote() {
    let client = client(ScriptedHttpClient::new(|_| {
        Err(HttpError::new("connection failed: refused"))
    }));

    assert_eq!(client.get_quote("XYZ").await, Quote::failed("XYZ"));
}

#[tokio::test]
async fn when_downstream_sends_garbage_user_gets_failed_quote() {
    let http = ScriptedHttpClient::new(|_| Ok(HttpResponse::ok_json("<html>oops</html>")));
    let client = client(http);

    assert_eq!(client.get_quote("ABC").await, Quote::failed("ABC"));
}

// =============================================================================
// Breaker open and timeouts
// =============================================================================

#[tokio::test]
async fn when_quote_breaker_is_open_fallback_is_served_without_a_call() {
    // Given: the single-quote breaker forced open
    let http = ScriptedHttpClient::replying(json!([quote_json("ABC", 12.5)]));
    let client = client(http.clone());
    client.registry().breaker(Operation::Quote).force_open();

    // When: a quote is requested
    let started = Instant::now();
    let quote = client.get_quote("ABC").await;

    // Then: the FAILED placeholder comes back immediately and nothing hits the wire
    assert!(started.elapsed() < BUDGET);
    assert_eq!(quote, Quote::failed("ABC"));
    assert_eq!(http.call_count(), 0);
}

#[tokio::test]
async fn slow_downstream_is_cut_off_at_the_call_budget() {
    let http = ScriptedHttpClient::slow(Duration::from_secs(5), json!([quote_json("ABC", 1.0)]));
    let client = client(http);

    let started = Instant::now();
    let quote = client.get_quote("ABC").await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(quote, Quote::failed("ABC"));
    assert_eq!(
        client.registry().breaker(Operation::Quote).consecutive_failures(),
        1
    );
}

#[tokio::test]
async fn repeated_failures_open_breaker_and_stop_downstream_traffic() {
    // Given: a breaker that opens after two failures
    let http = ScriptedHttpClient::failing_with_status(500);
    let client = client_with(
        http.clone(),
        CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_secs(60),
            ..CircuitBreakerConfig::default()
        },
    );

    // When: several lookups fail
    for _ in 0..5 {
        assert_eq!(client.get_quote("ABC").await, Quote::failed("ABC"));
    }

    // Then: only the first two reached the downstream
    assert_eq!(http.call_count(), 2);
    assert_eq!(
        client.registry().breaker(Operation::Quote).state(),
        CircuitState::Open
    );
}

#[tokio::test]
async fn breaker_recovers_through_half_open_trial() {
    // Given: a downstream that fails until it is marked healthy
    let healthy = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&healthy);
    let http = ScriptedHttpClient::new(move |_| {
        if flag.load(Ordering::SeqCst) {
            Ok(HttpResponse::ok_json(json!([quote_json("ABC", 3.0)]).to_string()))
        } else {
            Ok(HttpResponse::with_status(502, "bad gateway"))
        }
    });
    let client = client_with(
        http.clone(),
        CircuitBreakerConfig {
            failure_threshold: 1,
            open_timeout: Duration::from_millis(50),
            ..CircuitBreakerConfig::default()
        },
    );

    client.get_quote("ABC").await;
    assert_eq!(
        client.registry().breaker(Operation::Quote).state(),
        CircuitState::Open
    );

    // When: the downstream recovers and the cooldown passes
    healthy.store(true, Ordering::SeqCst);
    assert!(client.get_quote("ABC").await.is_failed(), "still cooling down");
    assert_eq!(http.call_count(), 1);
    tokio::time::sleep(Duration::from_millis(70)).await;

    // Then: the trial call goes through and closes the breaker
    let quote = client.get_quote("ABC").await;
    assert_eq!(quote.symbol, "ABC");
    assert_eq!(quote.field("lastPrice"), Some(&json!(3.0)));
    assert_eq!(
        client.registry().breaker(Operation::Quote).state(),
        CircuitState::Closed
    );
}

// =============================================================================
// Batch lookups
// =============================================================================

#[tokio::test]
async fn empty_symbol_set_never_reaches_downstream() {
    let http = ScriptedHttpClient::replying(json!([quote_json("ABC", 1.0)]));
    let client = client(http.clone());

    let quotes = client.get_multiple_quotes(&SymbolSet::default()).await;

    assert!(quotes.is_empty());
    assert_eq!(http.call_count(), 0);
}

#[tokio::test]
async fn batch_results_are_limited_to_requested_symbols() {
    // Given: a downstream that knows only some of the requested symbols
    let http = ScriptedHttpClient::replying(json!([quote_json("MSFT", 410.0), quote_json("AAPL", 190.0)]));
    let client = client(http.clone());
    let requested = SymbolSet::new(["AAPL", "NOPE", "MSFT"]);

    // When: the batch is fetched
    let quotes = client.get_multiple_quotes(&requested).await;

    // Then: every returned symbol was asked for, in one call preserving order
    assert_eq!(quotes.len(), 2);
    assert!(quotes
        .iter()
        .all(|quote| requested.iter().any(|symbol| symbol == quote.symbol)));
    assert_eq!(http.recorded_paths(), vec!["/v1/quotes?q=AAPL,NOPE,MSFT"]);
}

#[tokio::test]
async fn comma_list_issues_one_batch_call() {
    let http = ScriptedHttpClient::replying(json!([quote_json("ABC", 1.0), quote_json("XYZ", 2.0)]));
    let client = client(http.clone());

    let quotes = client.get_quotes("ABC,XYZ").await;

    assert_eq!(quotes.len(), 2);
    assert_eq!(http.recorded_paths(), vec!["/v1/quotes?q=ABC,XYZ"]);
}

#[tokio::test]
async fn single_token_list_matches_single_quote_lookup() {
    let body = json!([quote_json("ABC", 7.0)]);
    let via_list = client(ScriptedHttpClient::replying(body.clone()))
        .get_quotes("ABC")
        .await;
    let via_single = client(ScriptedHttpClient::replying(body)).get_quote("ABC").await;

    assert_eq!(via_list, vec![via_single]);
}

#[tokio::test]
async fn single_token_list_uses_single_quote_fallback() {
    let client = client(ScriptedHttpClient::failing_with_status(500));

    assert_eq!(client.get_quotes("ABC").await, vec![Quote::failed("ABC")]);
}

#[tokio::test]
async fn trailing_comma_list_is_treated_as_single_symbol() {
    // Given: a failing downstream
    let http = ScriptedHttpClient::failing_with_status(500);
    let client = client(http.clone());

    // When: the list ends with a stray comma
    let quotes = client.get_quotes("ABC,").await;

    // Then: it takes the single quote path, breaker included
    assert_eq!(quotes, vec![Quote::failed("ABC")]);
    assert_eq!(http.recorded_paths(), vec!["/v1/quotes?q=ABC"]);
    assert_eq!(
        client.registry().breaker(Operation::Quote).consecutive_failures(),
        1
    );
    assert_eq!(
        client.registry().breaker(Operation::Quotes).consecutive_failures(),
        0
    );
}

#[tokio::test]
async fn failed_batch_degrades_to_empty_list() {
    let http = ScriptedHttpClient::failing_with_status(500);
    let client = client(http.clone());

    let quotes = client.get_quotes("ABC,XYZ").await;

    assert!(quotes.is_empty(), "batch fallback must not fabricate records");
    assert_eq!(http.call_count(), 1);
    assert_eq!(
        client.registry().breaker(Operation::Quotes).consecutive_failures(),
        1
    );
    assert_eq!(
        client.registry().breaker(Operation::Quote).consecutive_failures(),
        0
    );
}

// =============================================================================
// Companies and instance info
// =============================================================================

#[tokio::test]
async fn company_search_passes_term_as_path_segment() {
    let http = ScriptedHttpClient::replying(json!([
        { "symbol": "PVTL", "name": "Pivotal Software", "exchange": "NYSE" }
    ]));
    let client = client(http.clone());

    let companies = client.get_companies("Pivotal").await;

    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].symbol.as_deref(), Some("PVTL"));
    assert_eq!(http.recorded_paths(), vec!["/v1/company/Pivotal"]);
}

#[tokio::test]
async fn company_search_with_no_matches_is_empty() {
    let client = client(ScriptedHttpClient::replying(json!([])));
    assert!(client.get_companies("zzz").await.is_empty());
}

#[tokio::test]
async fn failing_company_search_does_not_trip_quote_breakers() {
    // Given: company search is broken while quotes are healthy
    let http = ScriptedHttpClient::new(|request| {
        if request.path_and_query().starts_with("/v1/company/") {
            Ok(HttpResponse::with_status(500, "boom"))
        } else {
            Ok(HttpResponse::ok_json(
                json!([{ "symbol": "ABC", "lastPrice": 1.0 }]).to_string(),
            ))
        }
    });
    let client = Arc::new(client_with(
        http,
        CircuitBreakerConfig {
            failure_threshold: 1,
            open_timeout: Duration::from_secs(60),
            ..CircuitBreakerConfig::default()
        },
    ));

    // When: searches and quotes run concurrently
    let searches = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            for _ in 0..3 {
                assert!(client.get_companies("abc").await.is_empty());
            }
        })
    };
    let quotes = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let mut results = Vec::new();
            for _ in 0..3 {
                results.push(client.get_quote("ABC").await);
            }
            results
        })
    };
    searches.await.expect("search task should finish");
    let quote_results = quotes.await.expect("quote task should finish");

    // Then: only the companies breaker opened
    assert!(quote_results.iter().all(|quote| quote.symbol == "ABC" && !quote.is_failed()));
    assert_eq!(
        client.registry().breaker(Operation::Companies).state(),
        CircuitState::Open
    );
    assert_eq!(
        client.registry().breaker(Operation::Quote).state(),
        CircuitState::Closed
    );
}

#[tokio::test]
async fn instance_info_is_passed_through_when_healthy() {
    let http = ScriptedHttpClient::replying(json!({
        "applicationName": "quotes-service",
        "instanceIndex": "3",
        "instanceAddr": "10.0.0.7",
        "containerAddr": "172.17.0.2",
        "port": 8080
    }));
    let client = client(http.clone());

    let info = client.get_instance_info().await;

    assert_eq!(info.len(), 5);
    assert_eq!(info.get("instanceIndex"), Some(&json!("3")));
    assert_eq!(http.recorded_paths(), vec!["/v1/basics"]);
}

#[tokio::test]
async fn instance_info_failure_yields_four_key_placeholder() {
    let client = client(ScriptedHttpClient::new(|_| Err(HttpError::new("refused"))));

    let info = client.get_instance_info().await;

    assert_eq!(
        serde_json::to_value(&info).expect("info should encode"),
        json!({
            "applicationName": "",
            "instanceIndex": "0",
            "instanceAddr": "0.0.0.0",
            "containerAddr": "0.0.0.0"
        })
    );
}

// =============================================================================
// Unguarded kill and configuration
// =============================================================================

#[tokio::test]
async fn kill_returns_downstream_body_as_is() {
    let http = ScriptedHttpClient::new(|_| Ok(HttpResponse::ok_json("{\"applicationName\":\"quotes\"}")));
    let client = client(http.clone());

    let body = client.kill_instance().await.expect("kill should succeed");

    assert_eq!(body, "{\"applicationName\":\"quotes\"}");
    assert_eq!(http.recorded_paths(), vec!["/v1/basics?doit=true"]);
}

#[tokio::test]
async fn kill_failures_surface_and_leave_breakers_alone() {
    let client = client_with(
        ScriptedHttpClient::failing_with_status(500),
        CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        },
    );

    for _ in 0..3 {
        let error = client.kill_instance().await.expect_err("kill should fail");
        assert_eq!(error, DownstreamError::Status { status: 500 });
    }

    assert!(client
        .breaker_snapshots()
        .iter()
        .all(|snapshot| snapshot.stats.state == CircuitState::Closed));
}

#[tokio::test]
async fn clients_sharing_a_registry_share_breaker_state() {
    let registry = Arc::new(BreakerRegistry::new(CircuitBreakerConfig {
        failure_threshold: 1,
        open_timeout: Duration::from_secs(60),
        ..CircuitBreakerConfig::default()
    }));
    let failing = QuotesClient::builder()
        .with_config(downstream_config())
        .with_http_client(ScriptedHttpClient::failing_with_status(500))
        .with_registry(Arc::clone(&registry))
        .build();
    let healthy_http = ScriptedHttpClient::replying(json!([quote_json("ABC", 1.0)]));
    let healthy = QuotesClient::builder()
        .with_config(downstream_config())
        .with_http_client(healthy_http.clone())
        .with_registry(registry)
        .build();

    failing.get_quote("ABC").await;

    assert_eq!(healthy.get_quote("ABC").await, Quote::failed("ABC"));
    assert_eq!(healthy_http.call_count(), 0);
}

#[tokio::test]
async fn refreshed_address_is_used_by_the_next_call() {
    let resolver = Arc::new(StaticResolver::new().with_entry("quotes-service", "10.0.0.5:8080"));
    let http = ScriptedHttpClient::replying(json!([]));
    let client = QuotesClient::builder()
        .with_config(
            DownstreamConfig::new(Protocol::Http, "quotes-service")
                .expect("valid config")
                .with_call_timeout(BUDGET),
        )
        .with_http_client(http.clone())
        .with_resolver(resolver.clone())
        .build();

    client.get_companies("a").await;
    resolver.insert("quotes-service", "10.0.0.6:8080");
    client.refresh_config(
        DownstreamConfig::new(Protocol::Https, "quotes-service")
            .expect("valid config")
            .with_call_timeout(BUDGET),
    );
    client.get_companies("b").await;

    assert_eq!(
        http.recorded_urls(),
        vec![
            "http://10.0.0.5:8080/v1/company/a",
            "https://10.0.0.6:8080/v1/company/b"
        ]
    );
}

#[tokio::test]
async fn unresolvable_service_degrades_like_any_failure() {
    let http = ScriptedHttpClient::replying(json!([]));
    let client = QuotesClient::builder()
        .with_config(downstream_config())
        .with_http_client(http.clone())
        .with_resolver(Arc::new(StaticResolver::new()))
        .build();

    assert_eq!(client.get_quote("ABC").await, Quote::failed("ABC"));
    assert!(client.get_companies("abc").await.is_empty());
    assert_eq!(http.call_count(), 0);
}
