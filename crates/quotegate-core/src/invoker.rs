use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{DownstreamError, FallbackReason};
use crate::registry::{BreakerRegistry, Operation};

/// Which path produced an invocation's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Fallback(FallbackReason),
}

/// Value returned by a guarded call together with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<T> {
    pub value: T,
    pub outcome: Outcome,
}

impl<T> Invocation<T> {
    fn success(value: T) -> Self {
        Self {
            value,
            outcome: Outcome::Success,
        }
    }

    fn fallback(value: T, reason: FallbackReason) -> Self {
        Self {
            value,
            outcome: Outcome::Fallback(reason),
        }
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self.outcome, Outcome::Fallback(_))
    }
}

/// Runs downstream calls under their operation's circuit breaker and a
/// bounded timeout, substituting the fallback on any failure.
#[derive(Debug, Clone, Default)]
pub struct ResilientInvoker {
    registry: Arc<BreakerRegistry>,
}

impl ResilientInvoker {
    pub fn new(registry: Arc<BreakerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BreakerRegistry> {
        &self.registry
    }

    /// Runs `primary` unless the breaker is open; never fails.
    pub async fn invoke<T, P, F>(
        &self,
        operation: Operation,
        budget: Duration,
        primary: P,
        fallback: F,
    ) -> T
    where
        P: Future<Output = Result<T, DownstreamError>>,
        F: FnOnce() -> T,
    {
        self.invoke_traced(operation, budget, primary, fallback)
            .await
            .value
    }

    /// Same as [`ResilientInvoker::invoke`], also reporting the path taken.
    pub async fn invoke_traced<T, P, F>(
        &self,
        operation: Operation,
        budget: Duration,
        primary: P,
        fallback: F,
    ) -> Invocation<T>
    where
        P: Future<Output = Result<T, DownstreamError>>,
        F: FnOnce() -> T,
    {
        let span = info_span!("invoke", operation = operation.as_str(), call_id = %Uuid::new_v4());

        async move {
            let breaker = self.registry.breaker(operation);
            let Some(permit) = breaker.try_acquire() else {
                debug!("circuit open, serving fallback without a downstream call");
                return Invocation::fallback(fallback(), FallbackReason::BreakerOpen);
            };

            let started = Instant::now();
            let result = match tokio::time::timeout(budget, primary).await {
                Ok(result) => result,
                Err(_) => Err(DownstreamError::Timeout {
                    after_ms: saturating_millis(budget),
                }),
            };
            let elapsed_ms = saturating_millis(started.elapsed());

            match result {
                Ok(value) => {
                    permit.success();
                    debug!(elapsed_ms, "downstream call succeeded");
                    Invocation::success(value)
                }
                Err(error) => {
                    permit.failure();
                    let reason = error.reason();
                    warn!(
                        elapsed_ms,
                        reason = reason.as_str(),
                        breaker = ?breaker.state(),
                        "downstream call failed, serving fallback: {error}"
                    );
                    Invocation::fallback(fallback(), reason)
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
