use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Runtime circuit state for one guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Failure ratio over the rolling window that opens the circuit.
    pub failure_rate: f64,
    /// Outcomes required in the window before `failure_rate` applies.
    pub minimum_calls: u32,
    /// Number of most recent outcomes kept. Zero disables rate tracking.
    pub window_size: u32,
    /// Cooldown before a trial call is let through.
    pub open_timeout: Duration,
    /// Trial calls allowed in flight while half-open.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_rate: 0.5,
            minimum_calls: 10,
            window_size: 20,
            open_timeout: Duration::from_secs(5),
            half_open_max_calls: 1,
        }
    }
}

/// Point-in-time view of a breaker, for operators and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerStats {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub window_calls: u32,
    pub window_failures: u32,
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    // true marks a failed call
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_in_flight: u32,
    forced_open: bool,
    // bumped on every open/close so late permits can be told apart
    generation: u64,
}

impl Default for CircuitInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            window: VecDeque::new(),
            opened_at: None,
            half_open_in_flight: 0,
            forced_open: false,
            generation: 0,
        }
    }
}

impl CircuitInner {
    fn window_failures(&self) -> u32 {
        self.window.iter().filter(|failed| **failed).count() as u32
    }

    fn trip(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.half_open_in_flight = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.window.clear();
        self.opened_at = None;
        self.half_open_in_flight = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    fn is_stale(&self, generation: Option<u64>) -> bool {
        generation.is_some_and(|generation| generation != self.generation)
    }
}

/// Thread-safe circuit breaker guarding a single downstream operation.
///
/// The lock is only held while counters are updated, never across the
/// guarded call itself.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitInner::default()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Asks to run one guarded call. `None` means short-circuit.
    ///
    /// The returned permit must be settled with [`CallPermit::success`] or
    /// [`CallPermit::failure`]; dropping it unsettled frees any half-open
    /// trial slot without recording an outcome.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            let cooled_down = !inner.forced_open
                && inner
                    .opened_at
                    .map(|opened_at| opened_at.elapsed() >= self.config.open_timeout)
                    .unwrap_or(false);
            if !cooled_down {
                return None;
            }
            inner.state = CircuitState::HalfOpen;
            inner.opened_at = None;
            inner.half_open_in_flight = 0;
        }

        let state = inner.state;
        let generation = inner.generation;
        match state {
            CircuitState::Closed => Some(CallPermit::new(self, false, generation)),
            CircuitState::HalfOpen if inner.half_open_in_flight < self.config.half_open_max_calls => {
                inner.half_open_in_flight += 1;
                Some(CallPermit::new(self, true, generation))
            }
            CircuitState::HalfOpen | CircuitState::Open => None,
        }
    }

    /// Whether a call would currently be let through. Does not take a
    /// trial slot.
    pub fn allow_request(&self) -> bool {
        let inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                inner.half_open_in_flight < self.config.half_open_max_calls
            }
            CircuitState::Open => {
                !inner.forced_open
                    && inner
                        .opened_at
                        .map(|opened_at| opened_at.elapsed() >= self.config.open_timeout)
                        .unwrap_or(false)
            }
        }
    }

    pub fn record_success(&self) {
        self.on_success(false, None);
    }

    pub fn record_failure(&self) {
        self.on_failure(false, None);
    }

    /// `generation` is the permit's stamp; outcomes from an earlier
    /// open/close cycle are ignored.
    fn on_success(&self, trial: bool, generation: Option<u64>) {
        let mut inner = self.lock();
        if inner.is_stale(generation) {
            return;
        }
        match (inner.state, trial) {
            (CircuitState::HalfOpen, true) => inner.close(),
            (CircuitState::Closed, _) => {
                inner.consecutive_failures = 0;
                self.push_outcome(&mut inner, false);
            }
            // late result from a call admitted before the circuit opened
            _ => {}
        }
    }

    fn on_failure(&self, trial: bool, generation: Option<u64>) {
        let mut inner = self.lock();
        if inner.is_stale(generation) {
            return;
        }
        match (inner.state, trial) {
            (CircuitState::HalfOpen, true) => inner.trip(),
            (CircuitState::Closed, _) => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                self.push_outcome(&mut inner, true);
                if self.should_trip(&inner) {
                    inner.trip();
                }
            }
            _ => {}
        }
    }

    fn release_trial(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen && inner.generation == generation {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
        }
    }

    fn push_outcome(&self, inner: &mut CircuitInner, failed: bool) {
        let capacity = self.config.window_size as usize;
        if capacity == 0 {
            return;
        }
        while inner.window.len() >= capacity {
            inner.window.pop_front();
        }
        inner.window.push_back(failed);
    }

    fn should_trip(&self, inner: &CircuitInner) -> bool {
        if inner.consecutive_failures >= self.config.failure_threshold {
            return true;
        }
        let calls = inner.window.len() as u32;
        if calls == 0 || calls < self.config.minimum_calls {
            return false;
        }
        f64::from(inner.window_failures()) / f64::from(calls) >= self.config.failure_rate
    }

    /// Holds the circuit open until [`CircuitBreaker::reset`] is called.
    pub fn force_open(&self) {
        let mut inner = self.lock();
        inner.trip();
        inner.forced_open = true;
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.close();
        inner.forced_open = false;
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        BreakerStats {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            window_calls: inner.window.len() as u32,
            window_failures: inner.window_failures(),
        }
    }
}

/// Admission ticket for one guarded call.
#[derive(Debug)]
#[must_use = "a permit must be settled with success() or failure()"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    generation: u64,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool, generation: u64) -> Self {
        Self {
            breaker,
            trial,
            generation,
            settled: false,
        }
    }

    /// True when this call is a half-open probe.
    pub const fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.trial, Some(self.generation));
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.trial, Some(self.generation));
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial(self.generation);
        }
    }
}
