//! Circuit breaker guarding calls to an unreliable dependency.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - HalfOpen: probing whether the dependency recovered
//!
//! # Transitions
//! ```text
//! Closed   → Open:     failure_threshold consecutive failures
//! Open     → HalfOpen: first call at/after open_timeout has elapsed
//! HalfOpen → Closed:   success_threshold consecutive successes
//! HalfOpen → Open:     any failure (timeout restarts)
//! ```
//!
//! `reset` and `force_open` are operator overrides and may jump directly to
//! Closed or Open. Every transition is logged and delivered to listeners
//! registered with [`CircuitBreaker::on_transition`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Tuning for a circuit breaker.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures (while closed) that open the circuit.
    pub failure_threshold: u32,
    /// Consecutive successes (while half-open) that close it again.
    pub success_threshold: u32,
    /// How long the circuit stays open before letting a trial call through.
    pub open_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_timeout: Duration::from_secs(60),
        }
    }
}

impl BreakerConfig {
    pub fn with_failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    pub fn with_success_threshold(mut self, n: u32) -> Self {
        self.success_threshold = n;
        self
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }
}

/// A state change, as reported to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Name of the breaker's dependency.
    pub dependency: String,
    pub from: BreakerState,
    pub to: BreakerState,
}

/// Point-in-time view of a breaker, for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub half_open_successes: u32,
    /// Remaining open time; `None` unless open.
    pub retry_after: Option<Duration>,
}

/// Returned instead of calling through while the circuit is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit open, next attempt in {}ms", retry_after.as_millis())]
pub struct CircuitOpen {
    pub retry_after: Duration,
}

type Listener = Arc<dyn Fn(&Transition) + Send + Sync>;

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    half_open_successes: u32,
    next_attempt: Option<Instant>,
    /// When the outstanding half-open trial call was admitted.
    trial_started: Option<Instant>,
}

/// Circuit breaker for one dependency.
///
/// Thread-safe; share it behind an `Arc` (usually inside a
/// [`ResilientClient`](super::ResilientClient)). Never share one breaker
/// between unrelated dependencies.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
    listeners: Mutex<Vec<Listener>>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                next_attempt: None,
                trial_started: None,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Register a callback invoked after every state change.
    pub fn on_transition(&self, listener: impl Fn(&Transition) + Send + Sync + 'static) {
        lock(&self.listeners).push(Arc::new(listener));
    }

    pub fn state(&self) -> BreakerState {
        lock(&self.inner).state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = lock(&self.inner);
        let retry_after = match inner.state {
            BreakerState::Open => inner
                .next_attempt
                .map(|at| at.saturating_duration_since(Instant::now())),
            _ => None,
        };
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            half_open_successes: inner.half_open_successes,
            retry_after,
        }
    }

    /// Ask permission to call the dependency.
    ///
    /// While open and before the timeout, fails with [`CircuitOpen`]. The
    /// first request at or after the timeout moves the breaker to half-open
    /// and is allowed through. While half-open only one call is admitted at
    /// a time; the next is admitted once its outcome is recorded, or after
    /// `open_timeout` if it never is.
    pub fn try_acquire(&self) -> Result<(), CircuitOpen> {
        let transition = {
            let mut inner = lock(&self.inner);
            let now = Instant::now();
            match inner.state {
                BreakerState::Closed => return Ok(()),
                BreakerState::HalfOpen => {
                    if let Some(started) = inner.trial_started {
                        if now < started + self.config.open_timeout {
                            return Err(CircuitOpen {
                                retry_after: Duration::ZERO,
                            });
                        }
                    }
                    inner.trial_started = Some(now);
                    return Ok(());
                }
                BreakerState::Open => match inner.next_attempt {
                    Some(at) if now < at => {
                        return Err(CircuitOpen {
                            retry_after: at - now,
                        });
                    }
                    _ => {
                        inner.half_open_successes = 0;
                        inner.trial_started = Some(now);
                        self.move_to(&mut inner, BreakerState::HalfOpen)
                    }
                },
            }
        };
        self.notify(transition);
        Ok(())
    }

    /// Report a successful call.
    pub fn record_success(&self) {
        let transition = {
            let mut inner = lock(&self.inner);
            match inner.state {
                BreakerState::Closed => {
                    inner.consecutive_failures = 0;
                    None
                }
                BreakerState::HalfOpen => {
                    inner.trial_started = None;
                    inner.half_open_successes += 1;
                    if inner.half_open_successes >= self.config.success_threshold.max(1) {
                        inner.consecutive_failures = 0;
                        inner.half_open_successes = 0;
                        inner.next_attempt = None;
                        self.move_to(&mut inner, BreakerState::Closed)
                    } else {
                        None
                    }
                }
                // A call admitted before a forced open; it says nothing about recovery.
                BreakerState::Open => None,
            }
        };
        self.notify(transition);
    }

    /// Report a failed call.
    pub fn record_failure(&self) {
        let transition = {
            let mut inner = lock(&self.inner);
            match inner.state {
                BreakerState::Closed => {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.config.failure_threshold.max(1) {
                        self.open(&mut inner)
                    } else {
                        None
                    }
                }
                BreakerState::HalfOpen => {
                    inner.trial_started = None;
                    inner.consecutive_failures += 1;
                    inner.half_open_successes = 0;
                    self.open(&mut inner)
                }
                BreakerState::Open => None,
            }
        };
        self.notify(transition);
    }

    /// Force the breaker closed and clear its counters.
    pub fn reset(&self) {
        let transition = {
            let mut inner = lock(&self.inner);
            inner.consecutive_failures = 0;
            inner.half_open_successes = 0;
            inner.next_attempt = None;
            inner.trial_started = None;
            self.move_to(&mut inner, BreakerState::Closed)
        };
        self.notify(transition);
    }

    /// Force the breaker open for a full `open_timeout`.
    pub fn force_open(&self) {
        let transition = {
            let mut inner = lock(&self.inner);
            inner.half_open_successes = 0;
            inner.trial_started = None;
            self.open(&mut inner)
        };
        self.notify(transition);
    }

    fn open(&self, inner: &mut Inner) -> Option<Transition> {
        inner.next_attempt = Some(Instant::now() + self.config.open_timeout);
        self.move_to(inner, BreakerState::Open)
    }

    fn move_to(&self, inner: &mut Inner, to: BreakerState) -> Option<Transition> {
        let from = inner.state;
        if from == to {
            return None;
        }
        inner.state = to;
        Some(Transition {
            dependency: self.name.clone(),
            from,
            to,
        })
    }

    /// Log and fan out a transition. Called with no locks held.
    fn notify(&self, transition: Option<Transition>) {
        let Some(transition) = transition else {
            return;
        };

        match transition.to {
            BreakerState::Open => warn!(
                dependency = %self.name,
                from = ?transition.from,
                open_for_secs = self.config.open_timeout.as_secs(),
                "circuit opened"
            ),
            _ => info!(
                dependency = %self.name,
                from = ?transition.from,
                to = ?transition.to,
                "circuit state changed"
            ),
        }

        let listeners: Vec<Listener> = lock(&self.listeners).clone();
        for listener in listeners {
            listener(&transition);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
