//! Retrying, circuit-broken wrapper around one upstream dependency.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::backoff::{BackoffPolicy, JitterSource, RandomJitter};
use super::breaker::{BreakerConfig, CircuitBreaker};
use super::retry::{RetryClass, Retryable};

/// Retry tuning.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (so at most `max_retries + 1` calls).
    pub max_retries: u32,
    /// Delay between attempts.
    pub backoff: BackoffPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff = BackoffPolicy::new(base, max);
        self
    }
}

/// Failure of a resilient call.
#[derive(Debug, thiserror::Error)]
pub enum ResilientError<E> {
    /// The breaker refused the call; the dependency was not contacted.
    #[error("circuit open for {dependency}, next attempt in {}ms", retry_after.as_millis())]
    CircuitOpen {
        dependency: String,
        retry_after: Duration,
    },

    /// The dependency failed and retrying was pointless or exhausted.
    #[error("{dependency} failed after {attempts} attempt(s): {source}")]
    Dependency {
        dependency: String,
        attempts: u32,
        #[source]
        source: E,
    },
}

impl<E> ResilientError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilientError::CircuitOpen { .. })
    }

    /// Name of the dependency that failed.
    pub fn dependency(&self) -> &str {
        match self {
            ResilientError::CircuitOpen { dependency, .. }
            | ResilientError::Dependency { dependency, .. } => dependency,
        }
    }

    /// How many times the dependency was actually called.
    pub fn attempts(&self) -> u32 {
        match self {
            ResilientError::CircuitOpen { .. } => 0,
            ResilientError::Dependency { attempts, .. } => *attempts,
        }
    }

    /// The final underlying error, if the dependency was called.
    pub fn into_source(self) -> Option<E> {
        match self {
            ResilientError::CircuitOpen { .. } => None,
            ResilientError::Dependency { source, .. } => Some(source),
        }
    }
}

/// Composes a [`CircuitBreaker`] with bounded, backed-off retries.
///
/// Works with any async operation; one instance per upstream so that
/// failures in one never open the circuit for another.
pub struct ResilientClient {
    name: String,
    retry: RetryConfig,
    breaker: CircuitBreaker,
    jitter: Arc<dyn JitterSource>,
}

impl fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("name", &self.name)
            .field("retry", &self.retry)
            .field("breaker", &self.breaker)
            .finish()
    }
}

impl ResilientClient {
    pub fn new(name: impl Into<String>, retry: RetryConfig, breaker: BreakerConfig) -> Self {
        let name = name.into();
        Self {
            breaker: CircuitBreaker::new(name.clone(), breaker),
            name,
            retry,
            jitter: Arc::new(RandomJitter),
        }
    }

    /// Replace the jitter source (tests use a fixed one).
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run `op` under the breaker, retrying transient failures.
    ///
    /// The breaker is consulted once up front and told the outcome once at
    /// the end, so one logical request counts as one success or failure no
    /// matter how many attempts it took.
    pub async fn call<T, E, F, Fut>(&self, mut op: F) -> Result<T, ResilientError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        if let Err(open) = self.breaker.try_acquire() {
            debug!(
                dependency = %self.name,
                retry_after_ms = open.retry_after.as_millis() as u64,
                "call rejected, circuit open"
            );
            return Err(ResilientError::CircuitOpen {
                dependency: self.name.clone(),
                retry_after: open.retry_after,
            });
        }

        let mut retry = 0u32;
        loop {
            match op().await {
                Ok(value) => {
                    if retry > 0 {
                        debug!(dependency = %self.name, attempts = retry + 1, "call recovered");
                    }
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(error) => {
                    let class = error.retry_class();
                    if class == RetryClass::Fatal || retry >= self.retry.max_retries {
                        warn!(
                            dependency = %self.name,
                            attempts = retry + 1,
                            retryable = class == RetryClass::Retryable,
                            %error,
                            "call failed"
                        );
                        self.breaker.record_failure();
                        return Err(ResilientError::Dependency {
                            dependency: self.name.clone(),
                            attempts: retry + 1,
                            source: error,
                        });
                    }

                    let delay = self.retry.backoff.delay(retry, self.jitter.as_ref());
                    debug!(
                        dependency = %self.name,
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}
