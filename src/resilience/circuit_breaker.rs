use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation.
    Closed,
    /// Fast-fail until the cooldown elapses.
    Open,
    /// One trial call is permitted.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    /// Every call request, rejected ones included.
    pub total_calls: u64,
    pub failed_calls: u64,
    pub rejected_calls: u64,
    pub consecutive_failures: u32,
    pub opened_at: Option<SystemTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub stats: CircuitStats,
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold (at least 1)
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Set the cooldown between opening and the first half-open trial
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

impl From<&crate::config::BreakerConfig> for CircuitBreakerConfig {
    fn from(cfg: &crate::config::BreakerConfig) -> Self {
        Self::new()
            .with_failure_threshold(cfg.failure_threshold)
            .with_cooldown(Duration::from_secs(cfg.cooldown_secs))
    }
}

#[derive(Debug)]
struct State {
    state: CircuitState,
    stats: CircuitStats,
    opened_instant: Option<Instant>,
    trial_in_flight: bool,
    /// Bumped on every trip and reset; outcomes from older permits only touch counters.
    generation: u64,
}

/// Three-state circuit breaker guarding calls to a failure-prone dependency.
///
/// - Closed: calls pass; `failure_threshold` consecutive failures open it
/// - Open: calls are rejected with [`Error::CircuitOpen`] until `cooldown` elapses
/// - Half-open: exactly one trial call passes; success closes, failure re-opens
///
/// The mutex is held only for state checks and bookkeeping, never while the
/// guarded operation runs.
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    state: Mutex<State>,
}

/// Admission ticket returned by [`CircuitBreaker::try_acquire`].
///
/// Record the outcome with [`CallPermit::success`] or [`CallPermit::failure`].
/// A permit dropped without an outcome (e.g. the query was cancelled) records
/// nothing and frees the half-open trial slot.
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    generation: u64,
    completed: bool,
}

impl CallPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.completed = true;
        self.breaker.on_success(self.trial, self.generation);
    }

    pub fn failure(mut self) {
        self.completed = true;
        self.breaker.on_failure(self.trial, self.generation);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed && self.trial {
            let mut st = self.breaker.lock();
            if st.generation == self.generation {
                st.trial_in_flight = false;
                debug!("circuit breaker trial abandoned; slot released");
            }
        }
    }
}

impl CircuitBreaker {
    pub fn new(cfg: CircuitBreakerConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(State {
                state: CircuitState::Closed,
                stats: CircuitStats::default(),
                opened_instant: None,
                trial_in_flight: false,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Bookkeeping is never left half-written, so a poisoned lock is still consistent.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Ask for admission. Performs the OPEN -> HALF_OPEN transition when the
    /// cooldown has elapsed; the caller that performs it becomes the trial.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>> {
        let mut st = self.lock();
        st.stats.total_calls += 1;

        if st.state == CircuitState::Open {
            let elapsed = st
                .opened_instant
                .map(|t| t.elapsed())
                .unwrap_or(self.cfg.cooldown);
            if elapsed >= self.cfg.cooldown {
                st.state = CircuitState::HalfOpen;
                st.trial_in_flight = false;
                debug!("circuit breaker half-open");
            } else {
                st.stats.rejected_calls += 1;
                let remaining = self.cfg.cooldown - elapsed;
                return Err(Error::CircuitOpen {
                    retry_after_ms: remaining.as_millis() as u64,
                });
            }
        }

        match st.state {
            CircuitState::Closed => Ok(CallPermit {
                breaker: self,
                trial: false,
                generation: st.generation,
                completed: false,
            }),
            CircuitState::HalfOpen if !st.trial_in_flight => {
                st.trial_in_flight = true;
                Ok(CallPermit {
                    breaker: self,
                    trial: true,
                    generation: st.generation,
                    completed: false,
                })
            }
            _ => {
                st.stats.rejected_calls += 1;
                Err(Error::CircuitOpen {
                    retry_after_ms: self.cfg.cooldown.as_millis() as u64,
                })
            }
        }
    }

    /// Run `op` under the breaker. While open (or while another caller holds
    /// the half-open trial) `op` is not invoked and `Error::CircuitOpen` is returned.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let permit = self.try_acquire()?;
        match op().await {
            Ok(value) => {
                permit.success();
                Ok(value)
            }
            Err(e) => {
                permit.failure();
                Err(e)
            }
        }
    }

    fn on_success(&self, trial: bool, generation: u64) {
        let mut st = self.lock();
        if generation != st.generation {
            // Admitted before the last trip or reset.
            return;
        }
        st.stats.consecutive_failures = 0;
        if trial {
            debug!("circuit breaker closed after trial");
            st.trial_in_flight = false;
            st.state = CircuitState::Closed;
            st.opened_instant = None;
            st.stats.opened_at = None;
        }
    }

    fn on_failure(&self, trial: bool, generation: u64) {
        let mut st = self.lock();
        st.stats.failed_calls += 1;
        if generation != st.generation {
            return;
        }
        st.stats.consecutive_failures = st.stats.consecutive_failures.saturating_add(1);
        let reopen = if trial {
            st.trial_in_flight = false;
            true
        } else {
            st.state == CircuitState::Closed
                && st.stats.consecutive_failures >= self.cfg.failure_threshold
        };
        if reopen {
            warn!(
                consecutive_failures = st.stats.consecutive_failures,
                cooldown_ms = self.cfg.cooldown.as_millis() as u64,
                "circuit breaker opened"
            );
            st.state = CircuitState::Open;
            st.opened_instant = Some(Instant::now());
            st.stats.opened_at = Some(SystemTime::now());
            st.generation += 1;
        }
    }

    /// Current state. An open breaker whose cooldown has elapsed reports
    /// `HalfOpen`, since the next call will be admitted as the trial.
    pub fn state(&self) -> CircuitState {
        let st = self.lock();
        self.effective_state(&st)
    }

    fn effective_state(&self, st: &State) -> CircuitState {
        match (st.state, st.opened_instant) {
            (CircuitState::Open, Some(t)) if t.elapsed() >= self.cfg.cooldown => {
                CircuitState::HalfOpen
            }
            (s, _) => s,
        }
    }

    pub fn stats(&self) -> CircuitStats {
        self.lock().stats.clone()
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let st = self.lock();
        let open_remaining_ms = match (st.state, st.opened_instant) {
            (CircuitState::Open, Some(t)) => self
                .cfg
                .cooldown
                .checked_sub(t.elapsed())
                .filter(|d| !d.is_zero())
                .map(|d| d.as_millis() as u64),
            _ => None,
        };
        CircuitSnapshot {
            state: self.effective_state(&st),
            stats: st.stats.clone(),
            failure_threshold: self.cfg.failure_threshold,
            cooldown_ms: self.cfg.cooldown.as_millis() as u64,
            open_remaining_ms,
        }
    }

    /// Force the breaker closed and zero the consecutive-failure counter.
    /// Lifetime counters are kept.
    pub fn reset(&self) {
        let mut st = self.lock();
        st.state = CircuitState::Closed;
        st.opened_instant = None;
        st.trial_in_flight = false;
        st.stats.consecutive_failures = 0;
        st.stats.opened_at = None;
        st.generation += 1;
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.cfg
    }
}
