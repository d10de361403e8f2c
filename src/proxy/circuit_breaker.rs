//! Circuit breaker (spec.md §4.2 step 5, §4.6): one breaker per
//! `(api_id, endpoint)` pair, managed by a registry keyed the way the
//! teacher's `CircuitBreakerManager` keys per-service breakers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitBreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub enum CircuitBreakerError {
    CircuitOpen,
    ServiceError(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CircuitBreakerStats {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub state: CircuitBreakerState,
    pub failure_rate: f64,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub samples: u32,
    pub threshold: f64,
    pub reset_timeout: Duration,
}

/// Shared behavior every breaker implementation exposes (spec.md §4.6). The
/// noop variant never opens, matching the teacher's escape hatch for
/// environments that want the gate disabled without branching call sites.
#[async_trait]
pub trait CircuitBreaker: Send + Sync {
    async fn allow(&self) -> Result<(), CircuitBreakerError>;
    async fn record_success(&self);
    async fn record_failure(&self);
    async fn state(&self) -> CircuitBreakerState;
    async fn stats(&self) -> CircuitBreakerStats;
}

/// Sample-window breaker: opens once `threshold` fraction of the last
/// `samples` calls failed; half-opens after `reset_timeout` and closes again
/// on the first subsequent success (spec.md §4.6).
pub struct SimpleCircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<CircuitBreakerState>,
    opened_at: Mutex<Option<Instant>>,
    window: Mutex<Vec<bool>>,
    total_calls: AtomicU64,
    successful_calls: AtomicU64,
    failed_calls: AtomicU64,
}

impl SimpleCircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CircuitBreakerState::Closed),
            opened_at: Mutex::new(None),
            window: Mutex::new(Vec::new()),
            total_calls: AtomicU64::new(0),
            successful_calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
        }
    }

    async fn record(&self, ok: bool) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        if ok {
            self.successful_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        }

        let mut window = self.window.lock().await;
        window.push(ok);
        let samples = self.config.samples.max(1) as usize;
        if window.len() > samples {
            let excess = window.len() - samples;
            window.drain(0..excess);
        }

        if window.len() >= samples {
            let failures = window.iter().filter(|&&ok| !ok).count();
            let failure_rate = failures as f64 / window.len() as f64;
            if failure_rate >= self.config.threshold {
                let mut state = self.state.lock().await;
                if *state != CircuitBreakerState::Open {
                    *state = CircuitBreakerState::Open;
                    *self.opened_at.lock().await = Some(Instant::now());
                    tracing::warn!(failure_rate, "circuit breaker opened");
                }
            }
        }

        if ok {
            let mut state = self.state.lock().await;
            if *state == CircuitBreakerState::HalfOpen {
                *state = CircuitBreakerState::Closed;
                window.clear();
                tracing::info!("circuit breaker closed after probe success");
            }
        }
    }
}

#[async_trait]
impl CircuitBreaker for SimpleCircuitBreaker {
    async fn allow(&self) -> Result<(), CircuitBreakerError> {
        let mut state = self.state.lock().await;
        match *state {
            CircuitBreakerState::Closed | CircuitBreakerState::HalfOpen => Ok(()),
            CircuitBreakerState::Open => {
                let opened_at = *self.opened_at.lock().await;
                let elapsed = opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.config.reset_timeout {
                    *state = CircuitBreakerState::HalfOpen;
                    Ok(())
                } else {
                    Err(CircuitBreakerError::CircuitOpen)
                }
            }
        }
    }

    async fn record_success(&self) {
        self.record(true).await;
    }

    async fn record_failure(&self) {
        self.record(false).await;
    }

    async fn state(&self) -> CircuitBreakerState {
        *self.state.lock().await
    }

    async fn stats(&self) -> CircuitBreakerStats {
        let total = self.total_calls.load(Ordering::Relaxed);
        let success = self.successful_calls.load(Ordering::Relaxed);
        let failed = self.failed_calls.load(Ordering::Relaxed);
        CircuitBreakerStats {
            total_calls: total,
            successful_calls: success,
            failed_calls: failed,
            state: self.state().await,
            failure_rate: if total == 0 { 0.0 } else { failed as f64 / total as f64 },
        }
    }
}

/// Always-closed breaker, used when an API disables the gate (spec.md §4.6
/// Non-goals note: breakers are opt-in per API).
pub struct NoOpCircuitBreaker {
    calls: AtomicU32,
}

impl NoOpCircuitBreaker {
    pub fn new() -> Self {
        Self { calls: AtomicU32::new(0) }
    }
}

impl Default for NoOpCircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CircuitBreaker for NoOpCircuitBreaker {
    async fn allow(&self) -> Result<(), CircuitBreakerError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn record_success(&self) {}
    async fn record_failure(&self) {}

    async fn state(&self) -> CircuitBreakerState {
        CircuitBreakerState::Closed
    }

    async fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            total_calls: self.calls.load(Ordering::Relaxed) as u64,
            successful_calls: 0,
            failed_calls: 0,
            state: CircuitBreakerState::Closed,
            failure_rate: 0.0,
        }
    }
}

/// Per-`(api_id, endpoint)` breaker registry (spec.md §4.2 step 5).
pub struct CircuitBreakerManager {
    breakers: RwLock<HashMap<String, Arc<dyn CircuitBreaker>>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: RwLock::new(HashMap::new()),
            default_config,
        }
    }

    pub async fn get_or_create(&self, key: &str, per_rule: Option<CircuitBreakerConfig>) -> Arc<dyn CircuitBreaker> {
        if let Some(existing) = self.breakers.read().await.get(key) {
            return existing.clone();
        }
        let mut guard = self.breakers.write().await;
        if let Some(existing) = guard.get(key) {
            return existing.clone();
        }
        let config = per_rule.unwrap_or_else(|| CircuitBreakerConfig {
            samples: self.default_config.samples,
            threshold: self.default_config.threshold,
            reset_timeout: self.default_config.reset_timeout,
        });
        let breaker: Arc<dyn CircuitBreaker> = Arc::new(SimpleCircuitBreaker::new(config));
        guard.insert(key.to_string(), breaker.clone());
        breaker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_threshold_breached() {
        let breaker = SimpleCircuitBreaker::new(CircuitBreakerConfig {
            samples: 4,
            threshold: 0.5,
            reset_timeout: Duration::from_millis(20),
        });
        for _ in 0..2 {
            breaker.record_success().await;
        }
        for _ in 0..2 {
            breaker.record_failure().await;
        }
        assert_eq!(breaker.state().await, CircuitBreakerState::Open);
        assert!(matches!(breaker.allow().await, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn half_opens_after_reset_timeout_and_closes_on_success() {
        let breaker = SimpleCircuitBreaker::new(CircuitBreakerConfig {
            samples: 2,
            threshold: 0.5,
            reset_timeout: Duration::from_millis(10),
        });
        breaker.record_failure().await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitBreakerState::Open);

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(breaker.allow().await.is_ok());
        assert_eq!(breaker.state().await, CircuitBreakerState::HalfOpen);

        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitBreakerState::Closed);
    }

    #[tokio::test]
    async fn noop_never_opens() {
        let breaker = NoOpCircuitBreaker::new();
        for _ in 0..100 {
            breaker.record_failure().await;
        }
        assert!(breaker.allow().await.is_ok());
    }

    #[tokio::test]
    async fn manager_reuses_breaker_for_same_key() {
        let manager = CircuitBreakerManager::new(CircuitBreakerConfig {
            samples: 20,
            threshold: 0.5,
            reset_timeout: Duration::from_secs(30),
        });
        let a = manager.get_or_create("api-1:/foo", None).await;
        let b = manager.get_or_create("api-1:/foo", None).await;
        assert!(Arc::ptr_eq(&a, &b));
    }
}
