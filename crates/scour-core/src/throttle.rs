//! Request pacing for one fetch pipeline.
//!
//! A [`RateLimiter`] is a single lane: every call to
//! [`await_turn`](RateLimiter::await_turn) waits until at least the configured
//! delay plus a random jitter has passed since the previous turn was granted.
//! Clones share the lane. Independent pipelines (one per worker) should each
//! build their own limiter.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Pacing between two turns: `delay`, plus up to `jitter` drawn uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub delay: Duration,
    /// Upper bound of the random extra wait. Zero disables it.
    pub jitter: Duration,
}

impl ThrottleConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// A fresh sample of the gap to leave before the next turn.
    fn next_interval(&self) -> Duration {
        match self.jitter {
            Duration::ZERO => self.delay,
            jitter => self.delay + rand::thread_rng().gen_range(Duration::ZERO..=jitter),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(2500)).with_jitter(Duration::from_millis(1500))
    }
}

/// Enforces a minimum, jittered interval between turns on one lane.
#[derive(Clone)]
pub struct RateLimiter {
    config: ThrottleConfig,
    /// When the previous turn was granted.
    last_turn: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            last_turn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Wait until this lane may issue its next request.
    ///
    /// The lock is held while sleeping so callers sharing a lane are granted
    /// turns one at a time.
    pub async fn await_turn(&self) {
        let mut last = self.last_turn.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.config.next_interval();
            let now = Instant::now();
            if ready_at > now {
                tracing::debug!(wait_ms = (ready_at - now).as_millis() as u64, "Pacing request");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}
