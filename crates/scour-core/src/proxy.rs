//! Time-bounded proxy list cache.
//!
//! The pool owns a wholesale-refreshed list of [`ProxyEntry`] values fetched
//! from a [`ProxySource`]. It never fails: an unavailable source, an empty
//! list, or a concurrent refresh in progress all yield `None` and the caller
//! connects directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::ProxyEntry;
use crate::traits::ProxySource;

/// How an entry is picked from the cached list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Always the first entry.
    First,
    /// Rotate through the list, one step per call.
    #[default]
    RoundRobin,
}

#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    /// How long a fetched list is trusted before the next refresh.
    pub ttl: Duration,
    pub policy: SelectionPolicy,
    /// Entries beyond this count are dropped at refresh.
    pub max_entries: usize,
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            policy: SelectionPolicy::default(),
            max_entries: 500,
        }
    }
}

impl ProxyPoolConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }
}

#[derive(Debug, Default)]
struct PoolState {
    entries: Vec<ProxyEntry>,
    refreshed_at: Option<Instant>,
}

pub struct ProxyPool<S: ProxySource> {
    source: Arc<S>,
    config: ProxyPoolConfig,
    state: Arc<Mutex<PoolState>>,
    cursor: Arc<AtomicUsize>,
}

impl<S: ProxySource> Clone for ProxyPool<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            cursor: Arc::clone(&self.cursor),
        }
    }
}

impl<S: ProxySource> ProxyPool<S> {
    pub fn new(source: S, config: ProxyPoolConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
            state: Arc::new(Mutex::new(PoolState::default())),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &ProxyPoolConfig {
        &self.config
    }

    /// Pick a proxy for the next request, refreshing the list when stale.
    pub async fn next_proxy(&self) -> Option<ProxyEntry> {
        let Ok(mut state) = self.state.try_lock() else {
            tracing::debug!("Proxy pool busy, proceeding without proxy");
            return None;
        };

        let stale = state
            .refreshed_at
            .is_none_or(|at| at.elapsed() >= self.config.ttl);
        if stale {
            self.refresh(&mut state).await;
        }

        if state.entries.is_empty() {
            return None;
        }

        let index = match self.config.policy {
            SelectionPolicy::First => 0,
            SelectionPolicy::RoundRobin => {
                self.cursor.fetch_add(1, Ordering::Relaxed) % state.entries.len()
            }
        };
        state.entries.get(index).cloned()
    }

    /// Number of entries currently cached (no refresh).
    pub async fn cached_len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    async fn refresh(&self, state: &mut PoolState) {
        let now = Instant::now();
        match self.source.fetch_proxies().await {
            Ok(list) => {
                let entries: Vec<ProxyEntry> = list
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .take(self.config.max_entries)
                    .map(|endpoint| ProxyEntry {
                        endpoint: endpoint.to_string(),
                        fetched_at: now,
                        ttl: self.config.ttl,
                    })
                    .collect();
                tracing::info!(count = entries.len(), "Proxy list refreshed");
                state.entries = entries;
                self.cursor.store(0, Ordering::Relaxed);
            }
            Err(e) => {
                // Previous list (possibly empty) is kept for another TTL window.
                tracing::warn!(
                    error = %e,
                    kept = state.entries.len(),
                    "Proxy list refresh failed"
                );
            }
        }
        state.refreshed_at = Some(now);
    }
}
