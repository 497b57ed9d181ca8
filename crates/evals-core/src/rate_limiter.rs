//! Per-provider admission control.
//!
//! Each provider identity gets its own lane: a FIFO semaphore bounding the
//! number of in-flight calls, plus an optional minimum spacing between
//! consecutive admissions. Lanes never share permits, so a saturated
//! provider cannot block another one. Permits are RAII guards and are
//! released when the unit of work finishes, fails, or panics.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::debug;

/// Admission budget for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBudget {
    /// Maximum simultaneous in-flight calls. Values below 1 are treated as 1.
    pub max_concurrent: usize,
    /// Minimum time between two admissions (0 = no spacing).
    pub min_interval_ms: u64,
}

impl Default for ProviderBudget {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            min_interval_ms: 0,
        }
    }
}

impl ProviderBudget {
    pub fn concurrent(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            min_interval_ms: 0,
        }
    }

    fn permits(&self) -> usize {
        self.max_concurrent.max(1)
    }
}

/// Budgets for all providers: a default plus per-provider overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub default_budget: ProviderBudget,
    pub overrides: BTreeMap<String, ProviderBudget>,
}

impl RateLimitConfig {
    pub fn with_override(mut self, provider: &str, budget: ProviderBudget) -> Self {
        self.overrides.insert(provider.to_string(), budget);
        self
    }

    pub fn budget_for(&self, provider: &str) -> ProviderBudget {
        self.overrides
            .get(provider)
            .copied()
            .unwrap_or(self.default_budget)
    }
}

struct Lane {
    budget: ProviderBudget,
    permits: Arc<Semaphore>,
    next_admission: Mutex<Instant>,
}

impl Lane {
    fn new(budget: ProviderBudget) -> Self {
        Self {
            budget,
            permits: Arc::new(Semaphore::new(budget.permits())),
            next_admission: Mutex::new(Instant::now()),
        }
    }

    /// Reserve the next admission slot and sleep until it opens. The lock is
    /// released before sleeping so later callers queue behind this slot.
    async fn wait_for_slot(&self) {
        if self.budget.min_interval_ms == 0 {
            return;
        }
        let interval = Duration::from_millis(self.budget.min_interval_ms);
        let slot = {
            let mut next = self.next_admission.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + interval;
            slot
        };
        tokio::time::sleep_until(slot).await;
    }

    fn in_flight(&self) -> usize {
        self.budget.permits() - self.permits.available_permits()
    }
}

/// Throttles provider-bound work per provider identity.
pub struct ProviderRateLimiter {
    config: RateLimitConfig,
    lanes: Mutex<HashMap<String, Arc<Lane>>>,
}

impl ProviderRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            lanes: Mutex::new(HashMap::new()),
        }
    }

    async fn lane(&self, provider: &str) -> Arc<Lane> {
        let mut lanes = self.lanes.lock().await;
        Arc::clone(
            lanes
                .entry(provider.to_string())
                .or_insert_with(|| Arc::new(Lane::new(self.config.budget_for(provider)))),
        )
    }

    /// Run `work` once admitted under `provider`'s budget and return its
    /// output unchanged, errors included.
    ///
    /// Waiters are admitted in arrival order.
    pub async fn schedule<F, Fut, T>(&self, provider: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lane = self.lane(provider).await;

        // Lanes are never closed, so acquisition only fails if that changes.
        let _permit = Arc::clone(&lane.permits).acquire_owned().await.ok();
        lane.wait_for_slot().await;

        debug!(
            provider = %provider,
            in_flight = lane.in_flight(),
            budget = lane.budget.permits(),
            "provider slot admitted"
        );

        work().await
    }

    /// Calls currently admitted for `provider`.
    pub async fn in_flight(&self, provider: &str) -> usize {
        let lanes = self.lanes.lock().await;
        lanes.get(provider).map(|l| l.in_flight()).unwrap_or(0)
    }
}
