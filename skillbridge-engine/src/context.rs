//! Shared resilience state
//!
//! One `ResilienceContext` is built at process start and handed to every
//! orchestrator. Clones share the same limiter, ledger, breaker and cache.

use crate::cache::{InMemoryRoadmapCache, RoadmapCache};
use crate::circuit::CircuitBreaker;
use crate::cost::CostTracker;
use crate::rate_limiter::RateLimiter;
use skillbridge_core::{Clock, EngineConfig, SystemClock};
use std::sync::Arc;

#[derive(Clone)]
pub struct ResilienceContext {
    pub rate_limiter: Arc<RateLimiter>,
    pub cost_tracker: Arc<CostTracker>,
    pub circuit_breaker: Arc<CircuitBreaker>,
    pub cache: Arc<dyn RoadmapCache>,
    pub clock: Arc<dyn Clock>,
}

impl ResilienceContext {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            rate_limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            cost_tracker: Arc::new(CostTracker::from_config(&config.cost, clock.clone())),
            circuit_breaker: Arc::new(CircuitBreaker::new(config.circuit_breaker.clone())),
            cache: Arc::new(InMemoryRoadmapCache::from_config(&config.cache)),
            clock,
        }
    }

    /// Swap in a different cache backend.
    pub fn with_cache(mut self, cache: Arc<dyn RoadmapCache>) -> Self {
        self.cache = cache;
        self
    }
}

impl std::fmt::Debug for ResilienceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceContext")
            .field("rate_limiter", &self.rate_limiter)
            .field("cost_tracker", &self.cost_tracker)
            .field("circuit_breaker", &self.circuit_breaker)
            .finish_non_exhaustive()
    }
}
