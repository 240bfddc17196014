//! Point-in-time engine statistics

use crate::cost::UsageStats;
use serde::Serialize;
use skillbridge_core::CircuitState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimiterStats {
    pub max_calls: u32,
    pub time_window_secs: u64,
    pub current_calls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheSummary {
    pub ttl_secs: u64,
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Snapshot returned by [`crate::RoadmapOrchestrator::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    /// Whether a completion provider is configured
    pub client_available: bool,
    pub rate_limiter: RateLimiterStats,
    pub cost_tracking: UsageStats,
    pub circuit_breaker: CircuitBreakerStats,
    pub cache: CacheSummary,
}
