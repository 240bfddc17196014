//! SkillBridge Engine - Resilient Roadmap Generation
//!
//! Turns a learner's request into a structured roadmap by calling a hosted
//! completion service behind a rate limiter, a daily cost budget, a circuit
//! breaker and a response cache. Every failure on that path ends in the
//! deterministic catalog generator, so callers always receive a roadmap.

pub mod cache;
pub mod circuit;
pub mod context;
pub mod cost;
pub mod fallback;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod rate_limiter;
pub mod sinks;
pub mod stats;
pub mod telemetry;

pub use cache::{CacheStats, InMemoryRoadmapCache, RoadmapCache};
pub use circuit::CircuitBreaker;
pub use context::ResilienceContext;
pub use cost::{estimate_cost, CostReservation, CostTracker, UsageStats};
pub use fallback::FallbackGenerator;
pub use orchestrator::RoadmapOrchestrator;
pub use parser::ResponseParser;
pub use prompt::{Prompt, PromptBuilder};
pub use rate_limiter::RateLimiter;
pub use sinks::{JobOutcome, Notification, NotificationKind, NotificationSink, RoadmapJob, RoadmapSink};
pub use stats::{CacheSummary, CircuitBreakerStats, EngineStats, RateLimiterStats};
pub use telemetry::{init_tracing, TelemetryConfig};
