//! SkillBridge Core - Roadmap Types
//!
//! Pure data structures shared by the roadmap engine crates: the request a
//! learner submits, the roadmap the engine returns, the error taxonomy and the
//! configuration surface. Orchestration lives in `skillbridge-engine`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod clock;
pub mod config;
pub mod enums;
pub mod error;
pub mod health;
pub mod request;
pub mod roadmap;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    CacheConfig, CircuitBreakerConfig, CompletionConfig, CostConfig, EngineConfig, PricingConfig,
    RateLimitConfig, RetryConfig,
};
pub use enums::{
    CircuitState, Difficulty, GeneratedBy, ResourceType, SkillLevel, TimeAvailability,
};
pub use error::{
    ConfigError, GenerationError, LlmError, ProviderErrorKind, SinkError, SkillbridgeError,
    SkillbridgeResult, ValidationError,
};
pub use health::{HealthCheck, HealthReport, HealthStatus};
pub use request::{CacheKey, RoadmapRequest, UserContext};
pub use roadmap::{Exercise, GeneratedRoadmap, Milestone, Module, Project, Resource};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Identifier attached to each generation request for log correlation.
pub type RequestId = Uuid;

/// Generate a new UUIDv7 request id (timestamp-sortable).
pub fn new_request_id() -> RequestId {
    Uuid::now_v7()
}

/// Round a float to a fixed number of decimal places.
///
/// Used for the monetary and percentage figures the engine reports.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
