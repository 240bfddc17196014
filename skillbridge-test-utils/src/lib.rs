//! SkillBridge Test Utilities
//!
//! Shared test infrastructure for the SkillBridge workspace:
//! - Scripted completion provider
//! - Recording persistence and notification sinks
//! - Fixtures for configs, requests and completion payloads
//! - Proptest generators for request types

pub use skillbridge_core::{
    EngineConfig, GeneratedBy, GeneratedRoadmap, LlmError, RoadmapRequest, SinkError, SkillLevel,
    TimeAvailability, UserContext,
};
pub use skillbridge_llm::{CompletionProvider, CompletionRequest, CompletionResponse};

use async_trait::async_trait;
use skillbridge_engine::{Notification, NotificationSink, RoadmapSink};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

// ============================================================================
// MOCK PROVIDER
// ============================================================================

/// Completion provider that replays a script of outcomes.
///
/// Scripted outcomes are consumed in order; once exhausted every call gets
/// the default outcome.
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    default: Result<CompletionResponse, LlmError>,
    delay: Option<Duration>,
    calls: AtomicU32,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn with_default(default: Result<CompletionResponse, LlmError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default,
            delay: None,
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always reply with `content`.
    pub fn replying(content: impl Into<String>) -> Self {
        Self::with_default(Ok(CompletionResponse {
            content: content.into(),
            total_tokens: Some(1000),
        }))
    }

    /// Always fail with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::with_default(Err(error))
    }

    pub fn then_reply(self, content: impl Into<String>) -> Self {
        self.push(Ok(CompletionResponse {
            content: content.into(),
            total_tokens: Some(1000),
        }))
    }

    pub fn then_fail(self, error: LlmError) -> Self {
        self.push(Err(error))
    }

    /// Sleep for `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, outcome: Result<CompletionResponse, LlmError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
        self
    }

    /// Number of `complete` calls that started.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn provider_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        next.unwrap_or_else(|| self.default.clone())
    }
}

/// Provider errors of each retry class.
pub mod errors {
    use super::LlmError;

    pub fn rate_limited() -> LlmError {
        LlmError::RateLimited {
            provider: "scripted".to_string(),
            retry_after_ms: 0,
        }
    }

    /// A 429 carrying a retry-after hint.
    pub fn rate_limited_for(retry_after_ms: i64) -> LlmError {
        LlmError::RateLimited {
            provider: "scripted".to_string(),
            retry_after_ms,
        }
    }

    pub fn timeout() -> LlmError {
        LlmError::Timeout {
            provider: "scripted".to_string(),
            elapsed_ms: 30_000,
        }
    }

    pub fn server_error() -> LlmError {
        LlmError::RequestFailed {
            provider: "scripted".to_string(),
            status: 500,
            message: "internal error".to_string(),
        }
    }
}

// ============================================================================
// RECORDING SINKS
// ============================================================================

/// In-memory roadmap store.
#[derive(Debug, Default)]
pub struct MemoryRoadmapStore {
    records: Mutex<Vec<(String, GeneratedRoadmap)>>,
    fail: AtomicBool,
}

impl MemoryRoadmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `persist` fail.
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<(String, GeneratedRoadmap)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RoadmapSink for MemoryRoadmapStore {
    async fn persist(&self, user_id: &str, roadmap: &GeneratedRoadmap) -> Result<String, SinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::PersistFailed {
                user_id: user_id.to_string(),
                reason: "store unavailable".to_string(),
            });
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push((user_id.to_string(), roadmap.clone()));
        Ok(format!("roadmap-{}", records.len()))
    }
}

/// Notification sink that keeps everything it is sent.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Notification)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `notify` fail without recording.
    pub fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, user_id: &str, notification: Notification) -> Result<(), SinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::NotifyFailed {
                user_id: user_id.to_string(),
                reason: "notification service unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_id.to_string(), notification));
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;

    /// Engine config with millisecond backoff and a short request timeout.
    pub fn fast_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.retry.base_delay = Duration::from_millis(10);
        config.retry.max_delay = Duration::from_millis(100);
        config.completion.request_timeout = Duration::from_secs(1);
        config
    }

    pub fn request(domain: &str, level: SkillLevel, time: TimeAvailability) -> RoadmapRequest {
        RoadmapRequest::new(domain, level, time, UserContext::default())
    }

    /// Completion text wrapping a valid roadmap document in chatter.
    pub fn roadmap_completion(domain: &str, module_titles: &[&str]) -> String {
        let modules: Vec<serde_json::Value> = module_titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                serde_json::json!({
                    "id": i + 1,
                    "title": title,
                    "description": format!("All about {}", title),
                    "objectives": ["Learn it", "Use it", "Teach it"],
                    "estimated_hours": 10,
                    "resources": [{"title": "Docs", "type": "documentation", "url": "https://docs.example.com"}]
                })
            })
            .collect();
        let document = serde_json::json!({
            "domain": domain,
            "estimated_duration_weeks": 6,
            "modules": modules,
        });
        format!("Here is your roadmap:\n{}\nGood luck!", document)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for request types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_skill_level() -> impl Strategy<Value = SkillLevel> {
        prop_oneof![
            Just(SkillLevel::Beginner),
            Just(SkillLevel::Intermediate),
            Just(SkillLevel::Advanced),
        ]
    }

    pub fn arb_time_availability() -> impl Strategy<Value = TimeAvailability> {
        prop_oneof![
            Just(TimeAvailability::PartTime),
            Just(TimeAvailability::FullTime),
            Just(TimeAvailability::Casual),
        ]
    }

    pub fn arb_domain() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Python".to_string()),
            Just("JavaScript".to_string()),
            Just("Web Development".to_string()),
            "[A-Za-z][A-Za-z ]{0,24}",
        ]
    }

    pub fn arb_user_context() -> impl Strategy<Value = UserContext> {
        (
            proptest::collection::vec("[a-z]{2,12}", 0..5),
            proptest::collection::vec("[a-z ]{3,20}", 0..3),
            proptest::option::of("[A-Za-z]{3,15}"),
            0u32..15,
        )
            .prop_map(|(skills, goals, location, years)| {
                let ctx = UserContext::default()
                    .with_skills(skills)
                    .with_goals(goals)
                    .with_experience_years(years);
                match location {
                    Some(loc) => ctx.with_location(loc),
                    None => ctx,
                }
            })
    }

    pub fn arb_request() -> impl Strategy<Value = RoadmapRequest> {
        (arb_domain(), arb_skill_level(), arb_time_availability(), arb_user_context())
            .prop_map(|(domain, level, time, ctx)| RoadmapRequest::new(domain, level, time, ctx))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Structural checks every returned roadmap must pass.

    use super::*;

    #[track_caller]
    pub fn assert_well_formed(roadmap: &GeneratedRoadmap) {
        assert!(!roadmap.modules.is_empty(), "roadmap has no modules");
        assert!(roadmap.estimated_duration_weeks > 0, "roadmap has zero weeks");
        for module in &roadmap.modules {
            assert!(module.estimated_hours > 0, "module {} has zero hours", module.name);
            assert!(!module.completed, "module {} starts completed", module.name);
        }
        assert_eq!(roadmap.progress, 0.0);
    }
}
