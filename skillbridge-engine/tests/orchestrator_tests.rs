//! End-to-end tests for the roadmap orchestrator

use skillbridge_core::{CircuitState, GeneratedBy, HealthStatus};
use skillbridge_engine::{ResilienceContext, RoadmapOrchestrator};
use skillbridge_test_utils::assertions::assert_well_formed;
use skillbridge_test_utils::fixtures::{fast_config, request, roadmap_completion};
use skillbridge_test_utils::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn engine_with(config: EngineConfig, provider: Arc<ScriptedProvider>) -> RoadmapOrchestrator {
    let context = ResilienceContext::from_config(&config);
    RoadmapOrchestrator::new(config, context, Some(provider as Arc<dyn CompletionProvider>))
}

fn python_request() -> RoadmapRequest {
    request("Python", SkillLevel::Beginner, TimeAvailability::PartTime)
}

// ============================================================================
// DEGRADATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_always_failing_provider_still_returns_roadmap() {
    let provider = Arc::new(ScriptedProvider::failing(errors::server_error()));
    let engine = engine_with(fast_config(), provider.clone());

    let roadmap = engine
        .generate_roadmap(
            "Go",
            SkillLevel::Intermediate,
            TimeAvailability::FullTime,
            UserContext::default(),
            true,
        )
        .await;

    assert_ne!(roadmap.generated_by, GeneratedBy::Ai);
    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert_eq!(roadmap.domain, "Go");
    assert_well_formed(&roadmap);

    // max_retries = 3, so four attempts, each counted by the breaker.
    assert_eq!(provider.calls(), 4);
    assert_eq!(engine.context().circuit_breaker.failure_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_errors_count_once_on_exhaustion() {
    let provider = Arc::new(ScriptedProvider::failing(errors::rate_limited()));
    let engine = engine_with(fast_config(), provider.clone());

    let roadmap = engine.generate(&python_request(), false).await;

    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert_eq!(provider.calls(), 4);
    assert_eq!(engine.context().circuit_breaker.failure_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_then_success() {
    let provider = Arc::new(
        ScriptedProvider::replying(roadmap_completion("Python", &["Basics", "Loops"]))
            .then_fail(errors::timeout())
            .then_fail(errors::server_error()),
    );
    let engine = engine_with(fast_config(), provider.clone());

    let roadmap = engine.generate(&python_request(), false).await;

    assert_eq!(roadmap.generated_by, GeneratedBy::Ai);
    assert_eq!(roadmap.modules.len(), 2);
    assert_eq!(roadmap.modules[0].name, "Basics");
    assert_eq!(provider.calls(), 3);
    assert_eq!(engine.context().circuit_breaker.state(), CircuitState::Closed);
    assert_eq!(engine.context().circuit_breaker.failure_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_between_attempts() {
    let provider = Arc::new(ScriptedProvider::failing(errors::server_error()));
    let engine = engine_with(fast_config(), provider);

    let started = Instant::now();
    engine.generate(&python_request(), false).await;

    // 10ms + 20ms + 40ms of backoff; no sleep after the last attempt.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(70), "waited {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(80), "waited {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_hint_lengthens_backoff() {
    let provider = Arc::new(
        ScriptedProvider::replying(roadmap_completion("Python", &["Basics"]))
            .then_fail(errors::rate_limited_for(80)),
    );
    let engine = engine_with(fast_config(), provider.clone());

    let started = Instant::now();
    let roadmap = engine.generate(&python_request(), false).await;

    // The 80ms hint wins over the 10ms base backoff.
    let elapsed = started.elapsed();
    assert_eq!(roadmap.generated_by, GeneratedBy::Ai);
    assert_eq!(provider.calls(), 2);
    assert!(elapsed >= Duration::from_millis(80), "waited {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(90), "waited {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_hits_request_timeout() {
    let provider = Arc::new(
        ScriptedProvider::replying(roadmap_completion("Python", &["Basics"]))
            .with_delay(Duration::from_secs(5)),
    );
    let engine = engine_with(fast_config(), provider.clone());

    let roadmap = engine.generate(&python_request(), false).await;

    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert_eq!(provider.calls(), 4);
    // Timeouts only count against the breaker once retries are exhausted.
    assert_eq!(engine.context().circuit_breaker.failure_count(), 1);
}

// ============================================================================
// GUARDS
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rate_limit_throttles_instead_of_rejecting() {
    let mut config = fast_config();
    config.rate_limit.max_calls = 1;
    config.rate_limit.time_window = Duration::from_secs(10);
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Python", &["Basics"])));
    let engine = engine_with(config, provider.clone());

    let started = Instant::now();
    let first = engine.generate(&python_request(), false).await;
    assert!(started.elapsed() < Duration::from_secs(1));

    let second = engine.generate(&python_request(), false).await;
    let elapsed = started.elapsed();

    assert_eq!(first.generated_by, GeneratedBy::Ai);
    assert_eq!(second.generated_by, GeneratedBy::Ai);
    assert_eq!(provider.calls(), 2);
    assert!(elapsed >= Duration::from_secs(10), "waited {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(11), "waited {:?}", elapsed);
}

#[tokio::test]
async fn test_budget_exhaustion_skips_provider() {
    let mut config = fast_config();
    config.cost.daily_limit = 0.05;
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Python", &["Basics"])));
    let engine = engine_with(config, provider.clone());

    let roadmap = engine.generate(&python_request(), true).await;

    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_open_circuit_skips_provider() {
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Python", &["Basics"])));
    let engine = engine_with(fast_config(), provider.clone());
    for _ in 0..5 {
        engine.context().circuit_breaker.record_failure();
    }
    assert_eq!(engine.context().circuit_breaker.state(), CircuitState::Open);

    let roadmap = engine.generate(&python_request(), true).await;

    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_opens_across_requests() {
    let mut config = fast_config();
    config.circuit_breaker.failure_threshold = 5;
    let provider = Arc::new(ScriptedProvider::failing(errors::server_error()));
    let engine = engine_with(config, provider.clone());

    engine.generate(&python_request(), false).await;
    assert_eq!(provider.calls(), 4);

    // Fifth failure trips the breaker; the rest of the attempts are skipped.
    engine.generate(&python_request(), false).await;
    assert_eq!(provider.calls(), 5);
    assert_eq!(engine.context().circuit_breaker.state(), CircuitState::Open);

    engine.generate(&python_request(), false).await;
    assert_eq!(provider.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_cannot_overspend_budget() {
    let mut config = fast_config();
    config.cost.daily_limit = 0.2;
    config.cost.estimated_request_cost = 0.1;
    let provider = Arc::new(
        ScriptedProvider::replying(roadmap_completion("Python", &["Basics"]))
            .with_delay(Duration::from_millis(500)),
    );
    let engine = engine_with(config, provider.clone());
    let req = python_request();

    let (a, b, c, d, e) = tokio::join!(
        engine.generate(&req, false),
        engine.generate(&req, false),
        engine.generate(&req, false),
        engine.generate(&req, false),
        engine.generate(&req, false),
    );

    let ai = [a, b, c, d, e]
        .iter()
        .filter(|r| r.generated_by == GeneratedBy::Ai)
        .count();
    assert_eq!(ai, 2);
    assert_eq!(provider.calls(), 2);
    assert_eq!(engine.context().cost_tracker.get_usage_stats().request_count, 2);
}

// ============================================================================
// CACHE
// ============================================================================

#[tokio::test]
async fn test_cached_result_is_returned_unchanged() {
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion(
        "Python",
        &["Basics", "Functions"],
    )));
    let engine = engine_with(fast_config(), provider.clone());

    let first = engine.generate(&python_request(), true).await;
    let second = engine
        .generate_roadmap(
            "  python ",
            SkillLevel::Beginner,
            TimeAvailability::PartTime,
            UserContext::default(),
            true,
        )
        .await;

    assert_eq!(first.generated_by, GeneratedBy::Ai);
    assert_eq!(first, second);
    assert_eq!(first.cost, second.cost);
    assert_eq!(first.generated_at, second.generated_at);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_use_cache_false_always_calls_provider() {
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Python", &["Basics"])));
    let engine = engine_with(fast_config(), provider.clone());

    engine.generate(&python_request(), false).await;
    engine.generate(&python_request(), false).await;
    assert_eq!(provider.calls(), 2);
    assert_eq!(engine.stats().await.cache.entries, 0);
}

#[tokio::test]
async fn test_fallback_results_are_not_cached() {
    let provider = Arc::new(ScriptedProvider::failing(errors::server_error()));
    let mut config = fast_config();
    config.retry.max_retries = 0;
    let engine = engine_with(config, provider.clone());

    engine.generate(&python_request(), true).await;
    engine.generate(&python_request(), true).await;
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_clear_cache_forces_regeneration() {
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Python", &["Basics"])));
    let engine = engine_with(fast_config(), provider.clone());

    engine.generate(&python_request(), true).await;
    assert_eq!(engine.clear_cache().await.unwrap(), 1);
    engine.generate(&python_request(), true).await;
    assert_eq!(provider.calls(), 2);
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_aborts_in_flight_call() {
    let mut config = fast_config();
    config.completion.request_timeout = Duration::from_secs(120);
    let provider = Arc::new(
        ScriptedProvider::replying(roadmap_completion("Python", &["Basics"]))
            .with_delay(Duration::from_secs(60)),
    );
    let engine = engine_with(config, provider.clone());
    let req = python_request();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let started = Instant::now();
    let (roadmap, ()) = tokio::join!(engine.generate_with_cancel(&req, true, &cancel), async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(provider.calls(), 1);
    // Nothing was charged and the reservation was released.
    let usage = engine.context().cost_tracker.get_usage_stats();
    assert_eq!(usage.request_count, 0);
    assert_eq!(usage.current_cost, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_skips_provider() {
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Python", &["Basics"])));
    let engine = engine_with(fast_config(), provider.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let roadmap = engine.generate_with_cancel(&python_request(), false, &cancel).await;

    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert_eq!(provider.calls(), 0);
}

// ============================================================================
// OPERATIONS
// ============================================================================

#[tokio::test]
async fn test_no_provider_mode() {
    let config = fast_config();
    let context = ResilienceContext::from_config(&config);
    let engine = RoadmapOrchestrator::new(config, context, None);

    let roadmap = engine.generate(&python_request(), true).await;
    assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
    assert_well_formed(&roadmap);

    let stats = engine.stats().await;
    assert!(!stats.client_available);
    assert_eq!(stats.cost_tracking.request_count, 0);
}

#[tokio::test]
async fn test_stats_after_success() {
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Python", &["Basics"])));
    let engine = engine_with(fast_config(), provider);

    engine.generate(&python_request(), true).await;
    engine.generate(&python_request(), true).await;

    let stats = engine.stats().await;
    assert!(stats.client_available);
    assert_eq!(stats.rate_limiter.max_calls, 60);
    assert_eq!(stats.rate_limiter.current_calls, 1);
    assert_eq!(stats.cost_tracking.request_count, 1);
    assert_eq!(stats.circuit_breaker.state, CircuitState::Closed);
    assert_eq!(stats.cache.entries, 1);
    assert_eq!(stats.cache.hits, 1);
    assert_eq!(stats.cache.ttl_secs, 3600);
}

#[tokio::test]
async fn test_health_check_healthy_and_unhealthy() {
    let provider = Arc::new(ScriptedProvider::replying("pong"));
    let engine = engine_with(fast_config(), provider);

    let report = engine.health_check().await;
    assert_eq!(report.overall_status, HealthStatus::Healthy);
    assert_eq!(report.checks["provider"].status, HealthStatus::Healthy);

    for _ in 0..5 {
        engine.context().circuit_breaker.record_failure();
    }
    let report = engine.health_check().await;
    assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    assert_eq!(report.checks["circuit_breaker"].message, "Circuit breaker is OPEN");
}

#[tokio::test]
async fn test_health_degraded_near_budget() {
    let provider = Arc::new(ScriptedProvider::replying("pong"));
    let engine = engine_with(fast_config(), provider);
    engine.context().cost_tracker.record_request(46.0);

    let report = engine.health_check().await;
    assert_eq!(report.checks["cost_tracking"].status, HealthStatus::Degraded);
    assert_eq!(report.overall_status, HealthStatus::Degraded);
}

#[tokio::test]
async fn test_prompt_reaches_provider() {
    let provider = Arc::new(ScriptedProvider::replying(roadmap_completion("Rust", &["Ownership"])));
    let engine = engine_with(fast_config(), provider.clone());

    let ctx = UserContext::default().with_skills(["C++"]);
    engine
        .generate_roadmap("Rust", SkillLevel::Advanced, TimeAvailability::Casual, ctx, false)
        .await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-3.5-turbo");
    assert_eq!(requests[0].max_tokens, 3000);
    assert_eq!(requests[0].messages.len(), 2);
    assert!(requests[0].messages[1].content.contains("Current Skills: C++"));
}
