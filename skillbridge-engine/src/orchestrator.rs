//! Roadmap generation pipeline
//!
//! Every entry point returns a [`GeneratedRoadmap`]. Failures on the AI path
//! are [`GenerationError`] values that end in the deterministic fallback; the
//! `generated_by` field tells callers which path produced the result.
//!
//! Order of guards per request: cache, rate limiter, cost budget, circuit
//! breaker, then up to `max_retries + 1` completion attempts.

use crate::context::ResilienceContext;
use crate::cost::estimate_cost;
use crate::fallback::FallbackGenerator;
use crate::parser::ResponseParser;
use crate::prompt::PromptBuilder;
use crate::stats::{CacheSummary, CircuitBreakerStats, EngineStats, RateLimiterStats};
use skillbridge_core::{
    new_request_id, round_to, CircuitState, EngineConfig, GeneratedRoadmap, GenerationError,
    HealthCheck, HealthReport, LlmError, RoadmapRequest, SkillLevel, SkillbridgeResult,
    TimeAvailability, UserContext,
};
use skillbridge_llm::{CompletionProvider, CompletionRequest, OpenAICompletionProvider};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Usage share at which the cost check reports degraded.
const COST_WARNING_PERCENTAGE: f64 = 90.0;

pub struct RoadmapOrchestrator {
    config: EngineConfig,
    context: ResilienceContext,
    provider: Option<Arc<dyn CompletionProvider>>,
    prompts: PromptBuilder,
    parser: ResponseParser,
    fallback: FallbackGenerator,
}

impl RoadmapOrchestrator {
    pub fn new(
        config: EngineConfig,
        context: ResilienceContext,
        provider: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        match &provider {
            Some(p) => tracing::info!(
                provider = p.provider_id(),
                model = %config.completion.model,
                "Roadmap engine initialized"
            ),
            None => tracing::warn!(
                "No completion provider configured, all roadmaps will use the deterministic generator"
            ),
        }

        Self {
            parser: ResponseParser::with_clock(context.clock.clone()),
            fallback: FallbackGenerator::with_clock(context.clock.clone()),
            prompts: PromptBuilder::new(),
            config,
            context,
            provider,
        }
    }

    /// Engine wired to the OpenAI-compatible provider when an API key is set.
    pub fn from_config(config: EngineConfig) -> Self {
        let context = ResilienceContext::from_config(&config);
        let provider = match OpenAICompletionProvider::from_config(&config.completion) {
            Ok(p) => Some(Arc::new(p) as Arc<dyn CompletionProvider>),
            Err(LlmError::ProviderNotConfigured) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build completion provider");
                None
            }
        };
        Self::new(config, context, provider)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &ResilienceContext {
        &self.context
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    // ========================================================================
    // GENERATION
    // ========================================================================

    /// Entry point for the web layer.
    pub async fn generate_roadmap(
        &self,
        domain: &str,
        skill_level: SkillLevel,
        time_availability: TimeAvailability,
        user_context: UserContext,
        use_cache: bool,
    ) -> GeneratedRoadmap {
        let request = RoadmapRequest::new(domain, skill_level, time_availability, user_context);
        self.generate(&request, use_cache).await
    }

    pub async fn generate(&self, request: &RoadmapRequest, use_cache: bool) -> GeneratedRoadmap {
        self.generate_with_cancel(request, use_cache, &CancellationToken::new())
            .await
    }

    /// Like [`Self::generate`], but abandons throttling, in-flight calls and
    /// backoff sleeps once `cancel` fires, returning the fallback roadmap.
    pub async fn generate_with_cancel(
        &self,
        request: &RoadmapRequest,
        use_cache: bool,
        cancel: &CancellationToken,
    ) -> GeneratedRoadmap {
        let request_id = new_request_id();
        let span = tracing::info_span!(
            "roadmap.generate",
            %request_id,
            domain = request.domain(),
            skill_level = %request.skill_level(),
            time_availability = %request.time_availability(),
        );
        self.run(request, use_cache, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: &RoadmapRequest,
        use_cache: bool,
        cancel: &CancellationToken,
    ) -> GeneratedRoadmap {
        let key = request.cache_key();

        if use_cache {
            match self.context.cache.get(&key).await {
                Ok(Some(roadmap)) => {
                    tracing::info!(cache_key = key.as_str(), "Returning cached roadmap");
                    return roadmap;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Cache lookup failed, treating as miss"),
            }
        }

        match self.generate_ai(request, cancel).await {
            Ok(roadmap) => {
                if use_cache {
                    if let Err(e) = self
                        .context
                        .cache
                        .set(key, roadmap.clone(), self.config.cache.ttl)
                        .await
                    {
                        tracing::warn!(error = %e, "Failed to cache roadmap");
                    }
                }
                roadmap
            }
            Err(reason) => {
                tracing::warn!(%reason, "Using deterministic roadmap");
                self.fallback.generate(
                    request.domain(),
                    request.skill_level(),
                    request.time_availability(),
                )
            }
        }
    }

    async fn generate_ai(
        &self,
        request: &RoadmapRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedRoadmap, GenerationError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(GenerationError::ProviderUnavailable)?;

        self.context.rate_limiter.acquire(cancel).await?;

        let reservation = self
            .context
            .cost_tracker
            .try_reserve(self.config.cost.estimated_request_cost)?;

        let prompt = self.prompts.build(request);
        let completion = CompletionRequest::from_config(&self.config.completion, prompt.into_messages());
        let breaker = &self.context.circuit_breaker;
        let attempts = self.config.retry.max_retries + 1;
        let request_timeout = self.config.completion.request_timeout;

        let mut attempt = 0;
        loop {
            if !breaker.can_execute() {
                return Err(GenerationError::CircuitOpen);
            }

            let started = Instant::now();
            let call = tokio::time::timeout(request_timeout, provider.complete(&completion));
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                outcome = call => outcome.unwrap_or_else(|_| Err(LlmError::Timeout {
                    provider: provider.provider_id().to_string(),
                    elapsed_ms: request_timeout.as_millis() as u64,
                })),
            };

            match result {
                Ok(response) => {
                    breaker.record_success();
                    let response_time = started.elapsed().as_secs_f64();

                    let mut roadmap = self.parser.parse(
                        &response.content,
                        request.domain(),
                        request.skill_level(),
                        request.time_availability(),
                    );
                    let cost = estimate_cost(response.total_tokens, &self.config.pricing);
                    reservation.commit(cost);

                    roadmap.domain = request.domain().to_string();
                    roadmap.skill_level = request.skill_level();
                    roadmap.time_availability = request.time_availability();
                    roadmap.cost = cost;
                    roadmap.response_time = round_to(response_time, 2);
                    roadmap.generated_at = self.context.clock.now();

                    tracing::info!(
                        attempt = attempt + 1,
                        cost,
                        tokens = ?response.total_tokens,
                        generated_by = %roadmap.generated_by,
                        modules = roadmap.modules.len(),
                        "Generated roadmap from completion"
                    );
                    return Ok(roadmap);
                }
                Err(err) => {
                    let counts_every_attempt = err.counts_as_breaker_failure();
                    if counts_every_attempt {
                        breaker.record_failure();
                    }
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        kind = ?err.kind(),
                        error = %err,
                        "Completion attempt failed"
                    );

                    attempt += 1;
                    if attempt >= attempts {
                        if !counts_every_attempt {
                            breaker.record_failure();
                        }
                        return Err(GenerationError::RetriesExhausted {
                            attempts,
                            last: err,
                        });
                    }

                    let delay = self.config.retry.delay_after(attempt - 1, &err);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    pub async fn stats(&self) -> EngineStats {
        let cache = match self.context.cache.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cache stats");
                Default::default()
            }
        };
        let breaker = &self.context.circuit_breaker;
        let limiter = &self.context.rate_limiter;

        EngineStats {
            client_available: self.has_provider(),
            rate_limiter: RateLimiterStats {
                max_calls: limiter.max_calls(),
                time_window_secs: limiter.time_window().as_secs(),
                current_calls: limiter.current_calls(),
            },
            cost_tracking: self.context.cost_tracker.get_usage_stats(),
            circuit_breaker: CircuitBreakerStats {
                state: breaker.state(),
                failure_count: breaker.failure_count(),
                failure_threshold: breaker.failure_threshold(),
            },
            cache: CacheSummary {
                ttl_secs: self.config.cache.ttl.as_secs(),
                entries: cache.entry_count,
                hits: cache.hits,
                misses: cache.misses,
                hit_rate: round_to(cache.hit_rate(), 4),
            },
        }
    }

    pub async fn health_check(&self) -> HealthReport {
        let mut checks = BTreeMap::new();
        checks.insert("provider".to_string(), self.check_provider().await);

        let current_calls = self.context.rate_limiter.current_calls();
        checks.insert(
            "rate_limiter".to_string(),
            HealthCheck::healthy(format!("{} calls in current window", current_calls)),
        );

        let usage = self.context.cost_tracker.get_usage_stats();
        let cost_message = format!("{:.1}% of daily limit used", usage.cost_percentage);
        checks.insert(
            "cost_tracking".to_string(),
            if usage.cost_percentage < COST_WARNING_PERCENTAGE {
                HealthCheck::healthy(cost_message)
            } else {
                HealthCheck::degraded(cost_message)
            },
        );

        let state = self.context.circuit_breaker.state();
        let breaker_message = format!("Circuit breaker is {}", state);
        checks.insert(
            "circuit_breaker".to_string(),
            if state == CircuitState::Open {
                HealthCheck::unhealthy(breaker_message)
            } else {
                HealthCheck::healthy(breaker_message)
            },
        );

        HealthReport::from_checks(self.context.clock.now(), checks)
    }

    async fn check_provider(&self) -> HealthCheck {
        let Some(provider) = &self.provider else {
            return HealthCheck::unhealthy("No completion provider configured");
        };

        let started = Instant::now();
        let ping = tokio::time::timeout(
            self.config.completion.request_timeout,
            provider.ping(&self.config.completion.model),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match ping {
            Ok(Ok(())) => HealthCheck::healthy("API key valid").with_response_time(elapsed_ms),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Provider ping failed");
                HealthCheck::unhealthy("API key invalid or expired").with_response_time(elapsed_ms)
            }
            Err(_) => HealthCheck::unhealthy("Provider ping timed out").with_response_time(elapsed_ms),
        }
    }

    /// Drop every cached roadmap. Returns how many were removed.
    pub async fn clear_cache(&self) -> SkillbridgeResult<u64> {
        let removed = self.context.cache.clear().await?;
        tracing::info!(removed, "Roadmap cache cleared");
        Ok(removed)
    }
}

impl std::fmt::Debug for RoadmapOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadmapOrchestrator")
            .field("provider", &self.provider.as_ref().map(|p| p.provider_id()))
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skillbridge_core::GeneratedBy;
    use skillbridge_llm::CompletionResponse;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replies with the same text on every call.
    struct FixedProvider {
        text: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        fn provider_id(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: self.text.clone(),
                total_tokens: Some(2000),
            })
        }
    }

    fn engine(text: &str) -> (RoadmapOrchestrator, Arc<FixedProvider>) {
        let config = EngineConfig::default();
        let provider = Arc::new(FixedProvider {
            text: text.to_string(),
            calls: AtomicU32::new(0),
        });
        let context = ResilienceContext::from_config(&config);
        let engine = RoadmapOrchestrator::new(
            config,
            context,
            Some(provider.clone() as Arc<dyn CompletionProvider>),
        );
        (engine, provider)
    }

    #[tokio::test]
    async fn test_no_provider_uses_deterministic_generator() {
        let config = EngineConfig::default();
        let context = ResilienceContext::from_config(&config);
        let engine = RoadmapOrchestrator::new(config, context, None);

        let roadmap = engine
            .generate_roadmap(
                "Python",
                SkillLevel::Beginner,
                TimeAvailability::PartTime,
                UserContext::default(),
                true,
            )
            .await;
        assert_eq!(roadmap.generated_by, GeneratedBy::Deterministic);
        assert_eq!(roadmap.cost, 0.0);
        assert_eq!(engine.context().rate_limiter.current_calls(), 0);
    }

    #[tokio::test]
    async fn test_success_charges_cost_and_normalizes_metadata() {
        let (engine, provider) =
            engine(r#"{"domain": "python programming", "modules": [{"title": "Basics"}]}"#);
        let roadmap = engine
            .generate_roadmap(
                "Python",
                SkillLevel::Intermediate,
                TimeAvailability::FullTime,
                UserContext::default(),
                false,
            )
            .await;

        assert_eq!(roadmap.generated_by, GeneratedBy::Ai);
        assert_eq!(roadmap.domain, "Python");
        assert_eq!(roadmap.skill_level, SkillLevel::Intermediate);
        // 1500 prompt tokens at 0.0015 plus 500 completion tokens at 0.002
        assert_eq!(roadmap.cost, 0.00325);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let usage = engine.context().cost_tracker.get_usage_stats();
        assert_eq!(usage.request_count, 1);
        assert!((usage.current_cost - 0.00325).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_prose_reply_is_tagged_as_text_fallback() {
        let (engine, _) = engine("1. Learn variables and control flow\n2. Write small scripts often");
        let roadmap = engine
            .generate_roadmap(
                "Python",
                SkillLevel::Beginner,
                TimeAvailability::Casual,
                UserContext::default(),
                false,
            )
            .await;
        assert_eq!(roadmap.generated_by, GeneratedBy::AiFallbackText);
        assert_eq!(roadmap.modules.len(), 2);
    }

    #[tokio::test]
    async fn test_health_reports_missing_provider() {
        let config = EngineConfig::default();
        let context = ResilienceContext::from_config(&config);
        let engine = RoadmapOrchestrator::new(config, context, None);

        let report = engine.health_check().await;
        assert_eq!(report.overall_status, skillbridge_core::HealthStatus::Unhealthy);
        assert_eq!(report.checks.len(), 4);
        assert_eq!(
            report.checks["circuit_breaker"].message,
            "Circuit breaker is CLOSED"
        );
    }
}
