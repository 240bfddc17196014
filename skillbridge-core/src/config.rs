//! Engine configuration
//!
//! Every section has a `Default` carrying the production constants and a
//! `from_env()` constructor reading `SKILLBRIDGE_*` overrides.

use crate::error::{ConfigError, LlmError, SkillbridgeResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Read and parse an environment variable, falling back to `default` when it
/// is unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// RATE LIMITING
// ============================================================================

/// Sliding-window limit on outbound completion calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_calls: u32,
    pub time_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 60,
            time_window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// # Environment Variables
    /// - `SKILLBRIDGE_RATE_LIMIT_MAX_CALLS` (default: 60)
    /// - `SKILLBRIDGE_RATE_LIMIT_WINDOW_SECS` (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_calls: env_or("SKILLBRIDGE_RATE_LIMIT_MAX_CALLS", defaults.max_calls),
            time_window: Duration::from_secs(env_or(
                "SKILLBRIDGE_RATE_LIMIT_WINDOW_SECS",
                defaults.time_window.as_secs(),
            )),
        }
    }
}

// ============================================================================
// COST GOVERNANCE
// ============================================================================

/// Daily spend ceiling for the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    /// USD allowed per calendar day
    pub daily_limit: f64,
    /// USD reserved against the budget before a call, replaced by the actual cost afterwards
    pub estimated_request_cost: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            daily_limit: 50.0,
            estimated_request_cost: 0.1,
        }
    }
}

impl CostConfig {
    /// # Environment Variables
    /// - `SKILLBRIDGE_DAILY_COST_LIMIT` (default: 50.0)
    /// - `SKILLBRIDGE_ESTIMATED_REQUEST_COST` (default: 0.1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            daily_limit: env_or("SKILLBRIDGE_DAILY_COST_LIMIT", defaults.daily_limit),
            estimated_request_cost: env_or(
                "SKILLBRIDGE_ESTIMATED_REQUEST_COST",
                defaults.estimated_request_cost,
            ),
        }
    }
}

/// Token pricing used to turn usage into cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// USD per 1000 prompt tokens
    pub input_per_1k: f64,
    /// USD per 1000 completion tokens
    pub output_per_1k: f64,
    /// Share of total tokens billed as input
    pub input_share: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_1k: 0.0015,
            output_per_1k: 0.002,
            input_share: 0.75,
        }
    }
}

impl PricingConfig {
    /// # Environment Variables
    /// - `SKILLBRIDGE_PRICE_INPUT_PER_1K` (default: 0.0015)
    /// - `SKILLBRIDGE_PRICE_OUTPUT_PER_1K` (default: 0.002)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            input_per_1k: env_or("SKILLBRIDGE_PRICE_INPUT_PER_1K", defaults.input_per_1k),
            output_per_1k: env_or("SKILLBRIDGE_PRICE_OUTPUT_PER_1K", defaults.output_per_1k),
            input_share: defaults.input_share,
        }
    }
}

// ============================================================================
// CIRCUIT BREAKER
// ============================================================================

/// Configuration for the circuit breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing a probe
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// # Environment Variables
    /// - `SKILLBRIDGE_CIRCUIT_FAILURE_THRESHOLD`: failures before opening (default: 5)
    /// - `SKILLBRIDGE_CIRCUIT_TIMEOUT_SECS`: how long the circuit stays open (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            failure_threshold: env_or(
                "SKILLBRIDGE_CIRCUIT_FAILURE_THRESHOLD",
                defaults.failure_threshold,
            ),
            timeout: Duration::from_secs(env_or(
                "SKILLBRIDGE_CIRCUIT_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
        }
    }
}

// ============================================================================
// RETRY
// ============================================================================

/// Retry policy for completion calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound on a single backoff sleep
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Backoff before retrying after `attempt` (0-based): `base_delay * 2^attempt`,
    /// capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay before retrying `error` after `attempt`. A provider's retry-after
    /// hint lengthens the backoff, still capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32, error: &LlmError) -> Duration {
        let backoff = self.backoff(attempt);
        match error {
            LlmError::RateLimited { retry_after_ms, .. } => {
                let hint = Duration::from_millis(u64::try_from(*retry_after_ms).unwrap_or(0));
                backoff.max(hint.min(self.max_delay))
            }
            _ => backoff,
        }
    }

    /// # Environment Variables
    /// - `SKILLBRIDGE_MAX_RETRIES` (default: 3)
    /// - `SKILLBRIDGE_RETRY_BASE_DELAY_MS` (default: 1000)
    /// - `SKILLBRIDGE_RETRY_MAX_DELAY_MS` (default: 30000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_or("SKILLBRIDGE_MAX_RETRIES", defaults.max_retries),
            base_delay: Duration::from_millis(env_or(
                "SKILLBRIDGE_RETRY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(env_or(
                "SKILLBRIDGE_RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )),
        }
    }
}

// ============================================================================
// RESPONSE CACHE
// ============================================================================

/// Configuration for the roadmap response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Maximum number of cached roadmaps
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600), // 1 hour
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// # Environment Variables
    /// - `SKILLBRIDGE_CACHE_TTL_SECS` (default: 3600)
    /// - `SKILLBRIDGE_CACHE_MAX_ENTRIES` (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: Duration::from_secs(env_or(
                "SKILLBRIDGE_CACHE_TTL_SECS",
                defaults.ttl.as_secs(),
            )),
            max_entries: env_or("SKILLBRIDGE_CACHE_MAX_ENTRIES", defaults.max_entries),
        }
    }
}

// ============================================================================
// COMPLETION SERVICE
// ============================================================================

/// Chat-completion endpoint and sampling parameters.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub base_url: String,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Deadline for a single provider call, independent of retry backoff
    pub request_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 3000,
            temperature: 0.7,
            top_p: 0.9,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl CompletionConfig {
    /// # Environment Variables
    /// - `SKILLBRIDGE_OPENAI_API_KEY`, falling back to `OPENAI_API_KEY`
    /// - `SKILLBRIDGE_OPENAI_BASE_URL` (default: https://api.openai.com/v1)
    /// - `SKILLBRIDGE_OPENAI_MODEL` (default: gpt-3.5-turbo)
    /// - `SKILLBRIDGE_OPENAI_MAX_TOKENS` (default: 3000)
    /// - `SKILLBRIDGE_OPENAI_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = std::env::var("SKILLBRIDGE_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        Self {
            base_url: std::env::var("SKILLBRIDGE_OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            api_key,
            model: std::env::var("SKILLBRIDGE_OPENAI_MODEL").unwrap_or(defaults.model),
            max_tokens: env_or("SKILLBRIDGE_OPENAI_MAX_TOKENS", defaults.max_tokens),
            temperature: env_or("SKILLBRIDGE_OPENAI_TEMPERATURE", defaults.temperature),
            top_p: defaults.top_p,
            frequency_penalty: defaults.frequency_penalty,
            presence_penalty: defaults.presence_penalty,
            request_timeout: Duration::from_secs(env_or(
                "SKILLBRIDGE_OPENAI_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

// ============================================================================
// MASTER CONFIG
// ============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub rate_limit: RateLimitConfig,
    pub cost: CostConfig,
    pub pricing: PricingConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub completion: CompletionConfig,
}

impl EngineConfig {
    /// Load every section from the environment.
    pub fn from_env() -> Self {
        Self {
            rate_limit: RateLimitConfig::from_env(),
            cost: CostConfig::from_env(),
            pricing: PricingConfig::from_env(),
            circuit_breaker: CircuitBreakerConfig::from_env(),
            retry: RetryConfig::from_env(),
            cache: CacheConfig::from_env(),
            completion: CompletionConfig::from_env(),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - rate limit max_calls > 0 and a non-zero window
    /// - daily_limit > 0 and estimated_request_cost >= 0
    /// - circuit failure_threshold > 0
    /// - max_tokens > 0 and a non-zero request timeout
    /// - pricing figures are non-negative and input_share in [0, 1]
    pub fn validate(&self) -> SkillbridgeResult<()> {
        if self.rate_limit.max_calls == 0 {
            return Err(invalid(
                "rate_limit.max_calls",
                self.rate_limit.max_calls,
                "max_calls must be greater than 0",
            )
            .into());
        }

        if self.rate_limit.time_window.is_zero() {
            return Err(invalid(
                "rate_limit.time_window",
                format!("{:?}", self.rate_limit.time_window),
                "time_window must be positive",
            )
            .into());
        }

        if !(self.cost.daily_limit > 0.0) {
            return Err(invalid(
                "cost.daily_limit",
                self.cost.daily_limit,
                "daily_limit must be greater than 0",
            )
            .into());
        }

        if !(self.cost.estimated_request_cost >= 0.0) {
            return Err(invalid(
                "cost.estimated_request_cost",
                self.cost.estimated_request_cost,
                "estimated_request_cost must be non-negative",
            )
            .into());
        }

        if self.pricing.input_per_1k < 0.0 || self.pricing.output_per_1k < 0.0 {
            return Err(invalid(
                "pricing",
                format!("{}/{}", self.pricing.input_per_1k, self.pricing.output_per_1k),
                "token prices must be non-negative",
            )
            .into());
        }

        if !(0.0..=1.0).contains(&self.pricing.input_share) {
            return Err(invalid(
                "pricing.input_share",
                self.pricing.input_share,
                "input_share must be between 0.0 and 1.0",
            )
            .into());
        }

        if self.circuit_breaker.failure_threshold == 0 {
            return Err(invalid(
                "circuit_breaker.failure_threshold",
                self.circuit_breaker.failure_threshold,
                "failure_threshold must be greater than 0",
            )
            .into());
        }

        if self.completion.max_tokens == 0 {
            return Err(invalid(
                "completion.max_tokens",
                self.completion.max_tokens,
                "max_tokens must be greater than 0",
            )
            .into());
        }

        if self.completion.request_timeout.is_zero() {
            return Err(invalid(
                "completion.request_timeout",
                format!("{:?}", self.completion.request_timeout),
                "request_timeout must be positive",
            )
            .into());
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
