//! Error types for roadmap generation

use thiserror::Error;

/// Category of a completion-service failure, used to pick retry behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Provider throttled us (HTTP 429 or equivalent)
    RateLimit,
    /// The call did not finish within the request timeout
    Timeout,
    /// Provider answered with an error status
    Api,
    /// Anything else (transport failure, malformed body, ...)
    Unknown,
}

/// LLM provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No LLM provider configured")]
    ProviderNotConfigured,

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: i64,
    },

    #[error("Request to {provider} timed out after {elapsed_ms}ms")]
    Timeout { provider: String, elapsed_ms: u64 },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl LlmError {
    /// Classify the error for the orchestrator's retry policy.
    ///
    /// A `RequestFailed` with status 0 never reached the provider (connection
    /// refused, DNS, TLS); it is reported as `Unknown`.
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::RateLimited { .. } => ProviderErrorKind::RateLimit,
            Self::Timeout { .. } => ProviderErrorKind::Timeout,
            Self::RequestFailed { status, .. } if *status > 0 => ProviderErrorKind::Api,
            Self::RequestFailed { .. }
            | Self::InvalidResponse { .. }
            | Self::ProviderNotConfigured => ProviderErrorKind::Unknown,
        }
    }

    /// True for failures that count against the circuit breaker on every attempt.
    pub fn counts_as_breaker_failure(&self) -> bool {
        !matches!(
            self.kind(),
            ProviderErrorKind::RateLimit | ProviderErrorKind::Timeout
        )
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Reasons the AI path could not produce a roadmap.
///
/// These never leave the engine's public entry point; the orchestrator maps
/// each of them onto the deterministic fallback.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    #[error("Daily cost budget exceeded: {current_cost:.4} + {estimated_cost:.4} > {daily_limit:.4}")]
    BudgetExceeded {
        current_cost: f64,
        estimated_cost: f64,
        daily_limit: f64,
    },

    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("No completion provider available")]
    ProviderUnavailable,

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: LlmError },

    #[error("Generation cancelled by caller")]
    Cancelled,
}

/// Failures reported by downstream collaborators (persistence, notification).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("Failed to persist roadmap for user {user_id}: {reason}")]
    PersistFailed { user_id: String, reason: String },

    #[error("Failed to deliver notification to user {user_id}: {reason}")]
    NotifyFailed { user_id: String, reason: String },
}

/// Master error type for all SkillBridge errors.
#[derive(Debug, Clone, Error)]
pub enum SkillbridgeError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Result type alias for SkillBridge operations.
pub type SkillbridgeResult<T> = Result<T, SkillbridgeError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_kind_classification() {
        let rate = LlmError::RateLimited {
            provider: "openai".to_string(),
            retry_after_ms: 1500,
        };
        assert_eq!(rate.kind(), ProviderErrorKind::RateLimit);
        assert!(!rate.counts_as_breaker_failure());

        let timeout = LlmError::Timeout {
            provider: "openai".to_string(),
            elapsed_ms: 30_000,
        };
        assert_eq!(timeout.kind(), ProviderErrorKind::Timeout);
        assert!(!timeout.counts_as_breaker_failure());

        let api = LlmError::RequestFailed {
            provider: "openai".to_string(),
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(api.kind(), ProviderErrorKind::Api);
        assert!(api.counts_as_breaker_failure());

        let transport = LlmError::RequestFailed {
            provider: "openai".to_string(),
            status: 0,
            message: "connection refused".to_string(),
        };
        assert_eq!(transport.kind(), ProviderErrorKind::Unknown);
        assert!(transport.counts_as_breaker_failure());
    }

    #[test]
    fn test_llm_error_display_rate_limited() {
        let err = LlmError::RateLimited {
            provider: "openai".to_string(),
            retry_after_ms: 1500,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Rate limited"));
        assert!(msg.contains("openai"));
        assert!(msg.contains("1500"));
    }

    #[test]
    fn test_generation_error_display_budget() {
        let err = GenerationError::BudgetExceeded {
            current_cost: 49.95,
            estimated_cost: 0.1,
            daily_limit: 50.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("budget exceeded"));
        assert!(msg.contains("50.0000"));
    }

    #[test]
    fn test_skillbridge_error_from_variants() {
        let llm = SkillbridgeError::from(LlmError::ProviderNotConfigured);
        assert!(matches!(llm, SkillbridgeError::Llm(_)));

        let config = SkillbridgeError::from(ConfigError::MissingRequired {
            field: "api_key".to_string(),
        });
        assert!(matches!(config, SkillbridgeError::Config(_)));

        let generation = SkillbridgeError::from(GenerationError::CircuitOpen);
        assert!(matches!(generation, SkillbridgeError::Generation(_)));

        let sink = SkillbridgeError::from(SinkError::PersistFailed {
            user_id: "42".to_string(),
            reason: "db down".to_string(),
        });
        assert!(matches!(sink, SkillbridgeError::Sink(_)));
    }
}
