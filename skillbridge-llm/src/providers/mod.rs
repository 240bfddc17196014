//! LLM provider implementations
//!
//! Concrete implementations of [`crate::CompletionProvider`].

use skillbridge_core::LlmError;

pub mod openai;

pub use openai::{OpenAIClient, OpenAICompletionProvider};

pub(crate) fn rate_limited(provider: &str, retry_after_ms: i64) -> LlmError {
    LlmError::RateLimited {
        provider: provider.to_string(),
        retry_after_ms,
    }
}

pub(crate) fn request_failed(provider: &str, status: i32, message: impl Into<String>) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> LlmError {
    LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn timed_out(provider: &str, elapsed_ms: u64) -> LlmError {
    LlmError::Timeout {
        provider: provider.to_string(),
        elapsed_ms,
    }
}
