//! SkillBridge LLM - Completion Provider Layer
//!
//! Provider-agnostic chat-completion trait used by the roadmap engine, plus
//! the concrete OpenAI client under [`providers`]. The engine owns every
//! resilience concern (rate limiting, retries, circuit breaking); providers
//! only translate a request into one HTTP call and classify its failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillbridge_core::{CompletionConfig, LlmError};

pub mod providers;

pub use providers::{OpenAIClient, OpenAICompletionProvider};

// ============================================================================
// MESSAGES
// ============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ============================================================================
// REQUEST / RESPONSE
// ============================================================================

/// Provider-neutral chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl CompletionRequest {
    /// Build a request using the sampling parameters from `config`.
    pub fn from_config(config: &CompletionConfig, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: config.model.clone(),
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }

    /// Minimal request used to probe provider reachability.
    pub fn ping(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user("Hello")],
            max_tokens: 5,
            temperature: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Text returned by a provider along with its reported usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    /// Total tokens billed for the call, when the provider reports it
    pub total_tokens: Option<u32>,
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Trait for chat-completion providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// Errors must be classified precisely: throttling as
/// [`LlmError::RateLimited`], deadline overruns as [`LlmError::Timeout`],
/// error statuses as [`LlmError::RequestFailed`] with the HTTP status. The
/// engine's retry policy depends on that split.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short identifier used in logs and errors (e.g. "openai").
    fn provider_id(&self) -> &str;

    /// Run one chat completion.
    ///
    /// # Arguments
    /// * `request` - Model, messages and sampling parameters
    ///
    /// # Returns
    /// * `Ok(CompletionResponse)` - The first choice's text and usage
    /// * `Err(LlmError)` - Classified provider failure
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Check that the provider answers at all, using a five-token completion.
    async fn ping(&self, model: &str) -> Result<(), LlmError> {
        self.complete(&CompletionRequest::ping(model)).await.map(|_| ())
    }
}
