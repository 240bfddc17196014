//! OpenAI chat-completion provider implementation

use super::client::OpenAIClient;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, Message};
use crate::providers::invalid_response;
use crate::{CompletionProvider, CompletionRequest, CompletionResponse, Role};
use async_trait::async_trait;
use skillbridge_core::{CompletionConfig, LlmError};

/// OpenAI chat-completion provider.
pub struct OpenAICompletionProvider {
    client: OpenAIClient,
}

impl OpenAICompletionProvider {
    pub fn new(client: OpenAIClient) -> Self {
        Self { client }
    }

    /// Build the provider from config; `None`-key configs are rejected.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, LlmError> {
        OpenAIClient::from_config(config).map(Self::new)
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_wire(request: &CompletionRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|m| Message {
                role: role_name(m.role).to_string(),
                content: m.content.clone(),
            })
            .collect(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        top_p: request.top_p,
        frequency_penalty: request.frequency_penalty,
        presence_penalty: request.presence_penalty,
    }
}

fn from_wire(response: ChatCompletionResponse) -> Result<CompletionResponse, LlmError> {
    let total_tokens = response
        .usage
        .as_ref()
        .and_then(|u| u32::try_from(u.total_tokens).ok());

    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| invalid_response("openai", "No completion in response"))?;

    Ok(CompletionResponse {
        content,
        total_tokens,
    })
}

#[async_trait]
impl CompletionProvider for OpenAICompletionProvider {
    fn provider_id(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = to_wire(request);
        let response: ChatCompletionResponse =
            self.client.request("chat/completions", &body).await?;
        let response = from_wire(response)?;

        tracing::debug!(
            provider = "openai",
            model = %request.model,
            total_tokens = ?response.total_tokens,
            "Chat completion succeeded"
        );

        Ok(response)
    }
}

impl std::fmt::Debug for OpenAICompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompletionProvider")
            .field("client", &self.client)
            .finish()
    }
}
