//! OpenAI HTTP client

use super::types::ApiError;
use crate::providers::{invalid_response, rate_limited, request_failed, timed_out};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use skillbridge_core::{CompletionConfig, LlmError};
use std::time::{Duration, Instant};

const PROVIDER: &str = "openai";

/// OpenAI API client.
///
/// Throttling is handled by the caller. Each request carries its own
/// deadline so that a hung connection surfaces as [`LlmError::Timeout`].
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `timeout` - Per-request deadline
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout,
        }
    }

    /// Build a client from the completion config.
    ///
    /// Fails with [`LlmError::ProviderNotConfigured`] when no API key is set.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(LlmError::ProviderNotConfigured)?;
        Ok(Self::new(api_key, config.request_timeout).with_base_url(config.base_url.clone()))
    }

    /// Point the client at a different endpoint (proxies, compatible servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body to `endpoint` and decode the JSON answer.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> Result<Res, LlmError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, started))?;

        let status = response.status();
        let retry_after_ms = parse_retry_after_ms(response.headers()).unwrap_or(0);

        if status.is_success() {
            return response.json().await.map_err(|e| {
                if e.is_timeout() {
                    timed_out(PROVIDER, started.elapsed().as_millis() as u64)
                } else {
                    invalid_response(PROVIDER, format!("Failed to parse response: {}", e))
                }
            });
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let error_msg = match serde_json::from_str::<ApiError>(&error_text) {
            Ok(api_error) => api_error.error.message,
            Err(_) => error_text,
        };

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => rate_limited(PROVIDER, retry_after_ms),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                timed_out(PROVIDER, started.elapsed().as_millis() as u64)
            }
            _ => request_failed(PROVIDER, status.as_u16() as i32, error_msg),
        })
    }

    fn map_transport_error(&self, err: reqwest::Error, started: Instant) -> LlmError {
        if err.is_timeout() {
            timed_out(PROVIDER, started.elapsed().as_millis() as u64)
        } else {
            request_failed(PROVIDER, 0, format!("HTTP request failed: {}", err))
        }
    }
}

fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<i64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .map(|seconds| (seconds * 1000.0) as i64)
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("1.5"));
        assert_eq!(parse_retry_after_ms(&headers), Some(1500));
    }

    #[test]
    fn test_parse_retry_after_missing_or_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after_ms(&headers), None);
        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after_ms(&headers), None);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = OpenAIClient::new("sk-very-secret", Duration::from_secs(5));
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = CompletionConfig::default();
        assert_eq!(
            OpenAIClient::from_config(&config).unwrap_err(),
            LlmError::ProviderNotConfigured
        );

        let config = CompletionConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:8080/v1/".to_string(),
            ..CompletionConfig::default()
        };
        let client = OpenAIClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_status_zero() {
        // Port 9 (discard) on loopback is closed in test environments.
        let client = OpenAIClient::new("sk-test", Duration::from_secs(5))
            .with_base_url("http://127.0.0.1:9");
        let err = client
            .request::<_, serde_json::Value>("chat/completions", &serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            LlmError::RequestFailed { status, .. } => assert_eq!(status, 0),
            LlmError::Timeout { .. } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
