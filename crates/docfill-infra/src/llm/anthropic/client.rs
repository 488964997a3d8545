//! AnthropicProvider -- concrete [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends requests to the Anthropic Messages API (`/v1/messages`) with
//! proper authentication headers.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use secrecy::{ExposeSecret, SecretString};

use docfill_core::llm::provider::LlmProvider;
use docfill_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, ProviderCapabilities,
    StopReason, Usage,
};

use super::types::{AnthropicMessage, AnthropicRequest, AnthropicResponse, ErrorPayload};
use crate::llm::{build_http_client, error_for_status};

/// Anthropic Claude LLM provider.
///
/// The API key is only exposed when constructing request headers.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    capabilities: ProviderCapabilities,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let capabilities = Self::capabilities_for_model(&model);
        Ok(Self {
            client: build_http_client()?,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
            capabilities,
        })
    }

    /// The default model for this provider.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Override the base URL (proxies, gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn capabilities_for_model(model: &str) -> ProviderCapabilities {
        let max_output_tokens = if model.contains("opus") {
            32_000
        } else if model.contains("sonnet") || model.contains("haiku") {
            8_192
        } else {
            // Conservative default for unknown models
            4_096
        };
        ProviderCapabilities {
            max_context_tokens: 200_000,
            max_output_tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into an [`AnthropicRequest`].
    ///
    /// System-role messages are folded into the top-level `system` field,
    /// which is the only place the Messages API accepts them.
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let mut system: Vec<&str> = request.system.iter().map(String::as_str).collect();
        let mut messages = Vec::with_capacity(request.messages.len());
        for m in &request.messages {
            match m.role {
                MessageRole::System => system.push(&m.content),
                MessageRole::User => messages.push(AnthropicMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                }),
            }
        }

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        AnthropicRequest {
            model,
            max_tokens: request.max_tokens,
            messages,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            temperature: request.temperature,
        }
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_anthropic_request(request);

        let response = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response.headers().get(reqwest::header::RETRY_AFTER).cloned();
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorPayload>(&raw)
                .map(|p| p.error.message)
                .unwrap_or(raw);
            return Err(error_for_status(status, retry_after.as_ref(), message));
        }

        let resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let stop_reason = resp
            .stop_reason
            .as_deref()
            .and_then(StopReason::from_wire)
            .unwrap_or(StopReason::EndTurn);

        Ok(CompletionResponse {
            content: resp.text(),
            id: resp.id,
            model: resp.model,
            stop_reason,
            usage: Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            },
        })
    }
}
