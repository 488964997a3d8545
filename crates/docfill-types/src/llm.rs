//! Provider-agnostic shapes for one-shot document completions.
//!
//! The assembler builds a [`CompletionRequest`]; each adapter in
//! docfill-infra translates it to its wire format and maps the reply back
//! into a [`CompletionResponse`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who a prompt message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    /// The role name both supported APIs use on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A single non-streaming completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Empty means "the provider's configured model".
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Why generation ended. A filled document cut off at `MaxTokens` usually
/// fails the length check afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Accepts both Anthropic (`end_turn`, `max_tokens`) and OpenAI
    /// (`stop`, `length`) spellings.
    pub fn from_wire(reason: &str) -> Option<Self> {
        match reason {
            "end_turn" | "stop" => Some(StopReason::EndTurn),
            "max_tokens" | "length" => Some(StopReason::MaxTokens),
            "stop_sequence" => Some(StopReason::StopSequence),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::EndTurn => "end_turn",
            StopReason::MaxTokens => "max_tokens",
            StopReason::StopSequence => "stop_sequence",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from a provider call. All of them are recoverable by the
/// deterministic fallback.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Token limits of the configured model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub max_context_tokens: u32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderType::Anthropic => "anthropic",
            ProviderType::OpenAiCompatible => "openai_compatible",
        })
    }
}

/// The `[provider]` table of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub model: String,
    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key. Defaults per provider type.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    /// The environment variable consulted for the API key.
    pub fn api_key_env(&self) -> &str {
        match (&self.api_key_env, self.provider_type) {
            (Some(name), _) => name,
            (None, ProviderType::Anthropic) => "ANTHROPIC_API_KEY",
            (None, ProviderType::OpenAiCompatible) => "OPENAI_API_KEY",
        }
    }
}
