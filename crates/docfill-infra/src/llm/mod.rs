//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`] trait defined in
//! `docfill-core`: Anthropic Claude and any OpenAI-compatible endpoint.
//!
//! Also provides a provider factory ([`create_provider`]) that constructs
//! the right provider from a [`ProviderConfig`], and a connection test
//! ([`test_provider_connection`]) for verifying credentials.
//!
//! [`LlmProvider`]: docfill_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod openai_compat;

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use secrecy::SecretString;

use docfill_core::llm::box_provider::BoxLlmProvider;
use docfill_types::llm::{
    CompletionRequest, LlmError, Message, MessageRole, ProviderConfig, ProviderType,
};

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;

/// Transport timeout. The assembler enforces its own, shorter deadline.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Create a [`BoxLlmProvider`] from a [`ProviderConfig`].
///
/// # Errors
///
/// Returns `AuthenticationFailed` when no API key is provided.
pub fn create_provider(
    config: &ProviderConfig,
    api_key: Option<&str>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or(LlmError::AuthenticationFailed)?;
    let secret = SecretString::from(key.to_string());

    match config.provider_type {
        ProviderType::Anthropic => {
            let mut provider = AnthropicProvider::new(secret, config.model.clone())?;
            if let Some(base_url) = config.base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::OpenAiCompatible => {
            let provider = match config.base_url.as_deref() {
                Some(base_url) => OpenAiCompatibleProvider::new(
                    openai_compat::config::custom_defaults(secret, &config.model, base_url),
                )?,
                None => OpenAiCompatibleProvider::openai(secret, &config.model)?,
            };
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// Read the provider's API key from its configured environment variable.
pub fn resolve_api_key(config: &ProviderConfig) -> Option<String> {
    std::env::var(config.api_key_env())
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Send a minimal completion request to verify the key and endpoint.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: String::new(),
        messages: vec![Message {
            role: MessageRole::User,
            content: "Hello".to_string(),
        }],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
    };
    provider.complete(&request).await?;
    Ok(())
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| LlmError::Provider {
            message: format!("failed to create HTTP client: {e}"),
        })
}

/// Map a non-success HTTP status to an [`LlmError`].
pub(crate) fn error_for_status(
    status: StatusCode,
    retry_after: Option<&HeaderValue>,
    message: String,
) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<f64>().ok())
                .map(|secs| (secs * 1000.0) as u64),
        },
        503 | 529 => LlmError::Overloaded(message),
        400 | 404 | 413 | 422 => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}
