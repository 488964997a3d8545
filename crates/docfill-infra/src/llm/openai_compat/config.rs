//! Configuration and defaults for OpenAI-compatible providers.

use secrecy::SecretString;

use docfill_types::llm::ProviderCapabilities;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Name reported in logs and spans (e.g. "openai").
    pub provider_name: String,
    /// Base URL including the version segment, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

/// OpenAI defaults: 128K context, 16K output.
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            max_context_tokens: 128_000,
            max_output_tokens: 16_384,
        },
    }
}

/// Defaults for a self-hosted or third-party endpoint at `base_url`.
pub fn custom_defaults(api_key: SecretString, model: &str, base_url: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai_compatible".into(),
        base_url: base_url.trim_end_matches('/').into(),
        api_key,
        model: model.into(),
        capabilities: ProviderCapabilities {
            max_context_tokens: 32_000,
            max_output_tokens: 4_096,
        },
    }
}
