//! Configuration types for docfill.
//!
//! `DocfillConfig` represents the top-level `config.toml` that controls
//! generation concurrency and timeouts, field-mapping policy, and the
//! optional language-generation provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::llm::ProviderConfig;
use crate::mapping::UnresolvedPolicy;

/// Top-level configuration.
///
/// Loaded from `~/.docfill/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocfillConfig {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub mapping: MappingConfig,

    /// Language-generation provider. Absent means deterministic-only.
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
}

/// Settings for the hybrid generation orchestrator and assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Templates processed concurrently within one batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Timeout for one AI round trip, in seconds.
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,

    /// AI output shorter than this fraction of the template is rejected.
    #[serde(default = "default_min_length_ratio")]
    pub min_length_ratio: f64,

    /// Never attempt AI generation, regardless of request options.
    #[serde(default)]
    pub force_deterministic: bool,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_max_concurrency() -> usize {
    3
}

fn default_ai_timeout_secs() -> u64 {
    120
}

fn default_min_length_ratio() -> f64 {
    0.5
}

fn default_max_output_tokens() -> u32 {
    8_192
}

fn default_temperature() -> f64 {
    0.2
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            ai_timeout_secs: default_ai_timeout_secs(),
            min_length_ratio: default_min_length_ratio(),
            force_deterministic: false,
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Settings for the smart field mapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,

    /// Text written for unresolved placeholders under the `marker` policy.
    #[serde(default = "default_unresolved_marker")]
    pub unresolved_marker: String,

    /// Shortest word that may link a placeholder to an answer in the
    /// partial strategy.
    #[serde(default = "default_min_partial_word_len")]
    pub min_partial_word_len: usize,

    /// Extra alias entries: canonical placeholder key (or word) to candidate
    /// answer keys. Tried before the built-in candidates for the same key.
    #[serde(default)]
    pub aliases: HashMap<String, Vec<String>>,
}

fn default_unresolved_marker() -> String {
    "Not Provided".to_string()
}

fn default_min_partial_word_len() -> usize {
    4
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::default(),
            unresolved_marker: default_unresolved_marker(),
            min_partial_word_len: default_min_partial_word_len(),
            aliases: HashMap::new(),
        }
    }
}

impl MappingConfig {
    /// Text the rewriter substitutes for an unresolved placeholder.
    pub fn sentinel(&self) -> &str {
        match self.unresolved {
            UnresolvedPolicy::Empty => "",
            UnresolvedPolicy::Marker => &self.unresolved_marker,
        }
    }
}
