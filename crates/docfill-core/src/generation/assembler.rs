//! Generative strategy: delegate filling to a language model, then validate.
//!
//! Failure here is an expected outcome. The orchestrator logs it and falls
//! back to the deterministic rewriter, so every error path returns a
//! `GeneratorError` rather than panicking or retrying.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, info_span};

use docfill_types::artifact::GenerationMethod;
use docfill_types::config::GenerationConfig;
use docfill_types::error::GeneratorError;
use docfill_types::llm::{CompletionRequest, Message};
use docfill_types::placeholder::PlaceholderKind;

use super::generator::{GenerationInput, Generator};
use crate::llm::box_provider::BoxLlmProvider;

/// System prompt for document filling.
const FILL_SYSTEM_PROMPT: &str = "You fill in legal document templates. \
You receive a template body, an inventory of its placeholders with the values \
resolved for each, and the client's raw answers. Return the complete filled \
document and nothing else: no commentary, no code fences.

Rules:
- Keep the template's structure, markup, headings and wording exactly as given.
- Replace every occurrence of every placeholder token with its resolved value.
- Where a placeholder is marked UNRESOLVED, write the unresolved text given in \
the inventory instead of the token.
- You may adjust grammar immediately around a substituted value (articles, \
plurals, pronouns) so the sentence reads naturally.
- Never invent facts that are not in the answers.";

/// Fills a template through an external language-generation service.
pub struct GenerativeAssembler {
    provider: Arc<BoxLlmProvider>,
    model: String,
    timeout: Duration,
    min_length_ratio: f64,
    max_output_tokens: u32,
    temperature: f64,
    sentinel: String,
}

impl GenerativeAssembler {
    pub fn new(
        provider: Arc<BoxLlmProvider>,
        model: impl Into<String>,
        config: &GenerationConfig,
        sentinel: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout: Duration::from_secs(config.ai_timeout_secs),
            min_length_ratio: config.min_length_ratio,
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            sentinel: sentinel.into(),
        }
    }

    /// Override the round-trip timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the completion request for one template.
    pub fn build_request(&self, input: &GenerationInput) -> CompletionRequest {
        let mut prompt = String::with_capacity(input.template.body.len() * 2);

        prompt.push_str("<placeholders>\n");
        for placeholder in &input.template.placeholders {
            let value = input
                .mappings
                .iter()
                .find(|m| m.placeholder_key == placeholder.key)
                .and_then(|m| m.value.as_resolved());
            let tokens = placeholder.raw_tokens().join(" | ");
            let _ = write!(prompt, "- key: {} ({})", placeholder.key, placeholder.kind);
            if let Some(label) = &placeholder.label {
                let _ = write!(prompt, ", label: {label}");
            }
            let _ = write!(prompt, "\n  tokens: {tokens}\n");
            match value {
                Some(value) => {
                    let _ = writeln!(prompt, "  value: {value}");
                }
                None => {
                    let _ = writeln!(prompt, "  value: UNRESOLVED (write \"{}\")", self.sentinel);
                }
            }
        }
        prompt.push_str("</placeholders>\n\n");

        let answers = serde_json::to_string_pretty(input.answers.as_ref()).unwrap_or_default();
        let _ = write!(prompt, "<answers>\n{answers}\n</answers>\n\n");
        let _ = write!(prompt, "<template>\n{}\n</template>", input.template.body);

        let max_tokens = self
            .max_output_tokens
            .min(self.provider.capabilities().max_output_tokens);

        CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            system: Some(FILL_SYSTEM_PROMPT.to_string()),
            max_tokens,
            temperature: Some(self.temperature),
        }
    }

    /// Check a model reply and return the cleaned body.
    ///
    /// Rejects output that is empty, still carries a raw token of a
    /// placeholder that had a resolved value, or is shorter than
    /// `min_length_ratio` of the template.
    pub fn validate(&self, input: &GenerationInput, output: &str) -> Result<String, GeneratorError> {
        let body = strip_code_fence(output);
        if body.trim().is_empty() {
            return Err(GeneratorError::EmptyOutput);
        }

        let mut unfilled = Vec::new();
        for placeholder in &input.template.placeholders {
            // blanks are plain underscores; prose may legitimately contain them
            if placeholder.kind == PlaceholderKind::Underscore {
                continue;
            }
            let resolved = input
                .mappings
                .iter()
                .any(|m| m.placeholder_key == placeholder.key && m.value.is_resolved());
            if !resolved {
                continue;
            }
            for token in placeholder.raw_tokens() {
                if body.contains(token) {
                    unfilled.push(token.to_string());
                }
            }
        }
        if !unfilled.is_empty() {
            return Err(GeneratorError::UnfilledTokens(unfilled));
        }

        let template_len = input.template.body.chars().count();
        let minimum = (template_len as f64 * self.min_length_ratio).ceil() as usize;
        let actual = body.chars().count();
        if actual < minimum {
            return Err(GeneratorError::TooShort { actual, minimum });
        }

        Ok(body.to_string())
    }
}

impl Generator for GenerativeAssembler {
    fn method(&self) -> GenerationMethod {
        GenerationMethod::Ai
    }

    async fn generate(&self, input: &GenerationInput) -> Result<String, GeneratorError> {
        let request = self.build_request(input);

        let span = info_span!(
            "gen_ai.fill_document",
            gen_ai.operation.name = "fill_document",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            template_id = %input.template_id,
        );

        let response = tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .instrument(span)
            .await
            .map_err(|_| GeneratorError::Timeout(self.timeout.as_secs()))??;

        debug!(
            template_id = %input.template_id,
            gen_ai.response.id = %response.id,
            gen_ai.usage.input_tokens = response.usage.input_tokens,
            gen_ai.usage.output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            "assembler reply received"
        );

        self.validate(input, &response.content)
    }
}

/// Remove a surrounding markdown code fence, if the model added one.
fn strip_code_fence(output: &str) -> &str {
    let trimmed = output.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return output;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return output;
    };
    // drop the info string (```html)
    match rest.split_once('\n') {
        Some((_, inner)) => inner.trim_end_matches('\n'),
        None => rest,
    }
}
