use std::collections::HashSet;

use tracing::debug;

use docfill_types::answer::AnswerSet;
use docfill_types::config::MappingConfig;
use docfill_types::mapping::{FieldMapping, FieldValue, MatchStrategy};
use docfill_types::placeholder::{Placeholder, PlaceholderKind};

use super::alias::AliasTable;
use crate::template::normalize::{to_canonical, words};

/// Resolves placeholders against client answers.
///
/// Strategies are tried in order (exact, normalized, alias, partial) and
/// the first one that finds a present answer wins. Absent answers (null,
/// blank, objects) never satisfy a strategy. Resolution never fails; a
/// placeholder nothing matches is recorded as unresolved.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    aliases: AliasTable,
    min_partial_word_len: usize,
}

/// A present answer with its precomputed canonical key.
struct Candidate<'a> {
    key: &'a str,
    canonical: String,
    value: String,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(AliasTable::builtin(), 4)
    }
}

impl FieldMapper {
    pub fn new(aliases: AliasTable, min_partial_word_len: usize) -> Self {
        Self {
            aliases,
            min_partial_word_len,
        }
    }

    /// Built-in aliases extended with the configured ones.
    pub fn from_config(config: &MappingConfig) -> Self {
        Self::new(
            AliasTable::builtin().with_overrides(&config.aliases),
            config.min_partial_word_len,
        )
    }

    /// One mapping per distinct placeholder key, in inventory order.
    #[tracing::instrument(
        skip_all,
        fields(placeholders = placeholders.len(), answers = answers.len())
    )]
    pub fn resolve(&self, placeholders: &[Placeholder], answers: &AnswerSet) -> Vec<FieldMapping> {
        let present: Vec<Candidate<'_>> = answers
            .iter()
            .filter_map(|answer| {
                answer.display_value().map(|value| Candidate {
                    key: &answer.key,
                    canonical: to_canonical(&answer.key),
                    value,
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mappings: Vec<FieldMapping> = placeholders
            .iter()
            .filter(|p| seen.insert(p.key.as_str()))
            .map(|p| self.resolve_one(p, &present))
            .collect();

        debug!(
            resolved = mappings.iter().filter(|m| m.value.is_resolved()).count(),
            total = mappings.len(),
            "field mapping complete"
        );
        mappings
    }

    fn resolve_one(&self, placeholder: &Placeholder, present: &[Candidate<'_>]) -> FieldMapping {
        let key = placeholder.key.as_str();
        let lowered = key.to_lowercase();

        let found = present
            .iter()
            .find(|c| c.key.to_lowercase() == lowered)
            .map(|c| (c, MatchStrategy::Exact))
            .or_else(|| {
                present
                    .iter()
                    .find(|c| c.canonical == key)
                    .map(|c| (c, MatchStrategy::Normalized))
            })
            .or_else(|| self.by_alias(placeholder, present).map(|c| (c, MatchStrategy::Alias)))
            .or_else(|| self.by_partial(key, present).map(|c| (c, MatchStrategy::Partial)));

        match found {
            Some((candidate, strategy)) => FieldMapping {
                placeholder_key: placeholder.key.clone(),
                value: FieldValue::Resolved(candidate.value.clone()),
                strategy,
                answer_key: Some(candidate.key.to_string()),
            },
            None => FieldMapping::unresolved(&placeholder.key),
        }
    }

    fn by_alias<'p, 'a>(
        &self,
        placeholder: &Placeholder,
        present: &'p [Candidate<'a>],
    ) -> Option<&'p Candidate<'a>> {
        let mut lookups: Vec<&str> = vec![placeholder.key.as_str()];
        // A quoted instruction reads like prose, so its words are keys too.
        if placeholder.kind == PlaceholderKind::Quoted {
            lookups.extend(words(&placeholder.key));
        }

        lookups
            .into_iter()
            .flat_map(|lookup| self.aliases.candidates(lookup))
            .find_map(|alias| present.iter().find(|c| &c.canonical == alias))
    }

    /// The answer sharing the most whole-word characters with `key`.
    /// Ties go to the first-declared answer.
    fn by_partial<'p, 'a>(
        &self,
        key: &str,
        present: &'p [Candidate<'a>],
    ) -> Option<&'p Candidate<'a>> {
        let wanted: HashSet<&str> = words(key)
            .filter(|w| w.chars().count() >= self.min_partial_word_len)
            .collect();
        if wanted.is_empty() {
            return None;
        }

        let mut best: Option<(&Candidate<'a>, usize)> = None;
        for candidate in present {
            let shared: HashSet<&str> = words(&candidate.canonical)
                .filter(|w| wanted.contains(w))
                .collect();
            let score: usize = shared.iter().map(|w| w.chars().count()).sum();
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best.map(|(candidate, _)| candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill_types::placeholder::Occurrence;
    use serde_json::json;

    fn placeholder(key: &str, kind: PlaceholderKind) -> Placeholder {
        Placeholder {
            key: key.to_string(),
            kind,
            label: None,
            occurrences: vec![Occurrence {
                raw: format!("{{{{{key}}}}}"),
                offset: 0,
            }],
        }
    }

    fn brace(key: &str) -> Placeholder {
        placeholder(key, PlaceholderKind::DoubleBrace)
    }

    fn resolve_single(key: &str, answers: serde_json::Value) -> FieldMapping {
        let answers: AnswerSet = serde_json::from_value(answers).unwrap();
        FieldMapper::default()
            .resolve(&[brace(key)], &answers)
            .remove(0)
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let mapping = resolve_single("client_name", json!({"CLIENT_NAME": "Ann"}));
        assert_eq!(mapping.strategy, MatchStrategy::Exact);
        assert_eq!(mapping.value, FieldValue::Resolved("Ann".into()));
        assert_eq!(mapping.answer_key.as_deref(), Some("CLIENT_NAME"));
    }

    #[test]
    fn normalized_match_handles_camel_case() {
        let mapping = resolve_single("successor_trustees", json!({"successorTrustees": "Bo"}));
        assert_eq!(mapping.strategy, MatchStrategy::Normalized);
        assert_eq!(mapping.value.as_resolved(), Some("Bo"));
    }

    #[test]
    fn empty_exact_answer_falls_through_to_alias() {
        let mapping = resolve_single(
            "grantor_name",
            json!({"grantorName": "", "fullName": "Jane Doe"}),
        );
        assert_eq!(mapping.strategy, MatchStrategy::Alias);
        assert_eq!(mapping.value.as_resolved(), Some("Jane Doe"));
        assert_eq!(mapping.answer_key.as_deref(), Some("fullName"));
    }

    #[test]
    fn alias_takes_first_present_candidate() {
        // grantor_name candidates: grantor, full_name, client_name, ...
        let mapping = resolve_single(
            "grantor_name",
            json!({"clientName": "Second", "full_name": null, "grantor": "  "}),
        );
        assert_eq!(mapping.strategy, MatchStrategy::Alias);
        assert_eq!(mapping.value.as_resolved(), Some("Second"));
    }

    #[test]
    fn quoted_words_consult_aliases() {
        let answers: AnswerSet = serde_json::from_value(json!({"spouse_full_name": "Pat"})).unwrap();
        let quoted = placeholder("name_of_spouse", PlaceholderKind::Quoted);
        let mapping = FieldMapper::default().resolve(&[quoted], &answers).remove(0);
        assert_eq!(mapping.strategy, MatchStrategy::Alias);
        assert_eq!(mapping.value.as_resolved(), Some("Pat"));

        // the same key in brace syntax only gets a partial match
        let mapping = FieldMapper::default()
            .resolve(&[brace("name_of_spouse")], &answers)
            .remove(0);
        assert_eq!(mapping.strategy, MatchStrategy::Partial);
    }

    #[test]
    fn partial_prefers_longest_overlap() {
        let mapping = resolve_single(
            "primary_trustee_address",
            json!({"trustee": "T", "trusteeAddress": "1 Main St", "address": "x"}),
        );
        assert_eq!(mapping.strategy, MatchStrategy::Partial);
        assert_eq!(mapping.value.as_resolved(), Some("1 Main St"));
    }

    #[test]
    fn partial_ties_go_to_first_declared() {
        // json! sorts keys, so parse text to keep declaration order.
        for (text, winner) in [
            (r#"{"secondWitness": "B", "firstWitness": "A"}"#, "secondWitness"),
            (r#"{"firstWitness": "A", "secondWitness": "B"}"#, "firstWitness"),
        ] {
            let answers: AnswerSet = serde_json::from_str(text).unwrap();
            let mapping = FieldMapper::default()
                .resolve(&[brace("witness_signature")], &answers)
                .remove(0);
            assert_eq!(mapping.strategy, MatchStrategy::Partial);
            assert_eq!(mapping.answer_key.as_deref(), Some(winner));
        }
    }

    #[test]
    fn partial_ignores_short_words() {
        let mapping = resolve_single("tax_id", json!({"tax_year": "2024", "id_card": "x"}));
        assert_eq!(mapping.strategy, MatchStrategy::None);
        assert_eq!(mapping.value, FieldValue::Unresolved);
    }

    #[test]
    fn partial_matches_whole_words_only() {
        let mapping = resolve_single("county_seat", json!({"countryName": "US"}));
        assert_eq!(mapping.strategy, MatchStrategy::None);
    }

    #[test]
    fn coerces_non_string_values() {
        let mapping = resolve_single("children", json!({"children": ["Ann", "Bo"]}));
        assert_eq!(mapping.value.as_resolved(), Some("Ann, Bo"));
        let mapping = resolve_single("has_pets", json!({"hasPets": true}));
        assert_eq!(mapping.value.as_resolved(), Some("Yes"));
        let mapping = resolve_single("age", json!({"age": 42}));
        assert_eq!(mapping.value.as_resolved(), Some("42"));
    }

    #[test]
    fn object_answers_are_absent() {
        let mapping = resolve_single("address", json!({"address": {"street": "1 Main"}}));
        assert_eq!(mapping.value, FieldValue::Unresolved);
    }

    #[test]
    fn never_errors_on_empty_answers() {
        let mappings = FieldMapper::default().resolve(
            &[brace("a_field"), brace("another_field")],
            &AnswerSet::new(),
        );
        assert_eq!(mappings.len(), 2);
        assert!(mappings.iter().all(|m| m.strategy == MatchStrategy::None));
    }

    #[test]
    fn one_mapping_per_placeholder_key() {
        let mappings = FieldMapper::default().resolve(
            &[brace("name"), brace("name"), brace("date")],
            &AnswerSet::new(),
        );
        let keys: Vec<&str> = mappings.iter().map(|m| m.placeholder_key.as_str()).collect();
        assert_eq!(keys, vec!["name", "date"]);
    }

    #[test]
    fn configured_aliases_extend_builtin() {
        let mut config = MappingConfig::default();
        config
            .aliases
            .insert("tenant".to_string(), vec!["lessee".to_string()]);
        let answers: AnswerSet = serde_json::from_value(json!({"Lessee": "Kim"})).unwrap();
        let mapping = FieldMapper::from_config(&config)
            .resolve(&[brace("tenant")], &answers)
            .remove(0);
        assert_eq!(mapping.strategy, MatchStrategy::Alias);
        assert_eq!(mapping.value.as_resolved(), Some("Kim"));
    }
}
