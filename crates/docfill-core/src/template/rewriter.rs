//! Deterministic rewriting: literal substitution of every recorded token.
//!
//! Substitution works on the occurrence spans captured at extraction time
//! and walks the original body once, so a substituted value can never be
//! matched by another placeholder's token.

use std::collections::HashMap;

use docfill_types::error::GeneratorError;
use docfill_types::mapping::FieldMapping;

use super::extractor::ParsedTemplate;

/// Replace every occurrence of every placeholder in `template` with its
/// mapped value, or with `sentinel` when the placeholder is unresolved or
/// has no mapping entry.
///
/// Fails only when a recorded occurrence no longer matches the body it
/// claims to index, which means the template and its inventory diverged.
pub fn rewrite(
    template: &ParsedTemplate,
    mappings: &[FieldMapping],
    sentinel: &str,
) -> Result<String, GeneratorError> {
    let values: HashMap<&str, &str> = mappings
        .iter()
        .filter_map(|m| m.value.as_resolved().map(|v| (m.placeholder_key.as_str(), v)))
        .collect();

    let mut spans: Vec<(usize, usize, &str)> = Vec::new();
    for placeholder in &template.placeholders {
        let replacement = values
            .get(placeholder.key.as_str())
            .copied()
            .unwrap_or(sentinel);
        for occurrence in &placeholder.occurrences {
            let matches = template
                .body
                .get(occurrence.offset..occurrence.end())
                .is_some_and(|text| text == occurrence.raw);
            if !matches {
                return Err(GeneratorError::TemplateMismatch {
                    key: placeholder.key.clone(),
                    offset: occurrence.offset,
                });
            }
            spans.push((occurrence.offset, occurrence.end(), replacement));
        }
    }
    spans.sort_by_key(|(start, _, _)| *start);

    let body = &template.body;
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for (start, end, replacement) in spans {
        if start < cursor {
            return Err(GeneratorError::TemplateMismatch {
                key: String::new(),
                offset: start,
            });
        }
        out.push_str(&body[cursor..start]);
        out.push_str(replacement);
        cursor = end;
    }
    out.push_str(&body[cursor..]);

    Ok(out)
}
