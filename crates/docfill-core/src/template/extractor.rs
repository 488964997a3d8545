//! Placeholder extraction.
//!
//! Scans a template body for the five placeholder syntaxes, resolves
//! overlapping matches by syntax priority, and collapses duplicates by
//! canonical key while keeping every raw occurrence for the rewriter.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use docfill_types::placeholder::{Occurrence, Placeholder, PlaceholderKind};

use super::normalize::to_canonical;

// Extra braces (`{{{name}}}`) belong to the token.
static DOUBLE_BRACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{+\s*([A-Za-z_][A-Za-z0-9_ .\-]*?)\s*\}\}+").expect("Invalid double-brace regex")
});

static SINGLE_BRACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*([A-Za-z_][A-Za-z0-9_ .\-]*?)\s*\}").expect("Invalid single-brace regex")
});

static BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*([A-Za-z_][A-Za-z0-9_ .\-]*?)\s*\]").expect("Invalid bracket regex")
});

static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{3,}").expect("Invalid underscore regex"));

const QUOTED_MIN_CHARS: usize = 3;
const QUOTED_MAX_CHARS: usize = 60;
const BLANK_LABEL_MAX_WORDS: usize = 5;

/// A template body after typographic folding, with its placeholder inventory.
///
/// Occurrence offsets index into `body`, not into the text originally
/// handed to [`parse_template`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTemplate {
    pub body: String,
    pub placeholders: Vec<Placeholder>,
}

impl ParsedTemplate {
    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }
}

/// Fold typographic quotes and dashes to their ASCII equivalents.
pub fn fold_typography(body: &str) -> String {
    body.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

/// Fold the body and inventory its placeholders.
pub fn parse_template(body: &str) -> ParsedTemplate {
    let body = fold_typography(body);
    let placeholders = inventory(&body);
    ParsedTemplate { body, placeholders }
}

/// Ordered, de-duplicated placeholders of a template body.
///
/// A body with no placeholders yields an empty list.
pub fn extract_placeholders(body: &str) -> Vec<Placeholder> {
    parse_template(body).placeholders
}

#[derive(Debug)]
struct Candidate {
    start: usize,
    end: usize,
    kind: PlaceholderKind,
    /// `None` for underscore blanks, which are numbered after overlap resolution.
    key: Option<String>,
    label: Option<String>,
}

impl Candidate {
    fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

fn inventory(body: &str) -> Vec<Placeholder> {
    let mut candidates = Vec::new();
    collect_tokens(body, &DOUBLE_BRACE, PlaceholderKind::DoubleBrace, &mut candidates);
    collect_tokens(body, &SINGLE_BRACE, PlaceholderKind::SingleBrace, &mut candidates);
    collect_tokens(body, &BRACKET, PlaceholderKind::Bracket, &mut candidates);
    collect_quoted(body, &mut candidates);
    collect_blanks(body, &mut candidates);

    candidates.sort_by_key(|c| (c.kind.priority(), c.start));
    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().all(|a| !a.overlaps(&candidate)) {
            accepted.push(candidate);
        }
    }
    accepted.sort_by_key(|c| c.start);

    let mut placeholders: Vec<Placeholder> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    let mut blank_count = 0;

    for candidate in accepted {
        let key = match candidate.key {
            Some(key) => key,
            None => {
                blank_count += 1;
                format!("blank_{blank_count}")
            }
        };
        let occurrence = Occurrence {
            raw: body[candidate.start..candidate.end].to_string(),
            offset: candidate.start,
        };
        match index_by_key.get(&key) {
            Some(&idx) => placeholders[idx].occurrences.push(occurrence),
            None => {
                index_by_key.insert(key.clone(), placeholders.len());
                placeholders.push(Placeholder {
                    key,
                    kind: candidate.kind,
                    label: candidate.label,
                    occurrences: vec![occurrence],
                });
            }
        }
    }

    placeholders
}

fn collect_tokens(body: &str, pattern: &Regex, kind: PlaceholderKind, out: &mut Vec<Candidate>) {
    for caps in pattern.captures_iter(body) {
        let (Some(whole), Some(ident)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let key = to_canonical(ident.as_str());
        if key.is_empty() {
            continue;
        }
        out.push(Candidate {
            start: whole.start(),
            end: whole.end(),
            kind,
            key: Some(key),
            label: None,
        });
    }
}

/// Short double-quoted runs, paired left to right within each line.
fn collect_quoted(body: &str, out: &mut Vec<Candidate>) {
    let mut line_start = 0;
    for line in body.split('\n') {
        let quotes: Vec<usize> = line.match_indices('"').map(|(i, _)| i).collect();
        for pair in quotes.chunks_exact(2) {
            let (open, close) = (pair[0], pair[1]);
            let inner = &line[open + 1..close];
            if !is_quoted_instruction(&line[..open], inner) {
                continue;
            }
            let key = quoted_key(inner);
            if key.is_empty() {
                continue;
            }
            out.push(Candidate {
                start: line_start + open,
                end: line_start + close + 1,
                kind: PlaceholderKind::Quoted,
                key: Some(key),
                label: Some(inner.trim().to_string()),
            });
        }
        line_start += line.len() + 1;
    }
}

fn is_quoted_instruction(before: &str, inner: &str) -> bool {
    let len = inner.chars().count();
    if !(QUOTED_MIN_CHARS..=QUOTED_MAX_CHARS).contains(&len) {
        return false;
    }
    // attribute values: class="x", href="..."
    if before.trim_end().ends_with('=') {
        return false;
    }
    if inner.contains(['<', '>', '{', '}', '[', ']']) {
        return false;
    }
    inner.chars().any(char::is_alphabetic)
}

/// Canonical key of a quoted instruction, ignoring possessive `'s`.
fn quoted_key(inner: &str) -> String {
    let words: Vec<&str> = inner
        .split_whitespace()
        .map(|w| w.strip_suffix("'s").unwrap_or(w))
        .collect();
    to_canonical(&words.join(" "))
}

fn collect_blanks(body: &str, out: &mut Vec<Candidate>) {
    for m in UNDERSCORE_RUN.find_iter(body) {
        out.push(Candidate {
            start: m.start(),
            end: m.end(),
            kind: PlaceholderKind::Underscore,
            key: None,
            label: blank_label(&body[..m.start()]),
        });
    }
}

/// The last few words before a blank on its own line, e.g. `Signature:` -> `Signature`.
fn blank_label(before: &str) -> Option<String> {
    let line = before.rsplit('\n').next().unwrap_or_default();
    let text = line.trim().trim_end_matches(':').trim_end();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let tail = &words[words.len().saturating_sub(BLANK_LABEL_MAX_WORDS)..];
    Some(tail.join(" "))
}
