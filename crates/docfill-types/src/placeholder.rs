//! Placeholder types: the fillable slots detected inside a template body.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Syntax a placeholder was written in.
///
/// Variants are declared in match priority order: when two syntaxes claim
/// overlapping text, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    /// `{{identifier}}`
    DoubleBrace,
    /// `{identifier}`
    SingleBrace,
    /// `[identifier]`
    Bracket,
    /// `"Grantor's name"` -- a short quoted instruction.
    Quoted,
    /// `_____` -- a blank line to fill in.
    Underscore,
}

impl PlaceholderKind {
    /// All kinds, highest priority first.
    pub const ALL: [PlaceholderKind; 5] = [
        PlaceholderKind::DoubleBrace,
        PlaceholderKind::SingleBrace,
        PlaceholderKind::Bracket,
        PlaceholderKind::Quoted,
        PlaceholderKind::Underscore,
    ];

    /// Match priority (lower wins an overlap).
    pub fn priority(&self) -> u8 {
        match self {
            PlaceholderKind::DoubleBrace => 0,
            PlaceholderKind::SingleBrace => 1,
            PlaceholderKind::Bracket => 2,
            PlaceholderKind::Quoted => 3,
            PlaceholderKind::Underscore => 4,
        }
    }

    /// How much the extractor trusts this syntax to be a real placeholder.
    ///
    /// Quoted instructions and underscore blanks are heuristic detections;
    /// false positives fall through to the mapper's unresolved path.
    pub fn confidence(&self) -> Confidence {
        match self {
            PlaceholderKind::DoubleBrace
            | PlaceholderKind::SingleBrace
            | PlaceholderKind::Bracket => Confidence::High,
            PlaceholderKind::Quoted | PlaceholderKind::Underscore => Confidence::Low,
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderKind::DoubleBrace => write!(f, "double_brace"),
            PlaceholderKind::SingleBrace => write!(f, "single_brace"),
            PlaceholderKind::Bracket => write!(f, "bracket"),
            PlaceholderKind::Quoted => write!(f, "quoted"),
            PlaceholderKind::Underscore => write!(f, "underscore"),
        }
    }
}

impl FromStr for PlaceholderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "double_brace" => Ok(PlaceholderKind::DoubleBrace),
            "single_brace" => Ok(PlaceholderKind::SingleBrace),
            "bracket" => Ok(PlaceholderKind::Bracket),
            "quoted" => Ok(PlaceholderKind::Quoted),
            "underscore" => Ok(PlaceholderKind::Underscore),
            other => Err(format!("invalid placeholder kind: '{other}'")),
        }
    }
}

/// Extraction confidence tag for a placeholder kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

/// One raw token occurrence of a placeholder inside the (folded) template body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// The exact token text, e.g. `{{ name }}`.
    pub raw: String,
    /// Byte offset of `raw` in the folded body.
    pub offset: usize,
}

impl Occurrence {
    /// Byte offset one past the end of the token.
    pub fn end(&self) -> usize {
        self.offset + self.raw.len()
    }
}

/// A fillable slot detected in one template.
///
/// Placeholders sharing a canonical key collapse into one entry that keeps
/// every raw occurrence, in body order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// Canonical snake_case key used for matching answers.
    pub key: String,
    /// Syntax of the first occurrence.
    pub kind: PlaceholderKind,
    /// Human-readable label, when the syntax carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Every raw token occurrence, ordered by offset. Never empty.
    pub occurrences: Vec<Occurrence>,
}

impl Placeholder {
    /// Raw text of the first occurrence.
    pub fn raw(&self) -> &str {
        self.occurrences
            .first()
            .map(|o| o.raw.as_str())
            .unwrap_or_default()
    }

    /// Distinct raw token texts, in first-seen order.
    pub fn raw_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = Vec::new();
        for occurrence in &self.occurrences {
            if !tokens.contains(&occurrence.raw.as_str()) {
                tokens.push(&occurrence.raw);
            }
        }
        tokens
    }
}
