//! Field mapping types: the per-request resolution of placeholders to answers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy that produced a field mapping, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Exact,
    Normalized,
    Alias,
    Partial,
    None,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Exact => write!(f, "exact"),
            MatchStrategy::Normalized => write!(f, "normalized"),
            MatchStrategy::Alias => write!(f, "alias"),
            MatchStrategy::Partial => write!(f, "partial"),
            MatchStrategy::None => write!(f, "none"),
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(MatchStrategy::Exact),
            "normalized" => Ok(MatchStrategy::Normalized),
            "alias" => Ok(MatchStrategy::Alias),
            "partial" => Ok(MatchStrategy::Partial),
            "none" => Ok(MatchStrategy::None),
            other => Err(format!("invalid match strategy: '{other}'")),
        }
    }
}

/// Resolved value of one placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Resolved(String),
    Unresolved,
}

impl FieldValue {
    pub fn as_resolved(&self) -> Option<&str> {
        match self {
            FieldValue::Resolved(v) => Some(v),
            FieldValue::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldValue::Resolved(_))
    }
}

/// Mapping of one placeholder (by canonical key) to a value.
///
/// Computed per generation request and never persisted except as an audit
/// summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub placeholder_key: String,
    pub value: FieldValue,
    pub strategy: MatchStrategy,
    /// The answer key that supplied the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<String>,
}

impl FieldMapping {
    pub fn unresolved(placeholder_key: impl Into<String>) -> Self {
        Self {
            placeholder_key: placeholder_key.into(),
            value: FieldValue::Unresolved,
            strategy: MatchStrategy::None,
            answer_key: None,
        }
    }
}

/// What the rewriter writes in place of an unresolved placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Replace with nothing.
    Empty,
    /// Replace with a visible marker (e.g. "Not Provided").
    #[default]
    Marker,
}

/// One line of the mapping audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingAuditEntry {
    pub key: String,
    pub strategy: MatchStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<String>,
}

/// Audit summary of a full field mapping, stored with each artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSummary {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub exact: usize,
    pub normalized: usize,
    pub alias: usize,
    pub partial: usize,
    pub entries: Vec<MappingAuditEntry>,
}

impl MappingSummary {
    pub fn from_mappings(mappings: &[FieldMapping]) -> Self {
        let mut summary = MappingSummary {
            total: mappings.len(),
            ..Default::default()
        };
        for mapping in mappings {
            match mapping.strategy {
                MatchStrategy::Exact => summary.exact += 1,
                MatchStrategy::Normalized => summary.normalized += 1,
                MatchStrategy::Alias => summary.alias += 1,
                MatchStrategy::Partial => summary.partial += 1,
                MatchStrategy::None => {}
            }
            if mapping.value.is_resolved() {
                summary.resolved += 1;
            } else {
                summary.unresolved += 1;
            }
            summary.entries.push(MappingAuditEntry {
                key: mapping.placeholder_key.clone(),
                strategy: mapping.strategy,
                answer_key: mapping.answer_key.clone(),
            });
        }
        summary
    }
}
