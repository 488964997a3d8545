//! Generated document (artifact) types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::mapping::MappingSummary;
use crate::template::{RequestId, TemplateId};

/// Unique identifier for a stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Stored status of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Generated,
    Error,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactStatus::Generated => write!(f, "generated"),
            ArtifactStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for ArtifactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generated" => Ok(ArtifactStatus::Generated),
            "error" => Ok(ArtifactStatus::Error),
            other => Err(format!("invalid artifact status: '{other}'")),
        }
    }
}

/// Which strategy produced the filled body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Ai,
    Deterministic,
}

impl fmt::Display for GenerationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMethod::Ai => write!(f, "ai"),
            GenerationMethod::Deterministic => write!(f, "deterministic"),
        }
    }
}

impl FromStr for GenerationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ai" => Ok(GenerationMethod::Ai),
            "deterministic" => Ok(GenerationMethod::Deterministic),
            other => Err(format!("invalid generation method: '{other}'")),
        }
    }
}

/// Metadata written alongside an artifact body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub status: ArtifactStatus,
    /// `None` when generation never reached a strategy (e.g. empty template).
    pub method: Option<GenerationMethod>,
    pub mapping: MappingSummary,
    /// Why the AI attempt was abandoned, when fallback was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_failure: Option<String>,
    /// Terminal error text for `error` artifacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// A persisted output document for one template within one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub template_id: TemplateId,
    pub request_id: RequestId,
    pub body: String,
    pub metadata: ArtifactMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [ArtifactStatus::Generated, ArtifactStatus::Error] {
            let parsed: ArtifactStatus = status.to_string().parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_method_roundtrip() {
        for method in [GenerationMethod::Ai, GenerationMethod::Deterministic] {
            let parsed: GenerationMethod = method.to_string().parse().unwrap();
            assert_eq!(method, parsed);
        }
        assert!("manual".parse::<GenerationMethod>().is_err());
    }

    #[test]
    fn test_metadata_skips_empty_errors() {
        let metadata = ArtifactMetadata {
            status: ArtifactStatus::Generated,
            method: Some(GenerationMethod::Deterministic),
            mapping: MappingSummary::default(),
            ai_failure: None,
            error: None,
            generated_at: Utc::now(),
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["method"], "deterministic");
    }
}
