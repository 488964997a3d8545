//! Shared domain types for docfill.
//!
//! This crate contains the domain types used across the docfill engine:
//! Template, Placeholder, AnswerSet, FieldMapping, Artifact, generation
//! state, LLM request/response shapes, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod answer;
pub mod artifact;
pub mod config;
pub mod error;
pub mod generation;
pub mod llm;
pub mod mapping;
pub mod placeholder;
pub mod template;
