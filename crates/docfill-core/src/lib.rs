//! Template field resolution and hybrid document generation for docfill.
//!
//! This crate defines the engine (placeholder extraction, field mapping,
//! deterministic rewriting, AI-assisted assembly, and the orchestrator that
//! sequences them) plus the "ports" (store and provider traits) that the
//! infrastructure layer implements. It depends only on `docfill-types` --
//! never on `docfill-infra` or any database/HTTP crate.

pub mod generation;
pub mod llm;
pub mod mapping;
pub mod repository;
pub mod template;
