//! Infrastructure layer for docfill.
//!
//! Contains implementations of the store and provider traits defined in
//! `docfill-core`: the SQLite artifact store, filesystem template and
//! answer stores, an in-memory artifact store, configuration loading, and the
//! Anthropic / OpenAI-compatible LLM providers.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod memory;
pub mod sqlite;
