//! Observability setup for docfill: structured logging through
//! `tracing-subscriber` and optional OpenTelemetry span export.

pub mod tracing_setup;
