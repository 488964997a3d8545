//! Store trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (docfill-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod answer;
pub mod artifact;
pub mod template;

pub use answer::AnswerStore;
pub use artifact::ArtifactStore;
pub use template::TemplateStore;
