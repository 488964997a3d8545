//! Document generation: the `Generator` strategies and the hybrid
//! orchestrator that sequences them with fallback.

pub mod assembler;
pub mod deterministic;
pub mod generator;
pub mod orchestrator;

pub use assembler::GenerativeAssembler;
pub use deterministic::DeterministicRewriter;
pub use generator::{GenerationInput, Generator};
pub use orchestrator::HybridOrchestrator;
