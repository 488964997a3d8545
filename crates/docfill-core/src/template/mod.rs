//! Template text processing: name normalization, placeholder extraction,
//! and deterministic rewriting.

pub mod extractor;
pub mod normalize;
pub mod rewriter;

pub use extractor::{ParsedTemplate, extract_placeholders, fold_typography, parse_template};
pub use normalize::{to_canonical, to_display};
pub use rewriter::rewrite;
