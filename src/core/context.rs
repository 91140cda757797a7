//! Language detection module
//!
//! Heuristic, purely local classification of source text and file names,
//! plus the debouncer that bounds how often detection runs while typing.

pub mod detection;
pub mod debounce;

pub use detection::{classify, classify_by_extension, classify_with, default_rules, file_extension_for, PatternRule};
pub use debounce::Debouncer;
