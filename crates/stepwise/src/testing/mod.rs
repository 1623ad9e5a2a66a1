//! # Testing Utilities
//!
//! Helpers for testing grammar rewrites.
//!
//! ## Property-Based Testing
//!
//! [`random_grammar`] builds seeded recursion-free grammars. Drive the seed
//! from `proptest` to cover many shapes.
//!
//! ## Language Comparison
//!
//! [`language`] enumerates the finite language of a recursion-free grammar,
//! so a rewrite can be checked by comparing languages before and after.
//! [`is_ambiguous`] counts derivations per string and reports whether any
//! string has two.

pub mod generators;
pub mod language;

pub use generators::{GeneratorConfig, random_grammar};
pub use language::{Word, derivation_counts, is_ambiguous, language, render};
